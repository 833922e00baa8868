use crate::message::{ChatMessage, SessionContext};

/// `send_message` event — one finalized user utterance plus the context the
/// backend needs to answer it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SendMessageEvent {
    message: String,
    history: Vec<ChatMessage>,
    language: String,
    session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    persona: String,
}

impl SendMessageEvent {
    pub fn new(
        message: impl Into<String>,
        history: Vec<ChatMessage>,
        context: &SessionContext,
    ) -> Self {
        Self {
            message: message.into(),
            history,
            language: context.language.clone(),
            session_id: context.session_id.clone(),
            tag: context.tag.clone(),
            persona: context.persona.clone(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// `stop_generation` event — best-effort request to stop streaming the
/// current response.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StopGenerationEvent {}

impl StopGenerationEvent {
    pub fn new() -> Self {
        Self {}
    }
}
