#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history, in the shape the backend expects.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A reference document backing an assistant response.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceRef {
    pub filename: String,
    #[serde(rename = "driveUrl", default, skip_serializing_if = "Option::is_none")]
    pub drive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl SourceRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            drive_url: None,
            thumbnail: None,
        }
    }
}

/// A single message in the active session.
///
/// While an assistant response is streaming, `content` is append-only;
/// once the backend signals completion the message is no longer mutated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl ResponseMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            sources: Vec::new(),
        }
    }

    pub fn append(&mut self, chunk: &str) {
        self.content.push_str(chunk);
    }

    pub fn to_history(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Identifiers and preferences that accompany every user message.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub language: String,
    pub tag: Option<String>,
    pub persona: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            language: language.into(),
            tag: None,
            persona: "kira".to_string(),
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }
}
