use crate::message::SourceRef;

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    error: String,
}

impl ErrorEvent {
    pub fn error(&self) -> &str {
        &self.error
    }
}

/// `response_chunk` event — an incremental fragment of the streamed answer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseChunkEvent {
    text: String,
}

impl ResponseChunkEvent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `sources` event — reference documents for the in-progress response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourcesEvent {
    sources: Vec<SourceRef>,
}

impl SourcesEvent {
    pub fn new(sources: Vec<SourceRef>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<SourceRef> {
        self.sources
    }
}

/// `response_complete` event — terminal for one logical response.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ResponseCompleteEvent {}
