//! Collaborator traits for the platform speech facilities.
//!
//! The coordinator never talks to a speech engine directly; the runtime owns
//! concrete implementations and relays their events. Any engine offering
//! continuous interim+final recognition and cancellable utterance playback
//! fits behind these traits.

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::events::{PlaybackEvent, RecognitionEvent};
use crate::voice::VoiceInfo;

/// One playback unit handed to the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// Target output language; the runtime resolves it to a concrete voice
    /// per utterance via `voice::pick_voice`.
    pub language: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// A continuous speech-to-text stream.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechRecognizer: Send {
    /// Starts recognition; results arrive on the returned channel until the
    /// stream ends or `stop` is called.
    async fn start(&mut self) -> Result<tokio::sync::mpsc::Receiver<RecognitionEvent>>;

    async fn stop(&mut self) -> Result<()>;
}

/// A cancellable, utterance-based text-to-speech engine.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechSynthesizer: Send {
    /// Voices currently offered by the platform. The inventory can change
    /// after startup, so callers re-query per utterance.
    async fn voices(&self) -> Vec<VoiceInfo>;

    /// Queues one utterance for playback.
    async fn speak(&mut self, request: SpeechRequest) -> Result<()>;

    /// Stops in-flight playback and drops anything still queued. Cancelled
    /// utterances emit no completion event.
    async fn cancel(&mut self) -> Result<()>;

    /// Playback lifecycle events: one `Finished` per completed utterance.
    async fn playback_events(&mut self) -> Result<tokio::sync::mpsc::Receiver<PlaybackEvent>>;
}
