pub mod error;
pub mod events;
pub mod filler;
pub mod segmenter;
pub mod session;
pub mod speech;
pub mod tts_text;
pub mod voice;

use std::time::Duration;

use kira_types::{ChatMessage, SessionContext};

pub use speech::SpeechRequest;

/// Represents commands that the core logic (`VoiceSessionCoordinator`) issues
/// to the runtime.
///
/// This enum is the primary API for decoupling the coordinator's
/// decision-making from the runtime's execution of side effects (speaking,
/// sending over the channel, driving the recognizer).
#[derive(Debug, Clone)]
pub enum Command {
    /// Hand one segment of text to the speech synthesizer.
    Speak(SpeechRequest),
    /// Stop in-flight playback and drop anything still queued.
    CancelSpeech,
    /// Deliver a finalized user utterance to the backend.
    SendUserMessage {
        message: String,
        history: Vec<ChatMessage>,
        context: SessionContext,
    },
    /// Ask the backend to stop streaming the current response.
    StopGeneration,
    /// Start the continuous speech-recognition stream.
    StartRecognizer,
    /// Stop the recognition stream.
    StopRecognizer,
    /// Restart the recognizer after a short delay; recognition platforms
    /// time continuous streams out and the session outlives them.
    RestartRecognizer { delay: Duration },
}
