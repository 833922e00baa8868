use kira_types::SourceRef;

/// Everything the coordinator reacts to. All state transitions happen on
/// these discrete events; collaborators never mutate coordinator state
/// directly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Explicit user activation.
    Activated,
    /// Explicit user deactivation.
    Deactivated,
    /// An interim (not yet final) recognition result.
    InterimTranscript(String),
    /// A finalized utterance from the recognition stream.
    FinalTranscript(String),
    /// The recognition stream terminated on its own.
    RecognizerEnded,
    RecognizerError(RecognizerError),
    /// An incremental fragment of the backend's streamed response.
    ResponseChunk(String),
    /// Reference documents for the in-progress response.
    Sources(Vec<SourceRef>),
    /// Terminal event for one logical response.
    ResponseComplete,
    /// The synthesizer finished playing one queued utterance.
    PlaybackFinished,
    /// The realtime channel shut down for good (reconnects exhausted).
    ChannelClosed,
}

/// Events emitted by a `SpeechRecognizer` implementation.
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    Interim(String),
    Final(String),
    Ended,
    Error(RecognizerError),
}

/// Events emitted by a `SpeechSynthesizer` implementation.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// One queued utterance finished playing.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("microphone permission denied")]
    PermissionDenied,
    /// The platform aborted the stream; recovered silently by restart.
    #[error("recognition aborted")]
    Aborted,
    #[error("recognition error: {0}")]
    Other(String),
}
