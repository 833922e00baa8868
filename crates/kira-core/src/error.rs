#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// Microphone access was denied. Fatal for the current session: the
    /// coordinator drops to idle and a new explicit activation is required.
    #[error("microphone permission denied")]
    MicrophonePermissionDenied,

    /// The runtime dropped its command receiver; nothing can act on the
    /// coordinator's decisions anymore.
    #[error("command channel closed")]
    CommandChannelClosed,
}
