#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("already connected")]
    AlreadyConnected,

    #[error("not connected yet")]
    NotConnected,

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection task is gone")]
    ConnectionClosed,
}
