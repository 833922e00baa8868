use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ChannelError;
use crate::types;

pub mod config;
mod consts;
mod utils;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
}

/// Why the connection task stopped exchanging messages on the current socket.
enum Disconnect {
    /// The server closed the connection deliberately.
    Clean(Option<String>),
    /// The transport dropped; a reconnect may be attempted.
    Lost(String),
    /// Every `ClientTx` was dropped, nothing left to send.
    SenderDropped,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
        }
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.c_tx.is_some() {
            return Err(ChannelError::AlreadyConnected);
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;

        let (c_tx, c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        // The connection task runs detached; it ends on its own once every
        // sender is dropped or the reconnect budget is spent.
        let config = self.config.clone();
        tokio::spawn(run_connection(ws_stream, c_rx, s_tx, config));

        Ok(())
    }

    pub async fn server_events(&mut self) -> Result<ServerRx, ChannelError> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(ChannelError::NotConnected),
        }
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<(), ChannelError> {
        match self.c_tx {
            Some(ref tx) => tx
                .send(event)
                .await
                .map_err(|_| ChannelError::ConnectionClosed),
            None => Err(ChannelError::NotConnected),
        }
    }

    /// Fire-and-forget delivery of one user utterance; the backend answers
    /// asynchronously through the server-event stream.
    pub async fn send_message(
        &mut self,
        event: types::events::client::SendMessageEvent,
    ) -> Result<(), ChannelError> {
        self.send_client_event(types::ClientEvent::SendMessage(event))
            .await
    }

    /// Best-effort request to stop streaming the current response.
    pub async fn stop_generation(&mut self) -> Result<(), ChannelError> {
        let event = types::events::client::StopGenerationEvent::new();
        self.send_client_event(types::ClientEvent::StopGeneration(event))
            .await
    }
}

async fn run_connection(
    mut ws_stream: WsStream,
    mut c_rx: tokio::sync::mpsc::Receiver<types::ClientEvent>,
    s_tx: ServerTx,
    config: config::Config,
) {
    loop {
        match exchange(ws_stream, &mut c_rx, &s_tx).await {
            Disconnect::SenderDropped => {
                tracing::debug!("client handle dropped, closing connection");
                return;
            }
            Disconnect::Clean(reason) => {
                tracing::info!("connection closed: {:?}", reason);
                let _ = s_tx.send(types::ServerEvent::Close { reason });
                return;
            }
            Disconnect::Lost(reason) => {
                tracing::warn!("connection lost: {}", reason);
                match reconnect(&config).await {
                    Some(stream) => {
                        ws_stream = stream;
                    }
                    None => {
                        let _ = s_tx.send(types::ServerEvent::Close {
                            reason: Some(reason),
                        });
                        return;
                    }
                }
            }
        }
    }
}

/// Pumps messages in both directions until the socket drops or the client
/// goes away. Events that fail to serialize or deserialize are logged and
/// skipped; they never tear the connection down.
async fn exchange(
    ws_stream: WsStream,
    c_rx: &mut tokio::sync::mpsc::Receiver<types::ClientEvent>,
    s_tx: &ServerTx,
) -> Disconnect {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = c_rx.recv() => {
                let Some(event) = outbound else {
                    return Disconnect::SenderDropped;
                };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            // The event is dropped rather than replayed after
                            // reconnect; delivery is best-effort.
                            return Disconnect::Lost(e.to_string());
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<types::ServerEvent>(&text) {
                            Ok(event) => {
                                if s_tx.send(event).is_err() {
                                    tracing::debug!("no subscribers for server event");
                                }
                            }
                            Err(e) => {
                                tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                            }
                        }
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Disconnect::Clean(frame.map(|f| f.reason.to_string()));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Disconnect::Lost(e.to_string());
                    }
                    None => {
                        return Disconnect::Lost("stream ended".to_string());
                    }
                }
            }
        }
    }
}

/// Bounded retry loop. Returns `None` once the configured attempts are
/// exhausted, at which point the connection task emits `Close` and ends.
async fn reconnect(config: &config::Config) -> Option<WsStream> {
    let attempts = config.reconnect_attempts();
    for attempt in 1..=attempts {
        tokio::time::sleep(config.reconnect_delay()).await;
        let request = match utils::build_request(config) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("failed to build reconnect request: {}", e);
                return None;
            }
        };
        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _)) => {
                tracing::info!("reconnected after {} attempt(s)", attempt);
                return Some(stream);
            }
            Err(e) => {
                tracing::warn!("reconnect attempt {}/{} failed: {}", attempt, attempts, e);
            }
        }
    }
    None
}

pub async fn connect_with_config(
    capacity: usize,
    config: config::Config,
) -> Result<Client, ChannelError> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect() -> Result<Client, ChannelError> {
    let config = config::Config::new();
    connect_with_config(consts::DEFAULT_CAPACITY, config).await
}
