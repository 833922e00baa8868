mod config;
mod console;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kira_channel::types::events::client::SendMessageEvent;
use kira_channel::types::ServerEvent;
use kira_core::error::SessionError;
use kira_core::events::{PlaybackEvent, RecognitionEvent, SessionEvent};
use kira_core::session::{CoordinatorConfig, VoiceSessionCoordinator};
use kira_core::speech::{SpeechRecognizer, SpeechSynthesizer};
use kira_core::Command;
use kira_types::SessionContext;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::config::Config;
use crate::console::{ConsoleRecognizer, ConsoleSynthesizer};

#[derive(Parser, Debug)]
#[command(
    name = "kira",
    about = "Voice session front end for the Kira legal assistant"
)]
struct Cli {
    /// Realtime endpoint of the assistant backend, e.g. ws://localhost:5000/realtime
    #[arg(long)]
    backend_url: Option<String>,

    /// Spoken language tag, e.g. "en" or "hi-IN"
    #[arg(long)]
    language: Option<String>,

    /// Restrict retrieval to one document category
    #[arg(long)]
    tag: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();
    let backend_url = args.backend_url.unwrap_or_else(|| config.backend_url.clone());
    let language = args.language.unwrap_or_else(|| config.language.clone());
    let tag = args.tag.or_else(|| config.tag.clone());

    let session_id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    let context = SessionContext::new(session_id, language).with_tag(tag);

    let channel_config = kira_channel::Config::builder()
        .with_base_url(&backend_url)
        .with_reconnect_attempts(config.reconnect_attempts)
        .with_reconnect_delay(config.reconnect_delay)
        .build();
    let mut channel = kira_channel::connect_with_config(1024, channel_config)
        .await
        .context("Failed to connect to assistant backend")?;
    tracing::info!("connected to {}", backend_url);

    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(256);
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(64);

    // Server events become session events; backend errors are logged but do
    // not end the session.
    let mut server_events = channel
        .server_events()
        .await
        .context("Failed to subscribe to server events")?;
    let server_event_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Ok(event) = server_events.recv().await {
            let mapped = match event {
                ServerEvent::ResponseChunk(e) => {
                    Some(SessionEvent::ResponseChunk(e.text().to_string()))
                }
                ServerEvent::Sources(e) => Some(SessionEvent::Sources(e.into_sources())),
                ServerEvent::ResponseComplete(_) => Some(SessionEvent::ResponseComplete),
                ServerEvent::Error(e) => {
                    tracing::error!("backend error: {}", e.error());
                    None
                }
                ServerEvent::Close { reason } => {
                    tracing::warn!("channel closed: {:?}", reason);
                    Some(SessionEvent::ChannelClosed)
                }
            };
            if let Some(event) = mapped {
                if server_event_tx.send(event).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut synthesizer = ConsoleSynthesizer::new();
    let mut playback_events = synthesizer
        .playback_events()
        .await
        .context("Failed to subscribe to playback events")?;
    let playback_event_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(PlaybackEvent::Finished) = playback_events.recv().await {
            if playback_event_tx
                .send(SessionEvent::PlaybackFinished)
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Command executor: owns the synthesizer and the channel client; the
    // recognizer is shared so a delayed restart can run off this loop.
    let recognizer = Arc::new(Mutex::new(ConsoleRecognizer::new()));
    let recognizer_event_tx = event_tx.clone();
    let command_handle = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            if let Err(e) = execute(
                command,
                &mut channel,
                &recognizer,
                &mut synthesizer,
                &recognizer_event_tx,
            )
            .await
            {
                tracing::error!("failed to execute command: {:?}", e);
            }
        }
    });

    let coordinator_config = CoordinatorConfig {
        interrupt_cooldown: config.interrupt_cooldown,
        ..CoordinatorConfig::default()
    };
    let mut coordinator_handle = tokio::spawn(run_coordinator(
        coordinator_config,
        context,
        event_rx,
        command_tx,
    ));

    tokio::select! {
        _ = &mut coordinator_handle => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            let _ = event_tx.send(SessionEvent::Deactivated).await;
            let _ = (&mut coordinator_handle).await;
        }
    }

    // The coordinator dropped its command sender; wait for the executor to
    // drain the queued shutdown commands before exiting.
    drop(event_tx);
    let _ = command_handle.await;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Runs the session over the event queue until deactivation, channel shutdown
/// or a fatal error, then returns so shutdown can join it.
async fn run_coordinator(
    config: CoordinatorConfig,
    context: SessionContext,
    mut event_rx: mpsc::Receiver<SessionEvent>,
    command_tx: mpsc::Sender<Command>,
) {
    let mut session = VoiceSessionCoordinator::new(config, context);
    if let Err(e) = session
        .handle_event(SessionEvent::Activated, &command_tx)
        .await
    {
        tracing::error!("failed to activate session: {}", e);
        return;
    }
    while let Some(event) = event_rx.recv().await {
        let shutdown = matches!(
            event,
            SessionEvent::Deactivated | SessionEvent::ChannelClosed
        );
        match session.handle_event(event, &command_tx).await {
            Ok(()) => {}
            Err(SessionError::MicrophonePermissionDenied) => {
                tracing::error!("session ended: microphone permission denied");
                return;
            }
            Err(e) => {
                tracing::error!("session error: {}", e);
                return;
            }
        }
        if shutdown {
            return;
        }
    }
}

async fn execute(
    command: Command,
    channel: &mut kira_channel::Client,
    recognizer: &Arc<Mutex<ConsoleRecognizer>>,
    synthesizer: &mut ConsoleSynthesizer,
    event_tx: &mpsc::Sender<SessionEvent>,
) -> Result<()> {
    match command {
        Command::StartRecognizer => start_recognizer(recognizer, event_tx).await?,
        Command::RestartRecognizer { delay } => {
            schedule_recognizer_restart(recognizer, delay, event_tx);
        }
        Command::StopRecognizer => recognizer.lock().await.stop().await?,
        Command::Speak(request) => {
            // The voice inventory can change at runtime, so resolution runs
            // per utterance rather than once at startup.
            let voices = synthesizer.voices().await;
            if let Some(voice) = kira_core::voice::pick_voice(&voices, &request.language) {
                tracing::debug!("voice for {}: {}", request.language, voice.name);
            }
            synthesizer.speak(request).await?;
        }
        Command::CancelSpeech => synthesizer.cancel().await?,
        Command::SendUserMessage {
            message,
            history,
            context,
        } => {
            channel
                .send_message(SendMessageEvent::new(message, history, &context))
                .await?;
        }
        Command::StopGeneration => channel.stop_generation().await?,
    }
    Ok(())
}

/// Runs the restart delay in the background, so commands queued behind it
/// (an interruption's `CancelSpeech` in particular) are not held up.
fn schedule_recognizer_restart(
    recognizer: &Arc<Mutex<ConsoleRecognizer>>,
    delay: Duration,
    event_tx: &mpsc::Sender<SessionEvent>,
) {
    let recognizer = Arc::clone(recognizer);
    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = start_recognizer(&recognizer, &event_tx).await {
            tracing::error!("failed to restart recognizer: {:?}", e);
        }
    });
}

/// Starts (or restarts) the recognition stream and forwards its results into
/// the session event queue.
async fn start_recognizer(
    recognizer: &Arc<Mutex<ConsoleRecognizer>>,
    event_tx: &mpsc::Sender<SessionEvent>,
) -> Result<()> {
    let mut results = recognizer.lock().await.start().await?;
    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = results.recv().await {
            let mapped = match event {
                RecognitionEvent::Interim(text) => SessionEvent::InterimTranscript(text),
                RecognitionEvent::Final(text) => SessionEvent::FinalTranscript(text),
                RecognitionEvent::Ended => SessionEvent::RecognizerEnded,
                RecognitionEvent::Error(error) => SessionEvent::RecognizerError(error),
            };
            if event_tx.send(mapped).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
