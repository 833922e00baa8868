//! Text-mode speech stack for development.
//!
//! Stdin lines stand in for finalized recognition results and spoken
//! segments are written to the log, so the whole session loop can be
//! exercised against a live backend without audio hardware.

use anyhow::{Context, Result};
use async_trait::async_trait;
use kira_core::events::{PlaybackEvent, RecognitionEvent, RecognizerError};
use kira_core::speech::{SpeechRecognizer, SpeechRequest, SpeechSynthesizer};
use kira_core::voice::VoiceInfo;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

/// Reads stdin line by line; every line becomes one final recognition result.
pub struct ConsoleRecognizer {
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ConsoleRecognizer {
    pub fn new() -> Self {
        Self { stop_tx: None }
    }
}

impl Default for ConsoleRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if event_tx.send(RecognitionEvent::Final(line)).await.is_err() {
                                break;
                            }
                        }
                        // Stdin EOF: go quiet instead of signalling `Ended`,
                        // which would put the restart loop into a spin on a
                        // stream that can never produce input again.
                        Ok(None) => break,
                        Err(e) => {
                            let _ = event_tx
                                .send(RecognitionEvent::Error(RecognizerError::Other(
                                    e.to_string(),
                                )))
                                .await;
                            break;
                        }
                    }
                }
            }
        });

        Ok(event_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        Ok(())
    }
}

/// Logs each utterance and reports playback as finished immediately.
pub struct ConsoleSynthesizer {
    playback_tx: mpsc::Sender<PlaybackEvent>,
    playback_rx: Option<mpsc::Receiver<PlaybackEvent>>,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        let (playback_tx, playback_rx) = mpsc::channel(64);
        Self {
            playback_tx,
            playback_rx: Some(playback_rx),
        }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn voices(&self) -> Vec<VoiceInfo> {
        vec![VoiceInfo {
            name: "console".to_string(),
            lang: "en-US".to_string(),
            default: true,
        }]
    }

    async fn speak(&mut self, request: SpeechRequest) -> Result<()> {
        tracing::info!("[{}] {}", request.language, request.text);
        self.playback_tx
            .send(PlaybackEvent::Finished)
            .await
            .context("playback event receiver dropped")?;
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    async fn playback_events(&mut self) -> Result<mpsc::Receiver<PlaybackEvent>> {
        self.playback_rx
            .take()
            .context("playback events already taken")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn speak_reports_immediate_completion() {
        let mut synthesizer = ConsoleSynthesizer::new();
        let mut playback_rx = synthesizer.playback_events().await.unwrap();

        synthesizer
            .speak(SpeechRequest::new("Section 302 applies.", "en"))
            .await
            .unwrap();

        assert!(matches!(
            playback_rx.recv().await,
            Some(PlaybackEvent::Finished)
        ));
    }

    #[tokio::test]
    async fn playback_events_can_only_be_taken_once() {
        let mut synthesizer = ConsoleSynthesizer::new();
        assert!(synthesizer.playback_events().await.is_ok());
        assert!(synthesizer.playback_events().await.is_err());
    }

    #[tokio::test]
    async fn stop_before_start_is_a_no_op() {
        let mut recognizer = ConsoleRecognizer::new();
        assert!(recognizer.stop().await.is_ok());
    }
}
