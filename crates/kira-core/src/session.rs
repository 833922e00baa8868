//! The voice-session coordinator.
//!
//! Owns all session state and drives it from discrete events: recognition
//! results, channel messages, playback completions and user activation. Side
//! effects leave through the command channel; collaborators never mutate
//! state here directly.

use std::time::{Duration, Instant};

use kira_types::{ChatMessage, ResponseMessage, SessionContext, SourceRef};
use tokio::sync::mpsc::Sender;

use crate::error::SessionError;
use crate::events::{RecognizerError, SessionEvent};
use crate::filler;
use crate::segmenter::SegmentBuffer;
use crate::speech::SpeechRequest;
use crate::tts_text;
use crate::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Listening,
    Processing,
    Speaking,
}

/// UX tuning knobs. The defaults match the shipped experience; none of them
/// are correctness-critical.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long interruption suppresses speech output and re-triggering.
    pub interrupt_cooldown: Duration,
    /// Interim results longer than this interrupt the assistant mid-reply.
    pub min_interim_interrupt_chars: usize,
    /// Pause before restarting a recognizer that timed out on its own.
    pub recognizer_restart_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            interrupt_cooldown: Duration::from_millis(200),
            min_interim_interrupt_chars: 3,
            recognizer_restart_delay: Duration::from_millis(300),
        }
    }
}

pub struct VoiceSessionCoordinator {
    status: SessionStatus,
    config: CoordinatorConfig,
    context: SessionContext,
    /// Full conversation, oldest first. The last entry is the streaming
    /// assistant response while one is open.
    messages: Vec<ResponseMessage>,
    /// Most recent interim or final recognition text; cleared on hand-off.
    transcript: String,
    segments: SegmentBuffer,
    /// Set at the instant of an interruption; speech output stays blocked
    /// until `interrupt_cooldown` has elapsed.
    interrupted_at: Option<Instant>,
    /// Utterances queued at the synthesizer without a completion event yet.
    pending_playbacks: usize,
    /// A user message is in flight and its response has not completed.
    awaiting_response: bool,
    /// The streaming assistant message exists in `messages`.
    response_open: bool,
    /// Sources that arrived before the response's first chunk.
    pending_sources: Option<Vec<SourceRef>>,
}

impl VoiceSessionCoordinator {
    pub fn new(config: CoordinatorConfig, context: SessionContext) -> Self {
        Self {
            status: SessionStatus::Idle,
            config,
            context,
            messages: Vec::new(),
            transcript: String::new(),
            segments: SegmentBuffer::new(),
            interrupted_at: None,
            pending_playbacks: 0,
            awaiting_response: false,
            response_open: false,
            pending_sources: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn messages(&self) -> &[ResponseMessage] {
        &self.messages
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub async fn handle_event(
        &mut self,
        event: SessionEvent,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        match event {
            SessionEvent::Activated => self.activate(command_tx).await,
            SessionEvent::Deactivated => self.deactivate(command_tx).await,
            SessionEvent::InterimTranscript(text) => self.on_interim(text, command_tx).await,
            SessionEvent::FinalTranscript(text) => self.on_final(text, command_tx).await,
            SessionEvent::RecognizerEnded => self.on_recognizer_ended(command_tx).await,
            SessionEvent::RecognizerError(error) => {
                self.on_recognizer_error(error, command_tx).await
            }
            SessionEvent::ResponseChunk(text) => self.on_chunk(text, command_tx).await,
            SessionEvent::Sources(sources) => {
                self.on_sources(sources);
                Ok(())
            }
            SessionEvent::ResponseComplete => self.on_complete(command_tx).await,
            SessionEvent::PlaybackFinished => {
                self.on_playback_finished();
                Ok(())
            }
            SessionEvent::ChannelClosed => self.deactivate(command_tx).await,
        }
    }

    async fn activate(&mut self, command_tx: &Sender<Command>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Idle {
            return Ok(());
        }
        self.status = SessionStatus::Listening;
        tracing::info!("session activated");
        self.issue(command_tx, Command::StartRecognizer).await
    }

    async fn deactivate(&mut self, command_tx: &Sender<Command>) -> Result<(), SessionError> {
        if self.status == SessionStatus::Idle {
            return Ok(());
        }
        let was_awaiting = self.awaiting_response;
        self.status = SessionStatus::Idle;
        self.transcript.clear();
        self.segments.clear();
        self.pending_playbacks = 0;
        self.awaiting_response = false;
        self.response_open = false;
        self.pending_sources = None;
        self.interrupted_at = None;

        tracing::info!("session deactivated");
        self.issue(command_tx, Command::StopRecognizer).await?;
        self.issue(command_tx, Command::CancelSpeech).await?;
        if was_awaiting {
            self.issue(command_tx, Command::StopGeneration).await?;
        }
        Ok(())
    }

    async fn on_interim(
        &mut self,
        text: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Idle => Ok(()),
            SessionStatus::Listening => {
                self.transcript = text;
                Ok(())
            }
            SessionStatus::Processing | SessionStatus::Speaking => {
                let long_enough =
                    text.trim().chars().count() > self.config.min_interim_interrupt_chars;
                self.transcript = text;
                if long_enough {
                    self.interrupt(command_tx).await?;
                }
                Ok(())
            }
        }
    }

    async fn on_final(
        &mut self,
        text: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        let utterance = text.trim().to_string();
        match self.status {
            SessionStatus::Idle => Ok(()),
            SessionStatus::Listening => self.submit_utterance(utterance, command_tx).await,
            SessionStatus::Processing | SessionStatus::Speaking => {
                // A finalized utterance mid-reply both interrupts and becomes
                // the next query.
                self.interrupt(command_tx).await?;
                self.submit_utterance(utterance, command_tx).await
            }
        }
    }

    async fn submit_utterance(
        &mut self,
        utterance: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        if utterance.is_empty() {
            return Ok(());
        }

        let history: Vec<ChatMessage> = self.messages.iter().map(|m| m.to_history()).collect();
        self.messages.push(ResponseMessage::user(utterance.clone()));
        self.transcript.clear();
        self.status = SessionStatus::Processing;
        self.awaiting_response = true;

        tracing::info!("user said: {:?}", utterance);
        self.issue(
            command_tx,
            Command::SendUserMessage {
                message: utterance.clone(),
                history,
                context: self.context.clone(),
            },
        )
        .await?;

        // Acknowledge right away to mask retrieval latency.
        if let Some(phrase) = filler::pick(&self.context.language, &utterance) {
            self.pending_playbacks += 1;
            self.issue(
                command_tx,
                Command::Speak(SpeechRequest::new(phrase, &self.context.language)),
            )
            .await?;
        }
        Ok(())
    }

    async fn on_chunk(
        &mut self,
        text: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        if self.interruption_active() {
            // The protocol carries no response id, so a chunk arriving inside
            // the cooldown cannot be told apart from a straggler of the
            // response that was just abandoned, even when a new query has
            // already been resubmitted. The window errs on discarding.
            tracing::debug!("discarding late chunk during interruption cooldown");
            return Ok(());
        }
        if !self.awaiting_response {
            // Response was abandoned (deactivation or interruption).
            return Ok(());
        }

        if !self.response_open {
            let mut message = ResponseMessage::assistant();
            if let Some(sources) = self.pending_sources.take() {
                message.sources = sources;
            }
            self.messages.push(message);
            self.response_open = true;
            self.status = SessionStatus::Speaking;
        }

        if let Some(message) = self.messages.last_mut() {
            message.append(&text);
        }
        for segment in self.segments.push(&text) {
            self.speak_segment(segment, command_tx).await?;
        }
        Ok(())
    }

    fn on_sources(&mut self, sources: Vec<SourceRef>) {
        if !self.awaiting_response || self.interruption_active() {
            return;
        }
        if self.response_open {
            if let Some(message) = self.messages.last_mut() {
                message.sources = sources;
            }
        } else {
            // Chunks have not arrived yet; attach once the response opens.
            self.pending_sources = Some(sources);
        }
    }

    async fn on_complete(&mut self, command_tx: &Sender<Command>) -> Result<(), SessionError> {
        if !self.awaiting_response {
            return Ok(());
        }
        if let Some(rest) = self.segments.flush() {
            self.speak_segment(rest, command_tx).await?;
        }
        self.awaiting_response = false;
        self.response_open = false;
        self.pending_sources = None;
        if self.pending_playbacks == 0 {
            self.status = SessionStatus::Listening;
        }
        Ok(())
    }

    fn on_playback_finished(&mut self) {
        self.pending_playbacks = self.pending_playbacks.saturating_sub(1);
        let drained = self.pending_playbacks == 0 && !self.awaiting_response;
        if drained
            && matches!(
                self.status,
                SessionStatus::Speaking | SessionStatus::Processing
            )
        {
            self.status = SessionStatus::Listening;
        }
    }

    async fn on_recognizer_ended(
        &mut self,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        if self.status == SessionStatus::Idle {
            return Ok(());
        }
        // Platform recognizers time out; the session outlives them.
        self.issue(
            command_tx,
            Command::RestartRecognizer {
                delay: self.config.recognizer_restart_delay,
            },
        )
        .await
    }

    async fn on_recognizer_error(
        &mut self,
        error: RecognizerError,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        match error {
            RecognizerError::PermissionDenied => {
                tracing::error!("microphone permission denied, ending session");
                self.deactivate(command_tx).await?;
                Err(SessionError::MicrophonePermissionDenied)
            }
            RecognizerError::Aborted => Ok(()),
            RecognizerError::Other(message) => {
                tracing::warn!("recognizer error: {}", message);
                Ok(())
            }
        }
    }

    /// Cancels playback, discards the unspoken tail and signals the backend
    /// to stop, exactly once per interruption. Re-entry during the cooldown
    /// is a no-op.
    async fn interrupt(&mut self, command_tx: &Sender<Command>) -> Result<(), SessionError> {
        if self.interruption_active() {
            return Ok(());
        }
        self.interrupted_at = Some(Instant::now());
        self.segments.clear();
        self.pending_playbacks = 0;
        self.awaiting_response = false;
        self.response_open = false;
        self.pending_sources = None;
        self.status = SessionStatus::Listening;

        tracing::info!("assistant interrupted by user speech");
        self.issue(command_tx, Command::CancelSpeech).await?;
        self.issue(command_tx, Command::StopGeneration).await
    }

    fn interruption_active(&self) -> bool {
        self.interrupted_at
            .map(|at| at.elapsed() < self.config.interrupt_cooldown)
            .unwrap_or(false)
    }

    async fn speak_segment(
        &mut self,
        segment: String,
        command_tx: &Sender<Command>,
    ) -> Result<(), SessionError> {
        let spoken = tts_text::clean_for_tts(&segment);
        if spoken.is_empty() {
            return Ok(());
        }
        self.pending_playbacks += 1;
        self.issue(
            command_tx,
            Command::Speak(SpeechRequest::new(spoken, &self.context.language)),
        )
        .await
    }

    async fn issue(
        &self,
        command_tx: &Sender<Command>,
        command: Command,
    ) -> Result<(), SessionError> {
        command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::CommandChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecognitionEvent;
    use crate::speech::{MockSpeechRecognizer, SpeechRecognizer};
    use kira_types::Role;
    use tokio::sync::mpsc;

    fn coordinator() -> VoiceSessionCoordinator {
        VoiceSessionCoordinator::new(
            CoordinatorConfig::default(),
            SessionContext::new("test-session", "en"),
        )
    }

    fn drain(rx: &mut mpsc::Receiver<Command>) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    async fn activated() -> (VoiceSessionCoordinator, mpsc::Sender<Command>, mpsc::Receiver<Command>) {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = coordinator();
        session
            .handle_event(SessionEvent::Activated, &tx)
            .await
            .unwrap();
        drain(&mut rx);
        (session, tx, rx)
    }

    async fn speaking() -> (VoiceSessionCoordinator, mpsc::Sender<Command>, mpsc::Receiver<Command>) {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("What is the penalty for theft?".into()),
                &tx,
            )
            .await
            .unwrap();
        session
            .handle_event(
                SessionEvent::ResponseChunk("The penalty is imprisonment, ".into()),
                &tx,
            )
            .await
            .unwrap();
        drain(&mut rx);
        (session, tx, rx)
    }

    #[tokio::test]
    async fn activation_starts_the_recognizer() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = coordinator();
        session
            .handle_event(SessionEvent::Activated, &tx)
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Listening);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::StartRecognizer
        ));
    }

    #[tokio::test]
    async fn final_utterance_is_sent_with_a_filler_acknowledgment() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("  What is the penalty for theft? ".into()),
                &tx,
            )
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Processing);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].content, "What is the penalty for theft?");
        assert!(session.transcript().is_empty());

        let commands = drain(&mut rx);
        match &commands[0] {
            Command::SendUserMessage {
                message, history, ..
            } => {
                assert_eq!(message, "What is the penalty for theft?");
                assert!(history.is_empty());
            }
            other => panic!("expected SendUserMessage, got {:?}", other),
        }
        match &commands[1] {
            Command::Speak(request) => {
                assert!(crate::filler::ENGLISH_FILLERS.contains(&request.text.as_str()));
            }
            other => panic!("expected filler Speak, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn chit_chat_skips_the_filler() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(SessionEvent::FinalTranscript("hello".into()), &tx)
            .await
            .unwrap();

        let commands = drain(&mut rx);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::SendUserMessage { .. }));
    }

    #[tokio::test]
    async fn empty_final_results_are_ignored() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(SessionEvent::FinalTranscript("   ".into()), &tx)
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Listening);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn streamed_chunks_are_spoken_in_segments() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("What is the penalty for theft?".into()),
                &tx,
            )
            .await
            .unwrap();
        drain(&mut rx);

        session
            .handle_event(SessionEvent::ResponseChunk("The penalty ".into()), &tx)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Speaking);
        assert!(drain(&mut rx).is_empty());

        session
            .handle_event(
                SessionEvent::ResponseChunk("is imprisonment, ".into()),
                &tx,
            )
            .await
            .unwrap();
        let commands = drain(&mut rx);
        match &commands[0] {
            Command::Speak(request) => {
                assert_eq!(request.text, "The penalty is imprisonment,");
            }
            other => panic!("expected Speak, got {:?}", other),
        }

        session
            .handle_event(SessionEvent::ResponseChunk("up to ten years.".into()), &tx)
            .await
            .unwrap();
        session
            .handle_event(SessionEvent::ResponseComplete, &tx)
            .await
            .unwrap();
        let commands = drain(&mut rx);
        match &commands[0] {
            Command::Speak(request) => assert_eq!(request.text, "up to ten years."),
            other => panic!("expected Speak, got {:?}", other),
        }

        let assistant = session.messages().last().unwrap();
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(
            assistant.content,
            "The penalty is imprisonment, up to ten years."
        );

        // Filler plus two segments are still playing.
        assert_eq!(session.status(), SessionStatus::Speaking);
        for _ in 0..3 {
            session
                .handle_event(SessionEvent::PlaybackFinished, &tx)
                .await
                .unwrap();
        }
        assert_eq!(session.status(), SessionStatus::Listening);
    }

    #[tokio::test]
    async fn interim_speech_interrupts_the_assistant() {
        let (mut session, tx, mut rx) = speaking().await;

        session
            .handle_event(SessionEvent::InterimTranscript("stop".into()), &tx)
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Listening);
        let commands = drain(&mut rx);
        assert!(matches!(commands[0], Command::CancelSpeech));
        assert!(matches!(commands[1], Command::StopGeneration));

        // A late chunk from the abandoned response is discarded.
        let before = session.messages().last().unwrap().content.clone();
        session
            .handle_event(SessionEvent::ResponseChunk("up to ten years.".into()), &tx)
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(session.messages().last().unwrap().content, before);
    }

    #[tokio::test]
    async fn interruption_sends_exactly_one_stop_signal() {
        let (mut session, tx, mut rx) = speaking().await;

        session
            .handle_event(SessionEvent::InterimTranscript("wait".into()), &tx)
            .await
            .unwrap();
        session
            .handle_event(SessionEvent::InterimTranscript("wait a moment".into()), &tx)
            .await
            .unwrap();

        let stops = drain(&mut rx)
            .iter()
            .filter(|c| matches!(c, Command::StopGeneration))
            .count();
        assert_eq!(stops, 1);
    }

    #[tokio::test]
    async fn short_interim_results_do_not_interrupt() {
        let (mut session, tx, mut rx) = speaking().await;

        session
            .handle_event(SessionEvent::InterimTranscript("hm".into()), &tx)
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Speaking);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn final_mid_reply_interrupts_and_becomes_the_next_query() {
        let (mut session, tx, mut rx) = speaking().await;

        session
            .handle_event(
                SessionEvent::FinalTranscript("what about minors?".into()),
                &tx,
            )
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Processing);
        let commands = drain(&mut rx);
        assert!(matches!(commands[0], Command::CancelSpeech));
        assert!(matches!(commands[1], Command::StopGeneration));
        match &commands[2] {
            Command::SendUserMessage { message, history, .. } => {
                assert_eq!(message, "what about minors?");
                // History carries the interrupted exchange.
                assert_eq!(history.len(), 2);
            }
            other => panic!("expected SendUserMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn deactivation_mid_response_goes_idle_and_ignores_late_chunks() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("What is the penalty for theft?".into()),
                &tx,
            )
            .await
            .unwrap();
        drain(&mut rx);
        assert_eq!(session.status(), SessionStatus::Processing);

        session
            .handle_event(SessionEvent::Deactivated, &tx)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        let commands = drain(&mut rx);
        assert!(commands.iter().any(|c| matches!(c, Command::StopRecognizer)));
        assert!(commands.iter().any(|c| matches!(c, Command::CancelSpeech)));
        assert!(commands.iter().any(|c| matches!(c, Command::StopGeneration)));

        let message_count = session.messages().len();
        session
            .handle_event(SessionEvent::ResponseChunk("The penalty ".into()), &tx)
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(session.messages().len(), message_count);
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn sources_attach_to_the_streaming_response() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("What is the penalty for theft?".into()),
                &tx,
            )
            .await
            .unwrap();

        // Sources arrive before the first chunk, as the backend emits them.
        session
            .handle_event(
                SessionEvent::Sources(vec![SourceRef::new("bns.pdf")]),
                &tx,
            )
            .await
            .unwrap();
        session
            .handle_event(SessionEvent::ResponseChunk("The penalty ".into()), &tx)
            .await
            .unwrap();
        drain(&mut rx);

        let assistant = session.messages().last().unwrap();
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.sources, vec![SourceRef::new("bns.pdf")]);
    }

    #[tokio::test]
    async fn recognizer_timeout_restarts_while_active() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(SessionEvent::RecognizerEnded, &tx)
            .await
            .unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::RestartRecognizer { .. }
        ));

        session
            .handle_event(SessionEvent::Deactivated, &tx)
            .await
            .unwrap();
        drain(&mut rx);
        session
            .handle_event(SessionEvent::RecognizerEnded, &tx)
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn permission_denied_is_fatal() {
        let (mut session, tx, mut rx) = activated().await;
        let result = session
            .handle_event(
                SessionEvent::RecognizerError(RecognizerError::PermissionDenied),
                &tx,
            )
            .await;

        assert_eq!(result, Err(SessionError::MicrophonePermissionDenied));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(drain(&mut rx)
            .iter()
            .any(|c| matches!(c, Command::StopRecognizer)));
    }

    #[tokio::test]
    async fn chunks_without_a_pending_query_are_ignored() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(SessionEvent::ResponseChunk("stray".into()), &tx)
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Listening);
        assert!(session.messages().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn session_runs_against_a_mocked_recognition_engine() {
        // Set up the mock: one start that yields a single final utterance,
        // one stop at deactivation.
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer
            .expect_start()
            .returning(|| {
                Box::pin(async move {
                    let (results_tx, results_rx) = mpsc::channel(4);
                    results_tx
                        .send(RecognitionEvent::Final(
                            "What is the penalty for theft?".into(),
                        ))
                        .await
                        .unwrap();
                    Ok(results_rx)
                })
            })
            .once();
        recognizer
            .expect_stop()
            .returning(|| Box::pin(async move { Ok(()) }))
            .once();

        let (tx, mut rx) = mpsc::channel(64);
        let mut session = coordinator();
        session
            .handle_event(SessionEvent::Activated, &tx)
            .await
            .unwrap();
        assert!(matches!(rx.try_recv().unwrap(), Command::StartRecognizer));

        // The runtime services the command against the engine and feeds the
        // results back in.
        let mut results = recognizer.start().await.unwrap();
        while let Some(event) = results.recv().await {
            let mapped = match event {
                RecognitionEvent::Interim(text) => SessionEvent::InterimTranscript(text),
                RecognitionEvent::Final(text) => SessionEvent::FinalTranscript(text),
                RecognitionEvent::Ended => SessionEvent::RecognizerEnded,
                RecognitionEvent::Error(error) => SessionEvent::RecognizerError(error),
            };
            session.handle_event(mapped, &tx).await.unwrap();
        }

        assert_eq!(session.status(), SessionStatus::Processing);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::SendUserMessage { .. }
        ));

        session
            .handle_event(SessionEvent::Deactivated, &tx)
            .await
            .unwrap();
        recognizer.stop().await.unwrap();
    }

    #[tokio::test]
    async fn chunks_inside_the_cooldown_after_resubmission_are_dropped() {
        let (mut session, tx, mut rx) = speaking().await;

        // A final transcript mid-reply interrupts and resubmits immediately.
        session
            .handle_event(
                SessionEvent::FinalTranscript("what about minors?".into()),
                &tx,
            )
            .await
            .unwrap();
        drain(&mut rx);
        assert_eq!(session.status(), SessionStatus::Processing);

        // A chunk this soon after the interruption is indistinguishable from
        // a straggler of the abandoned response, so it is discarded rather
        // than attributed to the new query.
        session
            .handle_event(SessionEvent::ResponseChunk("Minors are tried ".into()), &tx)
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(session.messages().last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn empty_response_returns_to_listening_after_filler() {
        let (mut session, tx, mut rx) = activated().await;
        session
            .handle_event(
                SessionEvent::FinalTranscript("What is the penalty for theft?".into()),
                &tx,
            )
            .await
            .unwrap();
        drain(&mut rx);

        session
            .handle_event(SessionEvent::ResponseComplete, &tx)
            .await
            .unwrap();
        // The filler is still playing; listening resumes once it drains.
        assert_eq!(session.status(), SessionStatus::Processing);
        session
            .handle_event(SessionEvent::PlaybackFinished, &tx)
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Listening);
    }
}
