use crate::{
    Command,
    capture::{CaptureDevice, Recording},
    card::{Attempt, Card},
    card_source::{CardSource, CardSourceResult},
    error::GameError,
    speech::{SpeechApi, SynthesisResult, TranscriptionResult},
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Timing and sizing knobs for a session. All durations may be zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub max_cards_per_round: usize,
    /// Pause between showing a card and speaking its word.
    pub prompt_delay: Duration,
    /// Pause between showing a result and moving on.
    pub advance_delay: Duration,
    /// Pause after a microphone failure before moving on.
    pub capture_failure_delay: Duration,
    /// Recording stops by itself after this long.
    pub max_recording: Duration,
    /// Upper bound on each synthesis or transcription call.
    pub request_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_cards_per_round: 10,
            prompt_delay: Duration::from_millis(500),
            advance_delay: Duration::from_millis(2000),
            capture_failure_delay: Duration::from_millis(3000),
            max_recording: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    PreparingCards,
    /// Card preparation failed; the player can retry with `StartRound`.
    NoCardsAvailable,
    DisplayingCard,
    Listening,
    Scoring,
    RoundComplete,
    ReviewingMistakes,
}

/// Identifies one round of one session. Increases every time a round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RoundId(pub u64);

/// The session's authoritative state.
///
/// `score + mistakes.len() <= cursor <= cards.len()` holds after every event.
#[derive(Debug, Clone, Serialize)]
pub struct RoundState {
    pub cards: Vec<Card>,
    pub cursor: usize,
    pub score: usize,
    pub mistakes: Vec<Attempt>,
    pub phase: Phase,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            cursor: 0,
            score: 0,
            mistakes: Vec::new(),
            phase: Phase::Idle,
        }
    }
}

impl RoundState {
    /// The card at the cursor, if any remain.
    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.cursor)
    }
}

/// Commands the player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    StartRound,
    StartNewRound,
    ToggleListening,
    ShowMistakes,
}

/// Everything the session reacts to.
///
/// Apart from `Ui`, every event is the completion of work the session
/// started itself and carries the round it was started in. Events from any
/// other round are dropped.
#[derive(Debug)]
pub enum Event {
    Ui(UiCommand),
    CardsPrepared {
        round: RoundId,
        result: CardSourceResult,
    },
    PromptDue {
        round: RoundId,
        cursor: usize,
    },
    /// Carries the phase and cursor the speech was requested in.
    Synthesized {
        round: RoundId,
        cursor: usize,
        phase: Phase,
        result: SynthesisResult,
    },
    ListenTimeout {
        round: RoundId,
        cursor: usize,
    },
    Transcribed {
        round: RoundId,
        cursor: usize,
        result: TranscriptionResult,
    },
    AdvanceDue {
        round: RoundId,
        cursor: usize,
    },
}

impl Event {
    fn round(&self) -> Option<RoundId> {
        match self {
            Event::Ui(_) => None,
            Event::CardsPrepared { round, .. }
            | Event::PromptDue { round, .. }
            | Event::Synthesized { round, .. }
            | Event::ListenTimeout { round, .. }
            | Event::Transcribed { round, .. }
            | Event::AdvanceDue { round, .. } => Some(*round),
        }
    }
}

/// Snapshot of the session for a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    pub round: RoundId,
    pub phase: Phase,
    pub current_card: Option<Card>,
    pub last_attempt: Option<Attempt>,
    pub cursor: usize,
    pub total: usize,
    pub score: usize,
    pub mistakes: Vec<Attempt>,
    pub feedback: String,
}

/// Drives one game: card preparation, prompting, listening, scoring and
/// advancing, one event at a time.
pub struct RoundSession {
    config: GameConfig,
    card_source: Arc<dyn CardSource>,
    speech: Arc<dyn SpeechApi>,
    capture: Box<dyn CaptureDevice>,
    state: RoundState,
    round: RoundId,
    feedback: String,
    last_attempt: Option<Attempt>,
    recording: Option<Box<dyn Recording>>,
    in_flight: JoinSet<()>,
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    command_tx: mpsc::Sender<Command>,
}

impl RoundSession {
    pub fn new(
        config: GameConfig,
        card_source: Arc<dyn CardSource>,
        speech: Arc<dyn SpeechApi>,
        capture: Box<dyn CaptureDevice>,
        command_tx: mpsc::Sender<Command>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            config,
            card_source,
            speech,
            capture,
            state: RoundState::default(),
            round: RoundId(0),
            feedback: String::new(),
            last_attempt: None,
            recording: None,
            in_flight: JoinSet::new(),
            event_tx,
            event_rx,
            command_tx,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn view(&self) -> RoundView {
        let current_card = match self.state.phase {
            Phase::DisplayingCard | Phase::Listening => self.state.current_card().cloned(),
            _ => None,
        };
        RoundView {
            round: self.round,
            phase: self.state.phase,
            current_card,
            last_attempt: self.last_attempt.clone(),
            cursor: self.state.cursor,
            total: self.state.cards.len(),
            score: self.state.score,
            mistakes: self.state.mistakes.clone(),
            feedback: self.feedback.clone(),
        }
    }

    /// Waits for the next completion of work this session started.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Processes UI commands and internal completions until the UI channel closes.
    pub async fn run(&mut self, ui_rx: &mut mpsc::Receiver<UiCommand>) -> Result<()> {
        loop {
            let event = tokio::select! {
                command = ui_rx.recv() => match command {
                    Some(command) => Event::Ui(command),
                    None => {
                        tracing::info!("UI channel closed. Ending session.");
                        break;
                    }
                },
                Some(event) = self.event_rx.recv() => event,
            };
            self.handle(event).await?;
        }
        self.abandon_round();
        Ok(())
    }

    /// Applies one event. Errors only if the runtime stopped listening for commands.
    pub async fn handle(&mut self, event: Event) -> Result<()> {
        while self.in_flight.try_join_next().is_some() {}

        if let Some(round) = event.round() {
            if round != self.round {
                tracing::debug!(
                    "Dropping event from stale round {:?} (current {:?})",
                    round,
                    self.round
                );
                return Ok(());
            }
        }

        match event {
            Event::Ui(command) => self.handle_command(command).await,
            Event::CardsPrepared { result, .. } => self.on_cards_prepared(result).await,
            Event::PromptDue { cursor, .. } => {
                if self.state.phase == Phase::DisplayingCard && cursor == self.state.cursor {
                    if let Some(card) = self.state.current_card() {
                        let word = card.word.clone();
                        self.speak(word);
                    }
                }
                Ok(())
            }
            Event::Synthesized {
                cursor,
                phase,
                result,
                ..
            } => self.on_synthesized(cursor, phase, result).await,
            Event::ListenTimeout { cursor, .. } => {
                if self.state.phase == Phase::Listening && cursor == self.state.cursor {
                    tracing::info!("Recording reached its time limit. Stopping.");
                    self.stop_listening().await
                } else {
                    Ok(())
                }
            }
            Event::Transcribed { cursor, result, .. } => self.on_transcribed(cursor, result).await,
            Event::AdvanceDue { cursor, .. } => {
                if self.state.phase == Phase::Scoring && cursor == self.state.cursor {
                    self.advance().await
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn handle_command(&mut self, command: UiCommand) -> Result<()> {
        match (command, self.state.phase) {
            (
                UiCommand::StartRound,
                Phase::Idle | Phase::RoundComplete | Phase::ReviewingMistakes | Phase::NoCardsAvailable,
            ) => self.begin_round().await,
            (UiCommand::StartNewRound, _) => self.begin_round().await,
            (UiCommand::ToggleListening, Phase::DisplayingCard) => self.start_listening().await,
            (UiCommand::ToggleListening, Phase::Listening) => self.stop_listening().await,
            (UiCommand::ShowMistakes, Phase::RoundComplete) if !self.state.mistakes.is_empty() => {
                self.set_phase(Phase::ReviewingMistakes).await
            }
            (command, phase) => {
                tracing::debug!("Ignoring {:?} in phase {:?}", command, phase);
                Ok(())
            }
        }
    }

    /// Cancels everything belonging to the current round and releases the microphone.
    fn abandon_round(&mut self) {
        self.in_flight.abort_all();
        if self.recording.take().is_some() {
            tracing::debug!("Released capture device");
        }
    }

    async fn begin_round(&mut self) -> Result<()> {
        self.abandon_round();
        self.round = RoundId(self.round.0 + 1);
        self.state = RoundState::default();
        self.last_attempt = None;
        tracing::info!("Starting round {}", self.round.0);

        self.set_phase(Phase::PreparingCards).await?;
        self.set_feedback("Generating game words...").await?;

        let source = Arc::clone(&self.card_source);
        let tx = self.event_tx.clone();
        let round = self.round;
        let max_count = self.config.max_cards_per_round;
        self.in_flight.spawn(async move {
            let result = source.prepare_cards(max_count).await;
            let _ = tx.send(Event::CardsPrepared { round, result });
        });
        Ok(())
    }

    async fn on_cards_prepared(&mut self, result: CardSourceResult) -> Result<()> {
        if self.state.phase != Phase::PreparingCards {
            return Ok(());
        }
        match result {
            Ok(mut cards) if !cards.is_empty() => {
                cards.truncate(self.config.max_cards_per_round);
                tracing::info!(
                    "Round {} ready with {} cards ({} placeholder images)",
                    self.round.0,
                    cards.len(),
                    cards.iter().filter(|c| c.image.is_placeholder()).count()
                );
                self.state.cards = cards;
                self.show_current_card().await
            }
            Ok(_) => {
                tracing::warn!("Card source returned no cards");
                self.set_phase(Phase::NoCardsAvailable).await?;
                self.set_feedback("No game words generated. Please try again.").await
            }
            Err(e) => {
                tracing::warn!("{}: {}", e.kind(), e);
                self.set_phase(Phase::NoCardsAvailable).await?;
                self.set_feedback("Failed to load game words. Please try again.").await
            }
        }
    }

    async fn show_current_card(&mut self) -> Result<()> {
        let Some(card) = self.state.current_card().cloned() else {
            return self.finish_round().await;
        };
        self.set_phase(Phase::DisplayingCard).await?;
        self.set_feedback("").await?;
        self.send(Command::CardShown {
            card,
            position: self.state.cursor + 1,
            total: self.state.cards.len(),
            score: self.state.score,
        })
        .await?;
        self.schedule(
            self.config.prompt_delay,
            Event::PromptDue {
                round: self.round,
                cursor: self.state.cursor,
            },
        );
        Ok(())
    }

    async fn start_listening(&mut self) -> Result<()> {
        match self.capture.start() {
            Ok(recording) => {
                self.recording = Some(recording);
                self.set_phase(Phase::Listening).await?;
                self.set_feedback("Listening...").await?;
                self.schedule(
                    self.config.max_recording,
                    Event::ListenTimeout {
                        round: self.round,
                        cursor: self.state.cursor,
                    },
                );
                Ok(())
            }
            Err(e) => self.record_forced_incorrect(e).await,
        }
    }

    async fn stop_listening(&mut self) -> Result<()> {
        let Some(recording) = self.recording.take() else {
            return Ok(());
        };
        let audio = match recording.finish() {
            Ok(audio) => audio,
            Err(e) => return self.record_forced_incorrect(e).await,
        };
        tracing::debug!("Captured {} bytes of {}", audio.bytes.len(), audio.mime_type);

        self.set_phase(Phase::Scoring).await?;
        self.set_feedback("Transcribing...").await?;

        let speech = Arc::clone(&self.speech);
        let tx = self.event_tx.clone();
        let round = self.round;
        let cursor = self.state.cursor;
        let timeout = self.config.request_timeout;
        self.in_flight.spawn(async move {
            let result =
                match tokio::time::timeout(timeout, speech.transcribe(&audio.bytes, &audio.mime_type))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(GameError::TranscriptionUnavailable(format!(
                        "transcription timed out after {timeout:?}"
                    ))),
                };
            let _ = tx.send(Event::Transcribed {
                round,
                cursor,
                result,
            });
        });
        Ok(())
    }

    /// The card is consumed without a comparable transcript: no point, no mistake entry.
    async fn record_forced_incorrect(&mut self, error: GameError) -> Result<()> {
        tracing::warn!("{}: {}. Counting the card as missed.", error.kind(), error);
        self.recording = None;
        self.last_attempt = None;
        self.state.cursor += 1;
        self.set_phase(Phase::Scoring).await?;
        self.set_feedback(
            "Microphone access denied or error starting recording. Please allow microphone access.",
        )
        .await?;
        self.schedule(
            self.config.capture_failure_delay,
            Event::AdvanceDue {
                round: self.round,
                cursor: self.state.cursor,
            },
        );
        Ok(())
    }

    async fn on_transcribed(&mut self, cursor: usize, result: TranscriptionResult) -> Result<()> {
        if self.state.phase != Phase::Scoring || cursor != self.state.cursor {
            return Ok(());
        }
        let Some(card) = self.state.cards.get(cursor).cloned() else {
            return Ok(());
        };

        let (transcript, transcribed) = match result {
            Ok(text) => (text.trim().to_string(), true),
            Err(e) => {
                tracing::warn!("{}: {}", e.kind(), e);
                (String::new(), false)
            }
        };
        tracing::info!("Player said: \"{}\" (target \"{}\")", transcript, card.word);

        let attempt = Attempt::judge(card, transcript);
        self.state.cursor += 1;
        let (message, spoken) = if attempt.is_correct {
            self.state.score += 1;
            ("Correct!".to_string(), "Correct!")
        } else if transcribed {
            (
                format!(
                    "Incorrect. You said: \"{}\". The correct word was: \"{}\".",
                    attempt.transcript, attempt.card.word
                ),
                "Try again!",
            )
        } else {
            (
                format!(
                    "Could not transcribe audio. The correct word was: \"{}\".",
                    attempt.card.word
                ),
                "Try again!",
            )
        };
        if !attempt.is_correct {
            self.state.mistakes.push(attempt.clone());
        }
        self.last_attempt = Some(attempt);

        self.set_feedback(message).await?;
        self.speak(spoken.to_string());
        self.schedule(
            self.config.advance_delay,
            Event::AdvanceDue {
                round: self.round,
                cursor: self.state.cursor,
            },
        );
        Ok(())
    }

    async fn advance(&mut self) -> Result<()> {
        if self.state.cursor < self.state.cards.len() {
            self.show_current_card().await
        } else {
            self.finish_round().await
        }
    }

    async fn finish_round(&mut self) -> Result<()> {
        let score = self.state.score;
        let total = self.state.cards.len();
        tracing::info!("Round {} complete: {}/{}", self.round.0, score, total);
        self.set_phase(Phase::RoundComplete).await?;
        self.set_feedback(format!("Round over! Your final score: {score} out of {total}"))
            .await?;
        self.send(Command::RoundFinished {
            score,
            total,
            mistakes: self.state.mistakes.clone(),
        })
        .await
    }

    async fn on_synthesized(
        &mut self,
        cursor: usize,
        phase: Phase,
        result: SynthesisResult,
    ) -> Result<()> {
        match result {
            Ok(audio) => self.send(Command::PlayAudio(audio)).await,
            Err(e) => {
                tracing::warn!("{}: {}. Skipping playback.", e.kind(), e);
                // Feedback has moved on to another card or the summary.
                if self.state.phase != phase || self.state.cursor != cursor {
                    return Ok(());
                }
                let message = if self.feedback.is_empty() {
                    "Audio unavailable.".to_string()
                } else {
                    format!("{} (audio unavailable)", self.feedback)
                };
                self.set_feedback(message).await
            }
        }
    }

    fn speak(&mut self, text: String) {
        let speech = Arc::clone(&self.speech);
        let tx = self.event_tx.clone();
        let round = self.round;
        let cursor = self.state.cursor;
        let phase = self.state.phase;
        let timeout = self.config.request_timeout;
        self.in_flight.spawn(async move {
            let result = match tokio::time::timeout(timeout, speech.synthesize(&text)).await {
                Ok(result) => result,
                Err(_) => Err(GameError::SynthesisUnavailable(format!(
                    "synthesis of \"{text}\" timed out after {timeout:?}"
                ))),
            };
            let _ = tx.send(Event::Synthesized {
                round,
                cursor,
                phase,
                result,
            });
        });
    }

    fn schedule(&mut self, delay: Duration, event: Event) {
        let tx = self.event_tx.clone();
        self.in_flight.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    async fn set_phase(&mut self, phase: Phase) -> Result<()> {
        if self.state.phase == phase {
            return Ok(());
        }
        tracing::info!("Phase {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
        self.send(Command::PhaseChanged(phase)).await
    }

    async fn set_feedback(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if self.feedback == message {
            return Ok(());
        }
        self.feedback = message.clone();
        self.send(Command::Feedback(message)).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .context("Failed to send command to runtime")
    }
}
