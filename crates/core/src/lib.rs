pub mod capture;
pub mod card;
pub mod card_source;
pub mod error;
pub mod matching;
pub mod session_state;
pub mod speech;

use crate::card::{Attempt, Card};
use crate::session_state::Phase;
use crate::speech::SpeechAudio;

/// Represents commands that the round session issues to the runtime.
///
/// The session never renders or plays anything itself. Every observable
/// side effect goes through this enum so a terminal, a web socket or a test
/// can consume the same stream.
#[derive(Debug, Clone)]
pub enum Command {
    /// The state machine entered a new phase.
    PhaseChanged(Phase),
    /// A card became the active card.
    CardShown {
        card: Card,
        /// One-based position of the card in the round.
        position: usize,
        total: usize,
        score: usize,
    },
    /// The visible feedback line changed.
    Feedback(String),
    /// Synthesized speech that should be played to the player.
    PlayAudio(SpeechAudio),
    /// The last card was scored.
    RoundFinished {
        score: usize,
        total: usize,
        mistakes: Vec<Attempt>,
    },
}
