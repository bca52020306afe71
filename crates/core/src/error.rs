use thiserror::Error;

/// Failures the round session knows how to recover from.
///
/// Each variant is local to a card or a round. None of them stop the
/// session; the player can always start a new round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Word generation failed or produced no usable words. A round cannot start.
    #[error("Card source unavailable: {0}")]
    CardSourceUnavailable(String),
    /// No audio came back for a text prompt. Playback is skipped.
    #[error("Speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),
    /// No text came back for a recording. Treated as an empty transcript.
    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),
    /// The microphone could not be opened or failed mid-recording.
    #[error("Capture device unavailable: {0}")]
    CaptureDeviceUnavailable(String),
}

impl GameError {
    /// Stable name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::CardSourceUnavailable(_) => "CardSourceUnavailable",
            GameError::SynthesisUnavailable(_) => "SynthesisUnavailable",
            GameError::TranscriptionUnavailable(_) => "TranscriptionUnavailable",
            GameError::CaptureDeviceUnavailable(_) => "CaptureDeviceUnavailable",
        }
    }
}
