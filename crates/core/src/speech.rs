use crate::error::GameError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Playable audio produced from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Sample rate for raw PCM payloads. `None` for self-describing containers.
    pub sample_rate: Option<u32>,
}

/// Audio recorded from the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// `Ok(audio)` or `GameError::SynthesisUnavailable`.
pub type SynthesisResult = Result<SpeechAudio, GameError>;

/// `Ok(text)` or `GameError::TranscriptionUnavailable`.
pub type TranscriptionResult = Result<String, GameError>;

/// Text-to-speech and speech-to-text, as the round session needs them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechApi: Send + Sync {
    /// Fails with `SynthesisUnavailable` when no audio payload comes back.
    async fn synthesize(&self, text: &str) -> SynthesisResult;

    /// Fails with `TranscriptionUnavailable` when no text comes back.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> TranscriptionResult;
}
