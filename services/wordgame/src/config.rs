//! Application Configuration Module
//!
//! Loads the word game's settings from environment variables (and a `.env`
//! file when present) into a single struct that `main` hands out to the
//! vendor client and the round session.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;
use wordgame_core::session_state::GameConfig;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub tts_model: Option<String>,
    pub tts_voice: Option<String>,
    pub stt_model: Option<String>,
    pub max_cards_per_round: usize,
    pub prompt_delay: Duration,
    pub advance_delay: Duration,
    pub capture_failure_delay: Duration,
    pub max_recording: Duration,
    pub request_timeout: Duration,
    pub image_dir: PathBuf,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Required. Key for the generative AI API.
    // *   `GEMINI_BASE_URL`, `TEXT_MODEL`, `IMAGE_MODEL`, `TTS_MODEL`, `TTS_VOICE`, `STT_MODEL`:
    //     (Optional) Override the client defaults.
    // *   `MAX_CARDS_PER_ROUND`: (Optional) Defaults to 10.
    // *   `PROMPT_DELAY_MS`, `ADVANCE_DELAY_MS`, `CAPTURE_FAILURE_DELAY_MS`,
    //     `MAX_RECORDING_MS`, `REQUEST_TIMEOUT_MS`: (Optional) Session timings.
    // *   `IMAGE_DIR`: (Optional) Where generated pictures are written. Defaults to "images".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let defaults = GameConfig::default();
        let millis = |name: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&lookup, name, default.as_millis() as u64).map(Duration::from_millis)
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "RUST_LOG".to_string(),
                value: log_level_str.clone(),
            })?;

        Ok(Self {
            gemini_api_key,
            gemini_base_url: lookup("GEMINI_BASE_URL"),
            text_model: lookup("TEXT_MODEL"),
            image_model: lookup("IMAGE_MODEL"),
            tts_model: lookup("TTS_MODEL"),
            tts_voice: lookup("TTS_VOICE"),
            stt_model: lookup("STT_MODEL"),
            max_cards_per_round: parse_or(
                &lookup,
                "MAX_CARDS_PER_ROUND",
                defaults.max_cards_per_round,
            )?,
            prompt_delay: millis("PROMPT_DELAY_MS", defaults.prompt_delay)?,
            advance_delay: millis("ADVANCE_DELAY_MS", defaults.advance_delay)?,
            capture_failure_delay: millis(
                "CAPTURE_FAILURE_DELAY_MS",
                defaults.capture_failure_delay,
            )?,
            max_recording: millis("MAX_RECORDING_MS", defaults.max_recording)?,
            request_timeout: millis("REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            image_dir: lookup("IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("images")),
            log_level,
        })
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            max_cards_per_round: self.max_cards_per_round,
            prompt_delay: self.prompt_delay,
            advance_delay: self.advance_delay,
            capture_failure_delay: self.capture_failure_delay,
            max_recording: self.max_recording,
            request_timeout: self.request_timeout,
        }
    }

    pub fn gemini_config(&self) -> gemini_genai::Config {
        let mut builder = gemini_genai::Config::builder()
            .with_api_key(&self.gemini_api_key)
            .with_timeout(self.request_timeout);
        if let Some(url) = &self.gemini_base_url {
            builder = builder.with_base_url(url);
        }
        if let Some(model) = &self.text_model {
            builder = builder.with_text_model(model);
        }
        if let Some(model) = &self.image_model {
            builder = builder.with_image_model(model);
        }
        if let Some(model) = &self.tts_model {
            builder = builder.with_tts_model(model);
        }
        if let Some(voice) = &self.tts_voice {
            builder = builder.with_voice(voice);
        }
        if let Some(model) = &self.stt_model {
            builder = builder.with_stt_model(model);
        }
        builder.build()
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}
