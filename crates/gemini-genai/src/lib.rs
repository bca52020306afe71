mod client;
pub mod types;

pub use client::config::{Config, ConfigBuilder};
pub use client::{GeminiClient, GenAiClient, GeneratedAudio, GeneratedImage};
