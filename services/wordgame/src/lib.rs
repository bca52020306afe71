pub mod config;
pub mod gemini_adapter;
pub mod microphone;
pub mod prompt_loader;
pub mod terminal;
