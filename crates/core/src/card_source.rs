use crate::card::{Card, CardId, ImageRef};
use crate::error::GameError;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
#[cfg(test)]
use mockall::automock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub type CardSourceResult = Result<Vec<Card>, GameError>;

/// Words used when no generator is configured.
pub const DEFAULT_WORDS: [&str; 4] = ["cat", "dog", "apple", "ball"];

/// Produces the ordered cards for one round.
///
/// Implementations return between zero and `max_count` cards. A missing
/// picture is never an error: the card comes back with
/// `ImageRef::Placeholder`. Only a failed or empty word list fails the whole
/// batch, with `GameError::CardSourceUnavailable`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CardSource: Send + Sync {
    async fn prepare_cards(&self, max_count: usize) -> CardSourceResult;
}

/// Generates candidate target words.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WordGenerator: Send + Sync {
    async fn generate_words(&self, count: usize) -> Result<Vec<String>>;
}

/// Generates a picture for one word.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, word: &str) -> Result<ImageRef>;
}

/// Card source backed by a word generator and an image generator.
///
/// Images for all words are requested concurrently and the batch completes
/// once every request has either succeeded or fallen back to a placeholder.
pub struct GeneratedCardSource {
    words: Arc<dyn WordGenerator>,
    images: Arc<dyn ImageGenerator>,
    request_timeout: Duration,
}

impl GeneratedCardSource {
    pub fn new(
        words: Arc<dyn WordGenerator>,
        images: Arc<dyn ImageGenerator>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            words,
            images,
            request_timeout,
        }
    }

    async fn image_for(&self, word: &str) -> ImageRef {
        match tokio::time::timeout(self.request_timeout, self.images.generate_image(word)).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                tracing::warn!("Image generation failed for '{}': {:#}", word, e);
                ImageRef::Placeholder
            }
            Err(_) => {
                tracing::warn!(
                    "Image generation for '{}' timed out after {:?}",
                    word,
                    self.request_timeout
                );
                ImageRef::Placeholder
            }
        }
    }
}

#[async_trait]
impl CardSource for GeneratedCardSource {
    async fn prepare_cards(&self, max_count: usize) -> CardSourceResult {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let raw = match tokio::time::timeout(
            self.request_timeout,
            self.words.generate_words(max_count),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                return Err(GameError::CardSourceUnavailable(format!(
                    "word generation failed: {e:#}"
                )));
            }
            Err(_) => {
                return Err(GameError::CardSourceUnavailable(format!(
                    "word generation timed out after {:?}",
                    self.request_timeout
                )));
            }
        };

        let words = normalize_words(raw, max_count);
        if words.is_empty() {
            return Err(GameError::CardSourceUnavailable(
                "word generation returned no usable words".to_string(),
            ));
        }
        tracing::debug!("Generating images for words: {:?}", words);

        let images = join_all(words.iter().map(|word| self.image_for(word))).await;
        Ok(build_cards(words, images))
    }
}

/// Fixed word list with placeholder pictures.
#[derive(Debug, Clone)]
pub struct StaticCardSource {
    words: Vec<String>,
}

impl StaticCardSource {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }
}

impl Default for StaticCardSource {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS.iter().map(|w| w.to_string()).collect())
    }
}

#[async_trait]
impl CardSource for StaticCardSource {
    async fn prepare_cards(&self, max_count: usize) -> CardSourceResult {
        let words = normalize_words(self.words.clone(), max_count);
        let images = vec![ImageRef::Placeholder; words.len()];
        Ok(build_cards(words, images))
    }
}

/// Trims punctuation around each word, drops empties and case-insensitive
/// duplicates, and keeps at most `max_count` words in their original order.
pub fn normalize_words(raw: Vec<String>, max_count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.to_lowercase()))
        .take(max_count)
        .collect()
}

fn build_cards(words: Vec<String>, images: Vec<ImageRef>) -> Vec<Card> {
    words
        .into_iter()
        .zip(images)
        .enumerate()
        .map(|(idx, (word, image))| Card::new(CardId(idx as u32), word, image))
        .collect()
}
