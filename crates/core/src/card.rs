use crate::matching::is_match;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image shown in place of a card picture that could not be generated.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150/CCCCCC/000000?text=Error";

/// Position of a card within its round. Stable for the lifetime of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// URL or file path of a generated picture.
    Location(String),
    /// Image generation failed; the card is still playable.
    Placeholder,
}

impl ImageRef {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ImageRef::Placeholder)
    }

    /// Where a renderer should load the picture from.
    pub fn display_location(&self) -> &str {
        match self {
            ImageRef::Location(location) => location,
            ImageRef::Placeholder => PLACEHOLDER_IMAGE_URL,
        }
    }
}

/// One word + picture guessing unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub word: String,
    pub image: ImageRef,
}

impl Card {
    pub fn new(id: CardId, word: impl Into<String>, image: ImageRef) -> Self {
        Self {
            id,
            word: word.into(),
            image,
        }
    }
}

/// The player's answer to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub card: Card,
    pub transcript: String,
    pub is_correct: bool,
}

impl Attempt {
    /// Scores `transcript` against the card's word.
    pub fn judge(card: Card, transcript: impl Into<String>) -> Self {
        let transcript = transcript.into();
        let is_correct = is_match(&transcript, &card.word);
        Self {
            card,
            transcript,
            is_correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_uses_fallback_url() {
        assert_eq!(ImageRef::Placeholder.display_location(), PLACEHOLDER_IMAGE_URL);
        assert!(ImageRef::Placeholder.is_placeholder());

        let image = ImageRef::Location("images/cat.png".to_string());
        assert_eq!(image.display_location(), "images/cat.png");
        assert!(!image.is_placeholder());
    }

    #[test]
    fn test_judge_uses_word_boundaries() {
        let card = Card::new(CardId(0), "cat", ImageRef::Placeholder);

        let attempt = Attempt::judge(card.clone(), "I see a CAT");
        assert!(attempt.is_correct);
        assert_eq!(attempt.transcript, "I see a CAT");

        let attempt = Attempt::judge(card, "I love cats");
        assert!(!attempt.is_correct);
    }
}
