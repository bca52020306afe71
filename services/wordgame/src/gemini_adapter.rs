use crate::prompt_loader::Prompts;
use anyhow::{Context, Result};
use async_trait::async_trait;
use gemini_genai::GenAiClient;
use std::path::PathBuf;
use wordgame_core::card::ImageRef;
use wordgame_core::card_source::{ImageGenerator, WordGenerator};
use wordgame_core::error::GameError;
use wordgame_core::speech::{SpeechApi, SpeechAudio, SynthesisResult, TranscriptionResult};
use wordgame_native_utils::audio::rate_from_mime;

/// Implements the game's vendor-facing traits over any `GenAiClient`.
pub struct GeminiAdapter<C> {
    client: C,
    prompts: Prompts,
    image_dir: PathBuf,
}

impl<C: GenAiClient> GeminiAdapter<C> {
    pub fn new(client: C, prompts: Prompts, image_dir: PathBuf) -> Self {
        Self {
            client,
            prompts,
            image_dir,
        }
    }
}

/// Splits model output into candidate words, skipping tokens without letters
/// such as list numbering.
fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| w.chars().any(char::is_alphabetic))
        .map(str::to_string)
        .collect()
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

fn file_stem_for(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[async_trait]
impl<C: GenAiClient> WordGenerator for GeminiAdapter<C> {
    async fn generate_words(&self, count: usize) -> Result<Vec<String>> {
        let text = self
            .client
            .generate_text(&self.prompts.word_list(count))
            .await
            .context("Failed to generate word list")?;
        let words = split_words(&text);
        tracing::info!("Generated words: {:?}", words);
        Ok(words)
    }
}

#[async_trait]
impl<C: GenAiClient> ImageGenerator for GeminiAdapter<C> {
    async fn generate_image(&self, word: &str) -> Result<ImageRef> {
        let image = self
            .client
            .generate_image(&self.prompts.card_image(word))
            .await
            .with_context(|| format!("Failed to generate image for '{word}'"))?;

        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.image_dir.display()))?;
        let path = self.image_dir.join(format!(
            "{}.{}",
            file_stem_for(word),
            extension_for(&image.mime_type)
        ));
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!("Saved {} bytes for '{}' to {}", image.bytes.len(), word, path.display());
        Ok(ImageRef::Location(path.display().to_string()))
    }
}

#[async_trait]
impl<C: GenAiClient> SpeechApi for GeminiAdapter<C> {
    async fn synthesize(&self, text: &str) -> SynthesisResult {
        let audio = self
            .client
            .synthesize_speech(text)
            .await
            .map_err(|e| GameError::SynthesisUnavailable(format!("{e:#}")))?;
        if audio.bytes.is_empty() {
            return Err(GameError::SynthesisUnavailable(
                "empty audio payload".to_string(),
            ));
        }
        Ok(SpeechAudio {
            sample_rate: rate_from_mime(&audio.mime_type),
            bytes: audio.bytes,
            mime_type: audio.mime_type,
        })
    }

    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> TranscriptionResult {
        let text = self
            .client
            .transcribe_audio(audio, mime_type, self.prompts.transcription())
            .await
            .map_err(|e| GameError::TranscriptionUnavailable(format!("{e:#}")))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::TranscriptionUnavailable(
                "empty transcript".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_genai::{GeneratedAudio, GeneratedImage};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Client {}

        #[async_trait]
        impl GenAiClient for Client {
            async fn generate_text(&self, prompt: &str) -> Result<String>;
            async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
            async fn synthesize_speech(&self, text: &str) -> Result<GeneratedAudio>;
            async fn transcribe_audio(
                &self,
                audio: &[u8],
                mime_type: &str,
                instruction: &str,
            ) -> Result<String>;
        }
    }

    fn prompts() -> Prompts {
        let mut map = HashMap::new();
        map.insert("word_list".to_string(), "Give me {count} words.".to_string());
        map.insert("card_image".to_string(), "A picture of a {word}.".to_string());
        map.insert("transcription".to_string(), "Transcribe this.".to_string());
        Prompts::from_map(map).unwrap()
    }

    fn adapter(client: MockClient) -> GeminiAdapter<MockClient> {
        GeminiAdapter::new(client, prompts(), PathBuf::from("unused"))
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("cat dog  fish\n"), vec!["cat", "dog", "fish"]);
        assert_eq!(split_words("1. cat, 2. dog"), vec!["cat", "dog"]);
        assert!(split_words("  \n").is_empty());
    }

    #[tokio::test]
    async fn test_generate_words_renders_prompt() {
        let mut client = MockClient::new();
        client
            .expect_generate_text()
            .withf(|prompt| prompt.to_string() == "Give me 4 words.")
            .returning(|_| Ok("cat dog sun moon".to_string()))
            .once();

        let words = adapter(client).generate_words(4).await.unwrap();
        assert_eq!(words, vec!["cat", "dog", "sun", "moon"]);
    }

    #[tokio::test]
    async fn test_generate_image_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockClient::new();
        client
            .expect_generate_image()
            .withf(|prompt| prompt.to_string() == "A picture of a Ice Cream.")
            .returning(|_| {
                Ok(GeneratedImage {
                    bytes: vec![0x89, b'P', b'N', b'G'],
                    mime_type: "image/png".to_string(),
                })
            });

        let image_dir = dir.path().join("cards");
        let adapter = GeminiAdapter::new(client, prompts(), image_dir.clone());
        let image = adapter.generate_image("Ice Cream").await.unwrap();

        let expected = image_dir.join("ice_cream.png");
        assert_eq!(image, ImageRef::Location(expected.display().to_string()));
        assert_eq!(std::fs::read(expected).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_image_failure_is_error() {
        let mut client = MockClient::new();
        client
            .expect_generate_image()
            .returning(|_| Err(anyhow::anyhow!("quota exceeded")));
        assert!(adapter(client).generate_image("cat").await.is_err());
    }

    #[tokio::test]
    async fn test_synthesize_reads_sample_rate() {
        let mut client = MockClient::new();
        client.expect_synthesize_speech().returning(|_| {
            Ok(GeneratedAudio {
                bytes: vec![0, 0, 1, 0],
                mime_type: "audio/L16;codec=pcm;rate=24000".to_string(),
            })
        });

        let audio = adapter(client).synthesize("cat").await.unwrap();
        assert_eq!(audio.sample_rate, Some(24000));
        assert_eq!(audio.bytes.len(), 4);
    }

    #[tokio::test]
    async fn test_synthesize_failures_map_to_game_error() {
        let mut client = MockClient::new();
        client
            .expect_synthesize_speech()
            .returning(|_| Err(anyhow::anyhow!("No audio in response")));
        let err = adapter(client).synthesize("cat").await.unwrap_err();
        assert_eq!(err.kind(), "SynthesisUnavailable");

        let mut client = MockClient::new();
        client.expect_synthesize_speech().returning(|_| {
            Ok(GeneratedAudio {
                bytes: Vec::new(),
                mime_type: "audio/L16;rate=24000".to_string(),
            })
        });
        let err = adapter(client).synthesize("cat").await.unwrap_err();
        assert!(matches!(err, GameError::SynthesisUnavailable(_)));
    }

    #[tokio::test]
    async fn test_transcribe_passes_instruction_and_trims() {
        let mut client = MockClient::new();
        client
            .expect_transcribe_audio()
            .withf(|audio, mime, instruction| {
                audio.to_vec() == vec![1u8, 2, 3]
                    && mime.to_string() == "audio/wav"
                    && instruction.to_string() == "Transcribe this."
            })
            .returning(|_, _, _| Ok("  A cat.\n".to_string()));

        let text = adapter(client).transcribe(&[1, 2, 3], "audio/wav").await.unwrap();
        assert_eq!(text, "A cat.");
    }

    #[tokio::test]
    async fn test_empty_transcript_is_unavailable() {
        let mut client = MockClient::new();
        client
            .expect_transcribe_audio()
            .returning(|_, _, _| Ok("   ".to_string()));
        let err = adapter(client).transcribe(&[1], "audio/wav").await.unwrap_err();
        assert!(matches!(err, GameError::TranscriptionUnavailable(_)));
    }
}
