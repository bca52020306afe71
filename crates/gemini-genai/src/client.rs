use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    PredictInstance, PredictParameters, PredictRequest, PredictResponse,
};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod config;

use config::Config;

/// Decoded picture returned by the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Decoded audio returned by the speech model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// The four vendor operations the game relies on.
#[async_trait]
pub trait GenAiClient: Send + Sync {
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

pub struct GeminiClient {
    client: reqwest::Client,
    config: Config,
}

impl GeminiClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url(), model, method)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", self.config.api_key().expose_secret())
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", url, status, text);
        }
        resp.json::<R>()
            .await
            .with_context(|| format!("Invalid response body from {url}"))
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent");
        tracing::debug!("POST {}", url);
        self.post(&url, request).await
    }
}

#[async_trait]
impl GenAiClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            generation_config: None,
        };
        let resp = self
            .generate_content(self.config.text_model(), &request)
            .await?;
        resp.text()
            .ok_or_else(|| anyhow!("No text in response from {}", self.config.text_model()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters { sample_count: 1 },
        };
        let url = self.endpoint(self.config.image_model(), "predict");
        tracing::debug!("POST {}", url);
        let resp: PredictResponse = self.post(&url, &request).await?;

        let prediction = resp
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or_else(|| anyhow!("No image in response from {}", self.config.image_model()))?;
        let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .context("Image payload is not valid base64")?;
        Ok(GeneratedImage {
            bytes,
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| "image/png".to_string()),
        })
    }

    async fn synthesize_speech(&self, text: &str) -> Result<GeneratedAudio> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(text)])],
            generation_config: Some(GenerationConfig::audio(self.config.voice())),
        };
        let resp = self
            .generate_content(self.config.tts_model(), &request)
            .await?;
        let data = resp
            .inline_data()
            .ok_or_else(|| anyhow!("No audio in response from {}", self.config.tts_model()))?;
        let bytes = STANDARD
            .decode(data.data.as_bytes())
            .context("Audio payload is not valid base64")?;
        tracing::debug!("Synthesized {} bytes of {}", bytes.len(), data.mime_type);
        Ok(GeneratedAudio {
            bytes,
            mime_type: data.mime_type.clone(),
        })
    }

    async fn transcribe_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(instruction),
                Part::inline(mime_type, STANDARD.encode(audio)),
            ])],
            generation_config: None,
        };
        let resp = self
            .generate_content(self.config.stt_model(), &request)
            .await?;
        resp.text()
            .ok_or_else(|| anyhow!("No transcript in response from {}", self.config.stt_model()))
    }
}
