use secrecy::SecretString;
use std::time::Duration;

pub struct Config {
    base_url: String,
    api_key: SecretString,
    text_model: String,
    image_model: String,
    tts_model: String,
    stt_model: String,
    voice: String,
    timeout: Duration,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_text_model(mut self, model: &str) -> Self {
        self.config.text_model = model.to_string();
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.config.image_model = model.to_string();
        self
    }

    pub fn with_tts_model(mut self, model: &str) -> Self {
        self.config.tts_model = model.to_string();
        self
    }

    pub fn with_stt_model(mut self, model: &str) -> Self {
        self.config.stt_model = model.to_string();
        self
    }

    pub fn with_voice(mut self, voice: &str) -> Self {
        self.config.voice = voice.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            // Empty when unset; requests will then fail with an auth error.
            api_key: std::env::var("GEMINI_API_KEY")
                .unwrap_or_else(|_| "".to_string())
                .into(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            stt_model: "gemini-2.5-flash".to_string(),
            voice: "Kore".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    pub fn tts_model(&self) -> &str {
        &self.tts_model
    }

    pub fn stt_model(&self) -> &str {
        &self.stt_model
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = Config::builder()
            .with_base_url("http://localhost:8080/v1beta/")
            .with_api_key("test-key")
            .with_voice("Puck")
            .with_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.base_url(), "http://localhost:8080/v1beta");
        assert_eq!(config.api_key().expose_secret(), "test-key");
        assert_eq!(config.voice(), "Puck");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.text_model(), "gemini-2.5-flash");
        assert_eq!(config.tts_model(), "gemini-2.5-flash-preview-tts");
    }
}
