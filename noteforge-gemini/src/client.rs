use std::time::Duration;

use async_trait::async_trait;
use noteforge_core::{GenerationError, GenerationParams, TextGenerator, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use tracing::{debug, warn};

use crate::wire::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const MISSING_KEY: &str =
    "Gemini API key not configured. Set GEMINI_API_KEY or pass --api-key.";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Single-shot client for `models/{model}:generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Reads the key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, GenerationError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(key)
    }

    pub fn with_config(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(MISSING_KEY.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Configuration(format!("http client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn post(&self, body: &GenerateContentRequest<'_>) -> Result<reqwest::Response, GenerationError> {
        self.http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "generation request did not complete");
                GenerationError::Upstream {
                    status: None,
                    body: e.to_string(),
                }
            })
    }

    /// Cheap probe: true when the endpoint accepts the key.
    pub async fn validate_key(&self) -> bool {
        let probe = GenerateContentRequest::single(
            "Hello, this is a test message.",
            GenerationConfig {
                max_output_tokens: 10,
                ..Default::default()
            },
        );
        match self.post(&probe).await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let body = GenerateContentRequest::single(
            prompt,
            GenerationConfig {
                temperature: Some(params.temperature),
                top_k: Some(params.top_k),
                top_p: Some(params.top_p),
                max_output_tokens: params.max_output_tokens,
            },
        );
        debug!(model = %self.config.model, prompt_chars = prompt.len(), "sending generation request");

        let resp = self.post(&body).await?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| GenerationError::Upstream {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "generation endpoint returned an error");
            return Err(GenerationError::Upstream {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&text).unwrap_or_default();
        match envelope.first_text() {
            Some(generated) => Ok(generated),
            None => {
                warn!(status = status.as_u16(), body = %text, "unexpected response structure");
                Err(GenerationError::Upstream {
                    status: Some(status.as_u16()),
                    body: text,
                })
            }
        }
    }
}
