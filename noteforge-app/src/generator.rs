use async_trait::async_trait;
use noteforge_core::{GenerationError, GenerationParams, Settings, TextGenerator};
use noteforge_gemini::{GeminiClient, GeminiConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Stands in for the real client when no API key is available, so commands
/// that never generate still work and those that do get a clear message.
pub struct Unconfigured(String);

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
        Err(GenerationError::Configuration(self.0.clone()))
    }
}

pub fn build_generator(api_key: Option<&str>, settings: &Settings) -> Arc<dyn TextGenerator> {
    let config = GeminiConfig::new(api_key.unwrap_or_default())
        .model(settings.model.clone())
        .timeout(Duration::from_secs(settings.timeout_secs.max(1)));
    match GeminiClient::with_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            debug!(error = %e, "generation disabled");
            Arc::new(Unconfigured(e.user_message()))
        }
    }
}
