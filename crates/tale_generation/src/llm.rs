use async_trait::async_trait;
use tale_core::AiServiceConfig;
use thiserror::Error;

/// Sampling parameters for a single generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Overrides the client's default model when set.
    pub model: Option<String>,
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

impl GenerationParams {
    pub fn from_config(config: &AiServiceConfig) -> Self {
        Self {
            model: None,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    /// Model that actually answered.
    pub model: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Non-retryable rejection (4xx other than 408/429).
    #[error("{provider} rejected the request ({status}): {body}")]
    Rejected {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        provider: String,
        attempts: u32,
        last_error: String,
    },

    #[error("{provider} returned an unusable response: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("text generator setup failed: {0}")]
    Setup(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Model used when the params do not name one.
    fn default_model(&self) -> &str;

    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedText, GenerationError>;
}
