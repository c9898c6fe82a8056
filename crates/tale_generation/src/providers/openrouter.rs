//! OpenAI-compatible chat completions client (OpenRouter by default).

use crate::llm::{GeneratedText, GenerationError, GenerationParams, TextGenerator};
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tale_core::AiServiceConfig;

const PROVIDER: &str = "openrouter";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OpenRouterClient {
    pub fn from_config(config: &AiServiceConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Setup(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            model: config.default_model.clone(),
            retry: RetryConfig::from_config(config),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn invalid(reason: impl Into<String>) -> GenerationError {
        GenerationError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip(self, system, prompt, params), fields(model))]
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedText, GenerationError> {
        let model = params.model.as_deref().unwrap_or(&self.model);
        tracing::Span::current().record("model", model);

        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url);

        let response = with_retry(&self.retry, PROVIDER, || {
            self.client
                .post(&url)
                .bearer_auth(self.api_key.expose_secret())
                .header("X-Title", "tale-generator")
                .json(&body)
                .send()
        })
        .await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Self::invalid(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Self::invalid("no completion text"))?;

        let usage = parsed.usage;
        tracing::debug!(chars = text.len(), "Completion received");
        Ok(GeneratedText {
            text,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }
}
