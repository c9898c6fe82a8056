//! ElevenLabs text-to-speech adapter.

use crate::error::{SynthesisFailure, VoiceError};
use crate::metadata::ProviderMetadata;
use crate::provider::{AudioGenerationResult, VoiceProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tale_core::{AudioEncoding, VoiceServiceConfig};

pub const ELEVENLABS: &str = "elevenlabs";

/// Per-request character limit of the multilingual models.
const ELEVENLABS_MAX_INPUT: usize = 5_000;

const ELEVENLABS_LANGUAGES: &[&str] = &[
    "en", "ja", "zh", "de", "hi", "fr", "ko", "pt", "it", "es", "id", "nl", "tr", "fil", "pl",
    "sv", "bg", "ro", "ar", "cs", "el", "fi", "hr", "ms", "sk", "da", "ta", "uk", "ru",
];

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
}

/// Models that accept an explicit `language_code`; the rest reject it.
const LANGUAGE_ENFORCING_MODELS: &[&str] = &["eleven_turbo_v2_5", "eleven_flash_v2_5"];

fn enforces_language(model_id: &str) -> bool {
    LANGUAGE_ENFORCING_MODELS.contains(&model_id)
}

#[derive(Debug, Clone)]
pub struct ElevenLabsProvider {
    client: Client,
    api_key: Option<SecretString>,
    enabled: bool,
    voice_id: String,
    model_id: String,
    base_url: String,
    metadata: ProviderMetadata,
}

impl ElevenLabsProvider {
    pub fn from_config(config: &VoiceServiceConfig) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoiceError::Setup(format!("ElevenLabs HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            enabled: config.enabled,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            metadata: ProviderMetadata::new(
                ELEVENLABS,
                true,
                ELEVENLABS_MAX_INPUT,
                &[AudioEncoding::Mp3, AudioEncoding::Pcm],
                ELEVENLABS_LANGUAGES,
            ),
        })
    }

    fn output_format(encoding: AudioEncoding) -> &'static str {
        match encoding {
            AudioEncoding::Pcm => "pcm_24000",
            _ => "mp3_44100_128",
        }
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .filter(|k| !k.is_empty())
    }
}

fn classify_status(status: StatusCode) -> SynthesisFailure {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SynthesisFailure::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => SynthesisFailure::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SynthesisFailure::Timeout,
        s if s.is_server_error() => SynthesisFailure::Upstream,
        _ => SynthesisFailure::Rejected,
    }
}

fn classify_transport(e: &reqwest::Error) -> SynthesisFailure {
    if e.is_timeout() {
        SynthesisFailure::Timeout
    } else {
        SynthesisFailure::Transport
    }
}

#[async_trait]
impl VoiceProvider for ElevenLabsProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn validate_configuration(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }

    #[tracing::instrument(skip(self, text), fields(provider = ELEVENLABS, chars = text.chars().count()))]
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<AudioGenerationResult, VoiceError> {
        self.metadata.check(text, language, encoding)?;

        let api_key = self.api_key().ok_or_else(|| {
            VoiceError::synthesis(ELEVENLABS, SynthesisFailure::Unauthorized, "no API key configured")
        })?;

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);
        let primary_language = language.split(['-', '_']).next().unwrap_or(language);
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            language_code: enforces_language(&self.model_id).then_some(primary_language),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", Self::output_format(encoding))])
            .header("xi-api-key", api_key)
            .header("accept", encoding.mime_type())
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::synthesis(ELEVENLABS, classify_transport(&e), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "ElevenLabs rejected synthesis request");
            return Err(VoiceError::synthesis(
                ELEVENLABS,
                classify_status(status),
                format!("{}: {}", status, error_text.chars().take(300).collect::<String>()),
            ));
        }

        let characters_billed = response
            .headers()
            .get("character-cost")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let audio = response
            .bytes()
            .await
            .map_err(|e| VoiceError::synthesis(ELEVENLABS, classify_transport(&e), e.to_string()))?;
        if audio.is_empty() {
            return Err(VoiceError::synthesis(
                ELEVENLABS,
                SynthesisFailure::InvalidResponse,
                "empty audio body",
            ));
        }

        tracing::debug!(bytes = audio.len(), ?characters_billed, "ElevenLabs synthesis complete");
        Ok(AudioGenerationResult {
            audio: audio.to_vec(),
            encoding,
            provider: ELEVENLABS.to_string(),
            characters_billed,
        })
    }
}
