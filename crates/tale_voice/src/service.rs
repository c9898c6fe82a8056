//! Voice service: the only entry point callers need.
//!
//! Validate-then-call-once: configuration checks pick a provider, then that
//! provider is called exactly once. A failed live call is returned to the
//! caller as-is and never retried on another (possibly paid) provider.

use crate::error::VoiceError;
use crate::metadata::ProviderMetadata;
use crate::provider::{AudioGenerationResult, VoiceProvider};
use crate::registry::ProviderRegistry;
use serde::Serialize;
use std::sync::Arc;
use tale_core::{AudioEncoding, VoiceServiceConfig};

/// Point-in-time view of one registered provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
    pub is_default: bool,
    pub metadata: ProviderMetadata,
}

#[derive(Debug, Clone)]
pub struct VoiceService {
    registry: Arc<ProviderRegistry>,
    default_encoding: AudioEncoding,
}

impl VoiceService {
    pub fn new(registry: Arc<ProviderRegistry>, default_encoding: AudioEncoding) -> Self {
        Self {
            registry,
            default_encoding,
        }
    }

    /// Fails when the provider that would be selected cannot produce
    /// `VOICE_OUTPUT_FORMAT`.
    pub fn from_config(config: &VoiceServiceConfig) -> Result<Self, VoiceError> {
        let registry = ProviderRegistry::from_config(config)?;
        if let Ok(provider) = registry.get_provider_with_fallback() {
            if !provider.metadata().supports_encoding(config.output_format) {
                return Err(VoiceError::Setup(format!(
                    "VOICE_OUTPUT_FORMAT {} is not supported by {}",
                    config.output_format,
                    provider.name()
                )));
            }
        }
        Ok(Self::new(Arc::new(registry), config.output_format))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn default_encoding(&self) -> AudioEncoding {
        self.default_encoding
    }

    /// Input limit of the provider that would be selected now.
    pub fn max_input_length(&self) -> Option<usize> {
        self.registry
            .get_provider_with_fallback()
            .ok()
            .map(|p| p.metadata().max_input_text_length)
    }

    /// Synthesize with the configured default encoding.
    pub async fn synthesize_with_fallback(
        &self,
        text: &str,
        language: &str,
    ) -> Result<AudioGenerationResult, VoiceError> {
        self.synthesize(text, language, self.default_encoding).await
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<AudioGenerationResult, VoiceError> {
        let provider = self.registry.get_provider_with_fallback()?;
        tracing::debug!(
            provider = provider.name(),
            language,
            %encoding,
            chars = text.chars().count(),
            "Synthesizing speech"
        );

        match provider.synthesize(text, language, encoding).await {
            Ok(result) => {
                tracing::info!(
                    provider = %result.provider,
                    bytes = result.audio.len(),
                    "Speech synthesized"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), kind = e.kind(), "Speech synthesis failed: {}", e);
                Err(e)
            }
        }
    }

    /// Every registered provider in registration order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        let default = self.registry.default_provider_name();
        self.registry
            .providers()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                available: p.validate_configuration(),
                is_default: p.name() == default,
                metadata: p.metadata().clone(),
            })
            .collect()
    }
}
