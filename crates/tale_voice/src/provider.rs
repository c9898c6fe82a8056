//! Voice provider trait and the closed set of provider variants.

use crate::error::VoiceError;
use crate::metadata::ProviderMetadata;
use crate::providers::{ElevenLabsProvider, MockProvider};
use async_trait::async_trait;
use serde::Serialize;
use tale_core::AudioEncoding;

/// Audio produced by a successful synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioGenerationResult {
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
    /// Name of the provider that produced the audio
    pub provider: String,
    /// Characters the vendor billed, when it reports them
    pub characters_billed: Option<u64>,
}

/// Speech synthesis backed by one vendor (or the mock).
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Static capabilities of this provider
    fn metadata(&self) -> &ProviderMetadata;

    /// Registry key
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Whether the provider has everything it needs right now.
    ///
    /// Local check only: no network access, no side effects.
    fn validate_configuration(&self) -> bool;

    /// Synthesize `text` in `language`.
    ///
    /// Requests outside [`ProviderMetadata`] fail with
    /// [`VoiceError::Validation`] before any network call.
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<AudioGenerationResult, VoiceError>;
}

/// Every provider compiled into the service.
///
/// Adding a vendor means adding a variant here and registering it in
/// [`ProviderRegistry::from_config`](crate::registry::ProviderRegistry::from_config).
#[derive(Debug, Clone)]
pub enum Provider {
    ElevenLabs(ElevenLabsProvider),
    Mock(MockProvider),
}

impl From<ElevenLabsProvider> for Provider {
    fn from(p: ElevenLabsProvider) -> Self {
        Self::ElevenLabs(p)
    }
}

impl From<MockProvider> for Provider {
    fn from(p: MockProvider) -> Self {
        Self::Mock(p)
    }
}

#[async_trait]
impl VoiceProvider for Provider {
    fn metadata(&self) -> &ProviderMetadata {
        match self {
            Self::ElevenLabs(p) => p.metadata(),
            Self::Mock(p) => p.metadata(),
        }
    }

    fn validate_configuration(&self) -> bool {
        match self {
            Self::ElevenLabs(p) => p.validate_configuration(),
            Self::Mock(p) => p.validate_configuration(),
        }
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<AudioGenerationResult, VoiceError> {
        match self {
            Self::ElevenLabs(p) => p.synthesize(text, language, encoding).await,
            Self::Mock(p) => p.synthesize(text, language, encoding).await,
        }
    }
}
