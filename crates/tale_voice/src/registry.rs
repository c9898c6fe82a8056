//! Provider registry: the registered providers, the default, and the ordered
//! fallback list.
//!
//! Built once at startup and read-only afterwards, so it can be shared across
//! requests behind an `Arc` without locking.

use crate::error::VoiceError;
use crate::provider::{Provider, VoiceProvider};
use crate::providers::elevenlabs::ELEVENLABS;
use crate::providers::mock::MOCK;
use crate::providers::{ElevenLabsProvider, MockProvider};
use tale_core::VoiceServiceConfig;

#[derive(Debug)]
pub struct ProviderRegistry {
    /// Registration order
    providers: Vec<Provider>,
    default_provider: String,
    fallbacks: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    providers: Vec<Provider>,
    default_provider: Option<String>,
    fallbacks: Option<Vec<String>>,
}

impl RegistryBuilder {
    pub fn register(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    pub fn fallbacks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallbacks = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Check names and fill in the defaults.
    ///
    /// Without an explicit default, `mock` is used if registered, otherwise
    /// the first provider. Without explicit fallbacks, every other provider
    /// in registration order.
    pub fn build(self) -> Result<ProviderRegistry, VoiceError> {
        let Self {
            providers,
            default_provider,
            fallbacks,
        } = self;

        if providers.is_empty() {
            return Err(VoiceError::Setup("no voice providers registered".to_string()));
        }

        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.name() == provider.name()) {
                return Err(VoiceError::DuplicateProvider(provider.name().to_string()));
            }
        }
        let known = |name: &str| providers.iter().any(|p| p.name() == name);

        let default_provider = match default_provider {
            Some(name) if known(name.as_str()) => name,
            Some(name) => return Err(VoiceError::ProviderNotFound(name)),
            None if known(MOCK) => MOCK.to_string(),
            None => providers[0].name().to_string(),
        };

        let fallbacks = match fallbacks {
            Some(names) => {
                if let Some(unknown) = names.iter().find(|n| !known(n.as_str())) {
                    return Err(VoiceError::ProviderNotFound(unknown.clone()));
                }
                names
            }
            None => providers
                .iter()
                .map(|p| p.name().to_string())
                .filter(|n| *n != default_provider)
                .collect(),
        };

        Ok(ProviderRegistry {
            providers,
            default_provider,
            fallbacks,
        })
    }
}

impl ProviderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register every compiled-in provider from the voice settings.
    ///
    /// The default is `VOICE_DEFAULT_PROVIDER`, else `elevenlabs` when voice
    /// is active, else `mock`. The mock only validates while voice is
    /// inactive or `allow_mock` is set.
    pub fn from_config(config: &VoiceServiceConfig) -> Result<Self, VoiceError> {
        let active = config.is_active();
        let mock = MockProvider::new().with_available(!active || config.allow_mock);

        let default = config
            .default_provider
            .clone()
            .unwrap_or_else(|| (if active { ELEVENLABS } else { MOCK }).to_string());

        let mut builder = Self::builder()
            .register(ElevenLabsProvider::from_config(config)?)
            .register(mock)
            .default_provider(default);
        if let Some(fallbacks) = &config.fallback_providers {
            builder = builder.fallbacks(fallbacks.clone());
        }

        let registry = builder.build()?;
        tracing::info!(
            default = %registry.default_provider,
            fallbacks = ?registry.fallbacks,
            voice_active = active,
            "Voice provider registry ready"
        );
        Ok(registry)
    }

    pub fn get_provider(&self, name: &str) -> Result<&Provider, VoiceError> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| VoiceError::ProviderNotFound(name.to_string()))
    }

    pub fn default_provider_name(&self) -> &str {
        &self.default_provider
    }

    pub fn fallback_names(&self) -> &[String] {
        &self.fallbacks
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    /// Candidate order: default, then the fallback list, then any other
    /// registered provider in registration order. No name appears twice.
    pub fn selection_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::with_capacity(self.providers.len());
        let candidates = std::iter::once(self.default_provider.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
            .chain(self.providers.iter().map(|p| p.name()));
        for name in candidates {
            if !order.contains(&name) {
                order.push(name);
            }
        }
        order
    }

    /// First provider in [`selection_order`](Self::selection_order) whose
    /// configuration check passes.
    ///
    /// Only `validate_configuration` is consulted here; nothing is
    /// synthesized.
    pub fn get_provider_with_fallback(&self) -> Result<&Provider, VoiceError> {
        let mut tried = Vec::new();
        for name in self.selection_order() {
            let provider = self.get_provider(name)?;
            if provider.validate_configuration() {
                if !tried.is_empty() {
                    tracing::info!(selected = name, skipped = ?tried, "Using fallback voice provider");
                }
                return Ok(provider);
            }
            tracing::debug!(provider = name, "Voice provider not usable, skipping");
            tried.push(name.to_string());
        }
        tracing::error!(checked = ?tried, "No voice provider passed its configuration check");
        Err(VoiceError::ProviderUnavailable { tried })
    }
}
