//! Mock voice provider: deterministic audio without any vendor account.
//!
//! Stands in when voice is disabled so callers never special-case it, and
//! doubles as a scriptable provider in tests.

use crate::error::{SynthesisFailure, VoiceError};
use crate::metadata::ProviderMetadata;
use crate::provider::{AudioGenerationResult, VoiceProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tale_core::AudioEncoding;

pub const MOCK: &str = "mock";

const MOCK_MAX_INPUT: usize = 10_000;

const MOCK_LANGUAGES: &[&str] = &[
    "en", "ru", "de", "fr", "es", "it", "pt", "pl", "uk", "nl", "tr", "ja", "zh",
];

/// What a synthesis call on the mock does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    #[default]
    Succeed,
    Fail(SynthesisFailure),
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    metadata: ProviderMetadata,
    available: bool,
    behavior: MockBehavior,
    /// Shared between clones so a test can keep a handle after registration.
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::named(MOCK)
    }

    /// A mock registered under another name, for multi-provider scenarios.
    pub fn named(name: &str) -> Self {
        Self {
            metadata: ProviderMetadata::new(
                name,
                false,
                MOCK_MAX_INPUT,
                &AudioEncoding::ALL,
                MOCK_LANGUAGES,
            ),
            available: true,
            behavior: MockBehavior::Succeed,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn failing(self, kind: SynthesisFailure) -> Self {
        self.with_behavior(MockBehavior::Fail(kind))
    }

    pub fn with_max_input_length(mut self, max: usize) -> Self {
        self.metadata.max_input_text_length = max;
        self
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.metadata.supported_languages =
            languages.iter().map(|l| l.to_ascii_lowercase()).collect();
        self
    }

    /// Synthesis calls that got past validation (the "vendor" calls).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic payload: same input, same bytes.
fn synthetic_audio(text: &str, language: &str, encoding: AudioEncoding) -> Vec<u8> {
    format!("MOCK-AUDIO {encoding} {language}\n{text}").into_bytes()
}

#[async_trait]
impl VoiceProvider for MockProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn validate_configuration(&self) -> bool {
        self.available
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<AudioGenerationResult, VoiceError> {
        self.metadata.check(text, language, encoding)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Succeed => Ok(AudioGenerationResult {
                audio: synthetic_audio(text, language, encoding),
                encoding,
                provider: self.metadata.name.clone(),
                characters_billed: Some(text.chars().count() as u64),
            }),
            MockBehavior::Fail(kind) => Err(VoiceError::synthesis(
                &self.metadata.name,
                kind,
                "scripted mock failure",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_synthesize() {
        let provider = MockProvider::new();
        let result = provider
            .synthesize("Once upon a time", "en", AudioEncoding::Mp3)
            .await
            .unwrap();
        assert_eq!(result.provider, "mock");
        assert_eq!(result.encoding, AudioEncoding::Mp3);
        assert_eq!(result.characters_billed, Some(16));
        assert!(!result.audio.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockProvider::new();
        let a = provider.synthesize("Hello", "en", AudioEncoding::Wav).await.unwrap();
        let b = provider.synthesize("Hello", "en", AudioEncoding::Wav).await.unwrap();
        assert_eq!(a.audio, b.audio);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let provider = MockProvider::named("flaky").failing(SynthesisFailure::RateLimited);
        let err = provider
            .synthesize("Hello", "en", AudioEncoding::Mp3)
            .await
            .unwrap_err();
        match err {
            VoiceError::Synthesis { provider, kind, .. } => {
                assert_eq!(provider, "flaky");
                assert_eq!(kind, SynthesisFailure::RateLimited);
            }
            other => panic!("Expected Synthesis error, got {other:?}"),
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_the_call() {
        let provider = MockProvider::new().with_max_input_length(100);
        let text = "a".repeat(101);
        let err = provider
            .synthesize(&text, "en", AudioEncoding::Mp3)
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Validation(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_clones_share_call_counter() {
        let provider = MockProvider::new();
        let handle = provider.clone();
        provider.calls.fetch_add(2, Ordering::SeqCst);
        assert_eq!(handle.calls(), 2);
    }

    #[test]
    fn test_availability_drives_validation() {
        assert!(MockProvider::new().validate_configuration());
        assert!(!MockProvider::new().with_available(false).validate_configuration());
    }
}
