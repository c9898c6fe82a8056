use std::sync::Arc;
use tale_core::VoiceServiceConfig;
use tale_voice::{
    AudioEncoding, MockProvider, ProviderRegistry, SynthesisFailure, ValidationError, VoiceError,
    VoiceProvider, VoiceService,
};

fn service(registry: ProviderRegistry) -> VoiceService {
    VoiceService::new(Arc::new(registry), AudioEncoding::Mp3)
}

#[tokio::test]
async fn test_first_valid_fallback_is_the_only_one_called() {
    let default = MockProvider::named("primary").with_available(false);
    let first = MockProvider::named("secondary").with_available(false);
    let second = MockProvider::named("tertiary");
    let handles = (default.clone(), first.clone(), second.clone());

    let registry = ProviderRegistry::builder()
        .register(default)
        .register(first)
        .register(second)
        .default_provider("primary")
        .fallbacks(["secondary", "tertiary"])
        .build()
        .unwrap();
    let service = service(registry);

    let result = service
        .synthesize_with_fallback("A bear found honey.", "en")
        .await
        .unwrap();

    assert_eq!(result.provider, "tertiary");
    assert_eq!(handles.0.calls(), 0);
    assert_eq!(handles.1.calls(), 0);
    assert_eq!(handles.2.calls(), 1);
}

#[tokio::test]
async fn test_default_valid_skips_fallbacks() {
    let default = MockProvider::named("primary");
    let fallback = MockProvider::named("secondary");
    let (d, f) = (default.clone(), fallback.clone());

    let registry = ProviderRegistry::builder()
        .register(default)
        .register(fallback)
        .default_provider("primary")
        .build()
        .unwrap();
    let result = service(registry)
        .synthesize_with_fallback("Hello", "en")
        .await
        .unwrap();

    assert_eq!(result.provider, "primary");
    assert_eq!(d.calls(), 1);
    assert_eq!(f.calls(), 0);
}

#[tokio::test]
async fn test_no_valid_provider_is_unavailable_and_calls_nothing() {
    let a = MockProvider::named("a").with_available(false);
    let b = MockProvider::named("b").with_available(false);
    let (ha, hb) = (a.clone(), b.clone());

    let registry = ProviderRegistry::builder()
        .register(a)
        .register(b)
        .default_provider("a")
        .build()
        .unwrap();
    let err = service(registry)
        .synthesize_with_fallback("Hello", "en")
        .await
        .unwrap_err();

    match err {
        VoiceError::ProviderUnavailable { tried } => assert_eq!(tried, vec!["a", "b"]),
        other => panic!("Expected ProviderUnavailable, got {other:?}"),
    }
    assert_eq!(ha.calls(), 0);
    assert_eq!(hb.calls(), 0);
}

#[tokio::test]
async fn test_text_over_limit_is_rejected_before_vendor_call() {
    let provider = MockProvider::named("narrow").with_max_input_length(100);
    let handle = provider.clone();
    let registry = ProviderRegistry::builder().register(provider).build().unwrap();
    let service = service(registry);

    let err = service
        .synthesize_with_fallback(&"x".repeat(101), "en")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        VoiceError::Validation(ValidationError::TextTooLong {
            provider: "narrow".into(),
            length: 101,
            max: 100,
        })
    );
    assert_eq!(handle.calls(), 0);

    // Exactly at the limit is fine
    service
        .synthesize_with_fallback(&"x".repeat(100), "en")
        .await
        .unwrap();
    assert_eq!(handle.calls(), 1);
}

#[tokio::test]
async fn test_unsupported_language_is_a_validation_error() {
    let provider = MockProvider::named("en-only").with_languages(&["en"]);
    let registry = ProviderRegistry::builder().register(provider).build().unwrap();
    let err = service(registry)
        .synthesize_with_fallback("Bonjour", "fr")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VoiceError::Validation(ValidationError::UnsupportedLanguage { .. })
    ));
}

#[tokio::test]
async fn test_disabled_voice_is_served_by_mock() {
    let service = VoiceService::from_config(&VoiceServiceConfig::disabled()).unwrap();
    let result = service
        .synthesize_with_fallback("Goodnight, moon.", "en")
        .await
        .unwrap();
    assert_eq!(result.provider, "mock");
    assert!(!result.audio.is_empty());
}

#[tokio::test]
async fn test_mid_call_failure_is_returned_not_retried() {
    let flaky = MockProvider::named("flaky").failing(SynthesisFailure::Upstream);
    let backup = MockProvider::named("backup");
    let (hf, hb) = (flaky.clone(), backup.clone());

    let registry = ProviderRegistry::builder()
        .register(flaky)
        .register(backup)
        .default_provider("flaky")
        .fallbacks(["backup"])
        .build()
        .unwrap();
    let err = service(registry)
        .synthesize("Hello", "en", AudioEncoding::Mp3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VoiceError::Synthesis {
            kind: SynthesisFailure::Upstream,
            ..
        }
    ));
    assert_eq!(hf.calls(), 1);
    assert_eq!(hb.calls(), 0);
}

#[test]
fn test_selection_is_idempotent() {
    let registry = ProviderRegistry::builder()
        .register(MockProvider::named("a").with_available(false))
        .register(MockProvider::named("b"))
        .register(MockProvider::named("c"))
        .default_provider("a")
        .build()
        .unwrap();

    let first = registry.get_provider_with_fallback().unwrap().name().to_string();
    for _ in 0..5 {
        assert_eq!(registry.get_provider_with_fallback().unwrap().name(), first);
    }
    assert_eq!(first, "b");
}

#[tokio::test]
async fn test_explicit_encoding_overrides_default() {
    let service = VoiceService::from_config(&VoiceServiceConfig::disabled()).unwrap();
    let result = service
        .synthesize("Hello", "en", AudioEncoding::Wav)
        .await
        .unwrap();
    assert_eq!(result.encoding, AudioEncoding::Wav);
}
