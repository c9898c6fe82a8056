//! Integration tests for the StoryGenerator pipeline.
//!
//! A counting text generator and in-memory repositories let the whole
//! pipeline run without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tale_core::{
    ChildProfile, ChildRef, Language, Repository, Story, StoryRequest, VoiceServiceConfig,
};
use tale_generation::{
    GeneratedText, GenerationError, GenerationParams, MockGenerator, StoryError, StoryGenerator,
    TextGenerator,
};
use tale_storage::InMemoryRepository;
use tale_voice::{
    AudioEncoding, MockProvider, ProviderRegistry, SynthesisFailure, VoiceError, VoiceService,
};

// ============================================================================
// Failing generator
// ============================================================================

struct FailingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    fn default_model(&self) -> &str {
        "none"
    }

    async fn generate(
        &self,
        _system: &str,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<GeneratedText, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Rejected {
            provider: "failing".into(),
            status: 401,
            body: "bad key".into(),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    generator: MockGenerator,
    children: InMemoryRepository<ChildProfile>,
    stories: InMemoryRepository<Story>,
    pipeline: StoryGenerator,
}

fn harness_with_voice(voice: VoiceService) -> Harness {
    let generator = MockGenerator::with_replies(["# The Sleepy Dragon\n\nOnce upon a time a dragon learned to share."]);
    let children = InMemoryRepository::new();
    let stories = InMemoryRepository::new();
    let pipeline = StoryGenerator::new(
        Arc::new(generator.clone()),
        voice,
        Arc::new(children.clone()),
        Arc::new(stories.clone()),
        GenerationParams::default(),
    );
    Harness {
        generator,
        children,
        stories,
        pipeline,
    }
}

fn harness() -> Harness {
    harness_with_voice(VoiceService::from_config(&VoiceServiceConfig::disabled()).unwrap())
}

fn request(child: ChildRef, generate_audio: bool) -> StoryRequest {
    StoryRequest {
        child,
        moral: "sharing".to_string(),
        language: Language::En,
        story_length_minutes: 3,
        generate_audio,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_generates_and_saves_story_for_stored_child() {
    let h = harness();
    let child = ChildProfile::new("Mia", 6);
    h.children.save(&child).await.unwrap();

    let out = h
        .pipeline
        .generate(&request(ChildRef::Id(child.id.clone()), false))
        .await
        .unwrap();

    assert_eq!(out.story.title, "The Sleepy Dragon");
    assert_eq!(out.story.content, "Once upon a time a dragon learned to share.");
    assert_eq!(out.story.child_id.as_deref(), Some(child.id.as_str()));
    assert_eq!(out.story.child_name, "Mia");
    assert!(out.audio.is_none());
    assert!(out.audio_error.is_none());
    assert_eq!(h.generator.calls(), 1);
    assert!(h.generator.last_prompt().unwrap().contains("Mia"));

    let stored = h.stories.find_by_id(&out.story.id).await.unwrap();
    assert_eq!(stored, Some(out.story));
}

#[tokio::test]
async fn test_inline_child_is_saved() {
    let h = harness();
    let child = ChildProfile::new("Lev", 8);
    let out = h
        .pipeline
        .generate(&request(ChildRef::Profile(child.clone()), false))
        .await
        .unwrap();

    assert_eq!(out.story.child_name, "Lev");
    assert_eq!(h.children.find_by_id(&child.id).await.unwrap(), Some(child));
}

#[tokio::test]
async fn test_unknown_child_stops_before_generation() {
    let h = harness();
    let err = h
        .pipeline
        .generate(&request(ChildRef::Id("ghost".into()), false))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::ChildNotFound(id) if id == "ghost"));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let h = harness();
    let mut req = request(ChildRef::Profile(ChildProfile::new("Mia", 6)), false);
    req.story_length_minutes = 42;
    assert!(matches!(
        h.pipeline.generate(&req).await,
        Err(StoryError::InvalidRequest(_))
    ));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_narration_with_mock_voice() {
    let h = harness();
    let out = h
        .pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap();

    let audio = out.audio.expect("audio");
    assert_eq!(audio.provider, "mock");
    assert_eq!(audio.encoding, AudioEncoding::Mp3);
    assert_eq!(out.story.audio_provider.as_deref(), Some("mock"));
    assert!(out.audio_error.is_none());
}

#[tokio::test]
async fn test_voice_failure_degrades_to_text_only() {
    let flaky = MockProvider::named("flaky").failing(SynthesisFailure::RateLimited);
    let handle = flaky.clone();
    let registry = ProviderRegistry::builder().register(flaky).build().unwrap();
    let h = harness_with_voice(VoiceService::new(Arc::new(registry), AudioEncoding::Mp3));

    let out = h
        .pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap();

    assert!(out.audio.is_none());
    assert!(out.audio_error.unwrap().contains("flaky"));
    assert_eq!(out.story.audio_provider, None);
    assert_eq!(handle.calls(), 1);
    assert_eq!(h.stories.len().await, 1);
}

#[tokio::test]
async fn test_no_voice_provider_degrades_to_text_only() {
    let registry = ProviderRegistry::builder()
        .register(MockProvider::new().with_available(false))
        .build()
        .unwrap();
    let h = harness_with_voice(VoiceService::new(Arc::new(registry), AudioEncoding::Mp3));

    let out = h
        .pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap();
    let expected = VoiceError::ProviderUnavailable {
        tried: vec!["mock".into()],
    }
    .to_string();
    assert_eq!(out.audio_error.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_generation_failure_saves_nothing() {
    let failing = Arc::new(FailingGenerator {
        calls: AtomicUsize::new(0),
    });
    let stories = InMemoryRepository::<Story>::new();
    let pipeline = StoryGenerator::new(
        failing.clone(),
        VoiceService::from_config(&VoiceServiceConfig::disabled()).unwrap(),
        Arc::new(InMemoryRepository::<ChildProfile>::new()),
        Arc::new(stories.clone()),
        GenerationParams::default(),
    );

    let err = pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::Generation(GenerationError::Rejected { status: 401, .. })));
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert!(stories.is_empty().await);
}

#[tokio::test]
async fn test_untitled_text_gets_default_title() {
    let generator = MockGenerator::with_replies(["A single paragraph story."]);
    let pipeline = StoryGenerator::new(
        Arc::new(generator),
        VoiceService::from_config(&VoiceServiceConfig::disabled()).unwrap(),
        Arc::new(InMemoryRepository::<ChildProfile>::new()),
        Arc::new(InMemoryRepository::<Story>::new()),
        GenerationParams::default(),
    );
    let out = pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Ann", 4)), false))
        .await
        .unwrap();
    assert_eq!(out.story.title, "Ann and the lesson of sharing");
    assert_eq!(out.story.content, "A single paragraph story.");
}

#[tokio::test]
async fn test_long_story_is_narrated_up_to_voice_limit() {
    let narrator = MockProvider::named("short").with_max_input_length(60);
    let handle = narrator.clone();
    let registry = ProviderRegistry::builder().register(narrator).build().unwrap();
    let generator = MockGenerator::with_replies([
        "The Long Night\n\nThe fox counted stars. The owl counted moons. The bear counted nothing and slept.",
    ]);
    let pipeline = StoryGenerator::new(
        Arc::new(generator),
        VoiceService::new(Arc::new(registry), AudioEncoding::Mp3),
        Arc::new(InMemoryRepository::<ChildProfile>::new()),
        Arc::new(InMemoryRepository::<Story>::new()),
        GenerationParams::default(),
    );

    let out = pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap();

    let audio = out.audio.expect("audio");
    assert!(out.audio_partial);
    assert!(out.audio_error.is_none());
    assert_eq!(audio.characters_billed, Some("The fox counted stars. The owl counted moons.".len() as u64));
    assert!(out.story.content.ends_with("slept."));
    assert_eq!(handle.calls(), 1);
}

#[tokio::test]
async fn test_short_story_is_narrated_in_full() {
    let h = harness();
    let out = h
        .pipeline
        .generate(&request(ChildRef::Profile(ChildProfile::new("Mia", 6)), true))
        .await
        .unwrap();
    assert!(!out.audio_partial);
    assert_eq!(
        out.audio.unwrap().characters_billed,
        Some(out.story.content.chars().count() as u64)
    );
}
