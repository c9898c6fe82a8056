//! Story pipeline: child lookup, prompt, text, optional narration, storage.
//!
//! Narration is best effort. Any voice failure leaves a text-only story with
//! the reason recorded in [`GeneratedStory::audio_error`].

use crate::llm::{GenerationError, GenerationParams, TextGenerator};
use crate::prompts::{narration_excerpt, split_title, StoryPrompt};
use chrono::Utc;
use std::sync::Arc;
use tale_core::{ChildProfile, ChildRef, Repository, StorageError, Story, StoryRequest};
use tale_voice::{AudioGenerationResult, VoiceService};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("invalid story request: {0}")]
    InvalidRequest(String),

    #[error("child {0} not found")]
    ChildNotFound(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub story: Story,
    pub audio: Option<AudioGenerationResult>,
    /// Why narration was skipped, when it was requested but failed.
    pub audio_error: Option<String>,
    /// Audio covers only the opening of the story; the full text exceeded
    /// the voice provider's input limit.
    pub audio_partial: bool,
}

#[derive(Clone)]
pub struct StoryGenerator {
    generator: Arc<dyn TextGenerator>,
    voice: VoiceService,
    children: Arc<dyn Repository<ChildProfile>>,
    stories: Arc<dyn Repository<Story>>,
    params: GenerationParams,
}

impl StoryGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        voice: VoiceService,
        children: Arc<dyn Repository<ChildProfile>>,
        stories: Arc<dyn Repository<Story>>,
        params: GenerationParams,
    ) -> Self {
        Self {
            generator,
            voice,
            children,
            stories,
            params,
        }
    }

    pub fn voice(&self) -> &VoiceService {
        &self.voice
    }

    /// Stored profiles are looked up; inline ones are saved first so the
    /// story can reference them.
    async fn resolve_child(&self, child: &ChildRef) -> Result<ChildProfile, StoryError> {
        match child {
            ChildRef::Id(id) => self
                .children
                .find_by_id(id)
                .await?
                .ok_or_else(|| StoryError::ChildNotFound(id.clone())),
            ChildRef::Profile(profile) => Ok(self.children.save(profile).await?),
        }
    }

    #[tracing::instrument(skip(self, request), fields(language = request.language.code()))]
    pub async fn generate(&self, request: &StoryRequest) -> Result<GeneratedStory, StoryError> {
        request.validate().map_err(StoryError::InvalidRequest)?;

        let child = self.resolve_child(&request.child).await?;
        let prompt = StoryPrompt {
            child: &child,
            moral: request.moral.trim(),
            language: request.language,
            minutes: request.story_length_minutes,
        };

        let generated = self
            .generator
            .generate(&prompt.system(), &prompt.user(), &self.params)
            .await?;
        tracing::info!(
            child = %child.id,
            model = %generated.model,
            words = generated.text.split_whitespace().count(),
            "Story text generated"
        );

        let (title, content) = split_title(&generated.text);
        let title = title.unwrap_or_else(|| default_title(&request.moral, &child.name));

        let (audio, audio_error, audio_partial) = if request.generate_audio {
            let (narration, partial) = match self.voice.max_input_length() {
                Some(limit) => narration_excerpt(&content, limit),
                None => (content.as_str(), false),
            };
            if partial {
                tracing::info!(
                    chars = content.chars().count(),
                    narrated = narration.chars().count(),
                    "Story exceeds voice input limit, narrating the opening only"
                );
            }
            match self
                .voice
                .synthesize_with_fallback(narration, request.language.code())
                .await
            {
                Ok(audio) => (Some(audio), None, partial),
                Err(e) => {
                    tracing::warn!(kind = e.kind(), "Narration failed, returning text only: {}", e);
                    (None, Some(e.to_string()), false)
                }
            }
        } else {
            (None, None, false)
        };

        let story = Story {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            moral: request.moral.trim().to_string(),
            language: request.language,
            child_id: Some(child.id.clone()),
            child_name: child.name.clone(),
            audio_provider: audio.as_ref().map(|a| a.provider.clone()),
            model_used: generated.model,
            created_at: Utc::now(),
        };
        let story = self.stories.save(&story).await?;

        Ok(GeneratedStory {
            story,
            audio,
            audio_error,
            audio_partial,
        })
    }
}

fn default_title(moral: &str, child_name: &str) -> String {
    format!("{} and the lesson of {}", child_name, moral.trim())
}
