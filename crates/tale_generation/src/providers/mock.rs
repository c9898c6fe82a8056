//! Mock text generator: deterministic stories for tests and keyless runs.

use crate::llm::{GeneratedText, GenerationError, GenerationParams, TextGenerator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MOCK_MODEL: &str = "mock-storyteller";

#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    /// Scripted replies, consumed front to back. Empty means "echo a story".
    replies: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::default();
        if let Ok(mut queue) = generator.replies.lock() {
            queue.extend(replies.into_iter().map(Into::into));
        }
        generator
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

fn default_story(prompt: &str) -> String {
    let topic = prompt
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("a quiet evening")
        .trim();
    format!(
        "The Little Lantern\n\nOnce upon a time there was a small lantern that wanted to help. \
         It listened to this wish: {topic}. Night after night it glowed a little brighter, \
         and everyone in the village slept well. The end."
    )
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        MOCK_MODEL
    }

    async fn generate(
        &self,
        _system: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedText, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        let scripted = match self.replies.lock() {
            Ok(mut queue) if !queue.is_empty() => Some(queue.remove(0)),
            _ => None,
        };
        let text = scripted.unwrap_or_else(|| default_story(prompt));

        Ok(GeneratedText {
            model: params.model.clone().unwrap_or_else(|| MOCK_MODEL.to_string()),
            prompt_tokens: Some(prompt.split_whitespace().count() as u32),
            completion_tokens: Some(text.split_whitespace().count() as u32),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_default() {
        let generator = MockGenerator::with_replies(["First\n\nBody"]);
        let params = GenerationParams::default();

        let a = generator.generate("s", "about sharing", &params).await.unwrap();
        assert_eq!(a.text, "First\n\nBody");
        assert_eq!(a.model, MOCK_MODEL);

        let b = generator.generate("s", "about sharing", &params).await.unwrap();
        assert!(b.text.contains("about sharing"));
        assert_eq!(generator.calls(), 2);
        assert_eq!(generator.last_prompt().as_deref(), Some("about sharing"));
    }
}
