//! Story text generation for tale-generator: the LLM seam, its HTTP client
//! with retry, prompt assembly and the story pipeline.

pub mod llm;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod story;

pub use llm::{GeneratedText, GenerationError, GenerationParams, TextGenerator};
pub use providers::{MockGenerator, OpenRouterClient};
pub use retry::RetryConfig;
pub use story::{GeneratedStory, StoryError, StoryGenerator};
