pub mod elevenlabs;
pub mod mock;

pub use elevenlabs::ElevenLabsProvider;
pub use mock::{MockBehavior, MockProvider};
