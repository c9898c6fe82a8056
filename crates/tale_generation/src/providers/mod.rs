pub mod mock;
pub mod openrouter;

pub use mock::MockGenerator;
pub use openrouter::OpenRouterClient;
