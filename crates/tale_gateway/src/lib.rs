pub mod error;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use server::{cors_layer, router, AppState, GatewayServer};
pub use types::{AudioPayload, HealthResponse, SpeechRequest, StoryResponse};
