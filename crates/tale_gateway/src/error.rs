use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tale_core::StorageError;
use tale_generation::{GenerationError, StoryError};
use tale_voice::VoiceError;

/// Error returned by every handler, rendered as `{"error": .., "kind": ..}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, kind = self.kind, "{}", self.message);
        } else {
            tracing::debug!(status = %self.status, kind = self.kind, "{}", self.message);
        }
        let body = Json(json!({ "error": self.message, "kind": self.kind }));
        (self.status, body).into_response()
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        let status = match &e {
            VoiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VoiceError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            VoiceError::Synthesis { .. } => StatusCode::BAD_GATEWAY,
            VoiceError::ProviderNotFound(_)
            | VoiceError::DuplicateProvider(_)
            | VoiceError::Setup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.kind(), e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        let status = match &e {
            GenerationError::Setup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, "generation", e.to_string())
    }
}

impl From<StoryError> for ApiError {
    fn from(e: StoryError) -> Self {
        match e {
            StoryError::InvalidRequest(msg) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation", msg)
            }
            StoryError::ChildNotFound(_) => Self::not_found(e.to_string()),
            StoryError::Generation(e) => e.into(),
            StoryError::Storage(e) => e.into(),
        }
    }
}
