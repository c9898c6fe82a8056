use thiserror::Error;

/// A setting is missing or fails type/range validation.
///
/// Always fatal at startup: the process must not run half-configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {field}")]
    Missing { field: &'static str },

    #[error("invalid value {value:?} for {field}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Name of the environment variable at fault.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } => field,
        }
    }

    pub(crate) fn invalid(field: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure reported by a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),

    #[error("storage backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode stored record: {0}")]
    Decode(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
