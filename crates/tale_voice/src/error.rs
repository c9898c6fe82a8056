use std::fmt;
use tale_core::AudioEncoding;
use thiserror::Error;

/// A request rejected against a provider's declared capabilities, before any
/// network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{provider}: text is empty")]
    EmptyText { provider: String },

    #[error("{provider}: text is {length} characters, limit is {max}")]
    TextTooLong {
        provider: String,
        length: usize,
        max: usize,
    },

    #[error("{provider}: language {language:?} is not supported")]
    UnsupportedLanguage { provider: String, language: String },

    #[error("{provider}: encoding {encoding} is not supported")]
    UnsupportedEncoding {
        provider: String,
        encoding: AudioEncoding,
    },
}

/// Why a live synthesis call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisFailure {
    /// Connection refused, DNS, TLS, reset
    Transport,
    Timeout,
    /// Credentials rejected (401/403) or absent
    Unauthorized,
    /// Quota or rate limit hit (429)
    RateLimited,
    /// Vendor refused the request (other 4xx)
    Rejected,
    /// Vendor-side failure (5xx)
    Upstream,
    /// Success status with an unusable body
    InvalidResponse,
}

impl fmt::Display for SynthesisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "transport error",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Rejected => "request rejected",
            Self::Upstream => "upstream error",
            Self::InvalidResponse => "invalid response",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The one provider we called failed. Surfaced as-is, never retried
    /// elsewhere.
    #[error("voice provider {provider} failed ({kind}): {message}")]
    Synthesis {
        provider: String,
        kind: SynthesisFailure,
        message: String,
    },

    /// No registered provider passed its configuration check.
    #[error("no voice provider available (checked: {})", .tried.join(", "))]
    ProviderUnavailable { tried: Vec<String> },

    #[error("unknown voice provider {0:?}")]
    ProviderNotFound(String),

    #[error("voice provider {0:?} registered twice")]
    DuplicateProvider(String),

    #[error("voice provider setup failed: {0}")]
    Setup(String),
}

impl VoiceError {
    pub fn synthesis(provider: &str, kind: SynthesisFailure, message: impl Into<String>) -> Self {
        Self::Synthesis {
            provider: provider.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Short machine-readable label, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Synthesis { .. } => "synthesis",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::ProviderNotFound(_) => "provider_not_found",
            Self::DuplicateProvider(_) => "duplicate_provider",
            Self::Setup(_) => "setup",
        }
    }
}
