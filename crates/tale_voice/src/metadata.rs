//! Static capability descriptors for voice providers.

use crate::error::ValidationError;
use serde::Serialize;
use std::collections::BTreeSet;
use tale_core::AudioEncoding;

/// What a provider can do. Fixed when the provider is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    /// Unique registry key
    pub name: String,
    pub supports_streaming: bool,
    /// Limit in characters (Unicode scalar values)
    pub max_input_text_length: usize,
    pub supported_encodings: BTreeSet<AudioEncoding>,
    /// Lowercase language codes, primary subtags (`en`, `ru`)
    pub supported_languages: BTreeSet<String>,
}

impl ProviderMetadata {
    pub fn new(
        name: &str,
        supports_streaming: bool,
        max_input_text_length: usize,
        encodings: &[AudioEncoding],
        languages: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            supports_streaming,
            max_input_text_length,
            supported_encodings: encodings.iter().copied().collect(),
            supported_languages: languages.iter().map(|l| l.to_ascii_lowercase()).collect(),
        }
    }

    pub fn supports_encoding(&self, encoding: AudioEncoding) -> bool {
        self.supported_encodings.contains(&encoding)
    }

    /// Case-insensitive; `en-US` and `en_us` match a declared `en`.
    pub fn supports_language(&self, language: &str) -> bool {
        let normalized = language.trim().to_ascii_lowercase().replace('_', "-");
        if self.supported_languages.contains(&normalized) {
            return true;
        }
        normalized
            .split('-')
            .next()
            .is_some_and(|primary| self.supported_languages.contains(primary))
    }

    /// Reject a request this provider is guaranteed to fail on.
    pub fn check(
        &self,
        text: &str,
        language: &str,
        encoding: AudioEncoding,
    ) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText {
                provider: self.name.clone(),
            });
        }
        let length = text.chars().count();
        if length > self.max_input_text_length {
            return Err(ValidationError::TextTooLong {
                provider: self.name.clone(),
                length,
                max: self.max_input_text_length,
            });
        }
        if !self.supports_language(language) {
            return Err(ValidationError::UnsupportedLanguage {
                provider: self.name.clone(),
                language: language.to_string(),
            });
        }
        if !self.supports_encoding(encoding) {
            return Err(ValidationError::UnsupportedEncoding {
                provider: self.name.clone(),
                encoding,
            });
        }
        Ok(())
    }
}
