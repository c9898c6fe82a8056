//! Voice synthesis for tale-generator.
//!
//! A fixed set of providers is registered at startup; the [`VoiceService`]
//! picks the first one whose configuration checks out and calls it once.

pub mod error;
pub mod metadata;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod service;

pub use error::{SynthesisFailure, ValidationError, VoiceError};
pub use metadata::ProviderMetadata;
pub use provider::{AudioGenerationResult, Provider, VoiceProvider};
pub use providers::{ElevenLabsProvider, MockBehavior, MockProvider};
pub use registry::{ProviderRegistry, RegistryBuilder};
pub use service::{ProviderStatus, VoiceService};
pub use tale_core::AudioEncoding;
