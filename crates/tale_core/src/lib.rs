//! Shared foundation of the tale-generator backend: typed settings, domain
//! records, error types and the persistence seam.

pub mod audio;
pub mod config;
pub mod error;
pub mod repository;
pub mod story;

pub use audio::AudioEncoding;
#[cfg(test)]
pub use config::reset_settings;
pub use config::{
    get_settings, AiServiceConfig, ApplicationConfig, DatabaseConfig, Environment, LogFormat,
    LogLevel, LoggingConfig, Settings, VoiceServiceConfig,
};
pub use error::{ConfigError, StorageError};
pub use repository::Repository;
pub use story::{ChildProfile, ChildRef, Language, Record, Story, StoryRequest};
