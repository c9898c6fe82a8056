use crate::audio::AudioEncoding;
use crate::error::ConfigError;
use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// ============================================================================
// Process-wide handle
// ============================================================================

static SETTINGS: ArcSwapOption<Settings> = ArcSwapOption::const_empty();

/// Return the process-wide settings, building them from the environment on
/// first use.
///
/// Reads are lock-free. If two callers race on the first build, the first
/// stored instance wins and both get the same `Arc`.
pub fn get_settings() -> Result<Arc<Settings>, ConfigError> {
    if let Some(settings) = SETTINGS.load_full() {
        return Ok(settings);
    }

    let fresh = Arc::new(Settings::from_env()?);
    let previous = SETTINGS.compare_and_swap(&None::<Arc<Settings>>, Some(Arc::clone(&fresh)));
    match &*previous {
        Some(existing) => Ok(Arc::clone(existing)),
        None => {
            tracing::debug!(environment = %fresh.app.environment, "Settings initialized");
            Ok(fresh)
        }
    }
}

/// Drop the process-wide settings so the next `get_settings()` rebuilds them.
///
/// Test-only. Not safe to call while requests are in flight.
#[cfg(test)]
pub fn reset_settings() {
    SETTINGS.store(None);
}

// ============================================================================
// Top-level settings
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub ai: AiServiceConfig,
    pub voice: VoiceServiceConfig,
    pub app: ApplicationConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Sub-configs are
    /// validated in declaration order; the first failure is returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: DatabaseConfig::from_lookup(&lookup)?,
            ai: AiServiceConfig::from_lookup(&lookup)?,
            voice: VoiceServiceConfig::from_lookup(&lookup)?,
            app: ApplicationConfig::from_lookup(&lookup)?,
            logging: LoggingConfig::from_lookup(&lookup)?,
        })
    }
}

// ============================================================================
// Variable access helpers
// ============================================================================

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> Vars<'a> {
    fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Trimmed value; empty counts as absent.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing { field: key })
    }

    fn secret(&self, key: &'static str) -> Result<SecretString, ConfigError> {
        self.required(key).map(SecretString::from)
    }

    fn optional_secret(&self, key: &str) -> Option<SecretString> {
        self.get(key).map(SecretString::from)
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(key, raw.clone(), e)),
        }
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid(key, raw.clone(), "expected a boolean")),
        }
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| split_list(&raw))
    }

    fn seconds(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parse_or(key, default)?;
        if secs == 0 {
            return Err(ConfigError::invalid(key, "0", "must be greater than zero"));
        }
        Ok(Duration::from_secs(secs))
    }

    fn http_url(&self, key: &'static str, raw: String) -> Result<Url, ConfigError> {
        let url = Url::parse(&raw).map_err(|e| ConfigError::invalid(key, raw.clone(), e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(key, raw, "expected an http(s) URL"));
        }
        Ok(url)
    }
}

/// Accepts true/false, 1/0, yes/no, on/off (case-insensitive).
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Database
// ============================================================================

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Base URL of the hosted Postgres REST endpoint.
    pub url: Url,
    pub key: SecretString,
    pub schema: String,
    pub timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);
        let raw_url = vars.required("DATABASE_URL")?;
        Ok(Self {
            url: vars.http_url("DATABASE_URL", raw_url)?,
            key: vars.secret("DATABASE_KEY")?,
            schema: vars.string_or("DATABASE_SCHEMA", "public"),
            timeout: vars.seconds("DATABASE_TIMEOUT", 30)?,
        })
    }
}

// ============================================================================
// AI text service
// ============================================================================

pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

#[derive(Debug, Clone)]
pub struct AiServiceConfig {
    pub api_key: SecretString,
    pub base_url: Url,
    pub default_model: String,
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl AiServiceConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);

        let api_key = vars.secret("AI_API_KEY")?;

        let base_url = vars.string_or("AI_BASE_URL", "https://openrouter.ai/api/v1");
        let base_url = vars.http_url("AI_BASE_URL", base_url)?;

        let max_tokens: u32 = vars.parse_or("AI_MAX_TOKENS", 1000)?;
        if max_tokens == 0 {
            return Err(ConfigError::invalid("AI_MAX_TOKENS", "0", "must be greater than zero"));
        }

        let temperature: f32 = vars.parse_or("AI_TEMPERATURE", 0.7)?;
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(ConfigError::invalid(
                "AI_TEMPERATURE",
                temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }

        let retry_delay: f64 = vars.parse_or("AI_RETRY_DELAY", 1.0)?;
        if !retry_delay.is_finite() || retry_delay < 0.0 {
            return Err(ConfigError::invalid(
                "AI_RETRY_DELAY",
                retry_delay.to_string(),
                "must be a non-negative number of seconds",
            ));
        }

        Ok(Self {
            api_key,
            base_url,
            default_model: vars.string_or("AI_MODEL", "openai/gpt-4o-mini"),
            max_tokens,
            temperature,
            max_retries: vars.parse_or("AI_MAX_RETRIES", 3)?,
            retry_delay: Duration::from_secs_f64(retry_delay),
            timeout: vars.seconds("AI_TIMEOUT", 60)?,
        })
    }
}

// ============================================================================
// Voice service
// ============================================================================

#[derive(Debug, Clone)]
pub struct VoiceServiceConfig {
    /// Absent key means the real providers are disabled.
    pub api_key: Option<SecretString>,
    pub enabled: bool,
    pub default_provider: Option<String>,
    pub fallback_providers: Option<Vec<String>>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: Url,
    /// Per-call timeout for vendor requests.
    pub timeout: Duration,
    pub output_format: AudioEncoding,
    /// Let the mock provider stand in while real voice is active.
    pub allow_mock: bool,
}

impl VoiceServiceConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);
        let base_url = vars.string_or("VOICE_BASE_URL", "https://api.elevenlabs.io");
        Ok(Self {
            api_key: vars.optional_secret("VOICE_API_KEY"),
            enabled: vars.flag("VOICE_ENABLED", true)?,
            default_provider: vars.get("VOICE_DEFAULT_PROVIDER").map(|p| p.to_ascii_lowercase()),
            fallback_providers: vars
                .list("VOICE_FALLBACK_PROVIDERS")
                .map(|names| names.into_iter().map(|n| n.to_ascii_lowercase()).collect()),
            voice_id: vars.string_or("VOICE_ID", "21m00Tcm4TlvDq8ikWAM"),
            model_id: vars.string_or("VOICE_MODEL", "eleven_multilingual_v2"),
            base_url: vars.http_url("VOICE_BASE_URL", base_url)?,
            timeout: vars.seconds("VOICE_TIMEOUT", 60)?,
            output_format: vars.parse_or("VOICE_OUTPUT_FORMAT", AudioEncoding::Mp3)?,
            allow_mock: vars.flag("VOICE_ALLOW_MOCK", false)?,
        })
    }

    /// Voice is live only when switched on and a key is present.
    pub fn is_active(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_ref()
                .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// A config with voice switched off, for tests and local runs.
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            enabled: false,
            default_provider: None,
            fallback_providers: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            base_url: Url::parse("https://api.elevenlabs.io").expect("static URL"),
            timeout: Duration::from_secs(60),
            output_format: AudioEncoding::Mp3,
            allow_mock: false,
        }
    }
}

// ============================================================================
// Application
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err("expected development, staging or production".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    /// `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl ApplicationConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);
        Ok(Self {
            environment: vars.parse_or("APP_ENV", Environment::Development)?,
            host: vars.string_or("APP_HOST", "0.0.0.0"),
            port: vars.parse_or("APP_PORT", 8000)?,
            debug: vars.flag("APP_DEBUG", false)?,
            cors_origins: vars
                .list("APP_CORS_ORIGINS")
                .unwrap_or_else(|| vec!["*".to_string()]),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" => Ok(Self::Error),
            _ => Err("expected trace, debug, info, warn or error".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Text,
    Compact,
    /// Structured JSON, one object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "full" | "pretty" => Ok(Self::Text),
            "compact" => Ok(Self::Compact),
            "json" | "structured" => Ok(Self::Json),
            _ => Err("expected text, compact or json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(&lookup);
        let mut format = vars.parse_or("LOG_FORMAT", LogFormat::Text)?;
        if vars.flag("LOG_JSON", false)? {
            format = LogFormat::Json;
        }
        Ok(Self {
            level: vars.parse_or("LOG_LEVEL", LogLevel::Info)?,
            format,
            file: vars.get("LOG_FILE").map(PathBuf::from),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
