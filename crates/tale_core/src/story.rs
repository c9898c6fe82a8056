//! Domain records persisted by the backend: child profiles and stories.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A persistable record keyed by a string id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backing table name.
    const TABLE: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

// ============================================================================
// Language
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ru => "Russian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ru" | "russian" => Ok(Self::Ru),
            other => Err(format!("unsupported story language {other:?}")),
        }
    }
}

// ============================================================================
// Child profile
// ============================================================================

pub const CHILD_AGE_RANGE: std::ops::RangeInclusive<u8> = 1..=17;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ChildProfile {
    pub fn new(name: &str, age: u8) -> Self {
        Self {
            id: new_id(),
            name: name.trim().to_string(),
            age,
            gender: None,
            interests: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_interests(mut self, interests: &[&str]) -> Self {
        self.interests = interests.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("child name must not be empty".to_string());
        }
        if !CHILD_AGE_RANGE.contains(&self.age) {
            return Err(format!(
                "child age {} is outside {}..={}",
                self.age,
                CHILD_AGE_RANGE.start(),
                CHILD_AGE_RANGE.end()
            ));
        }
        Ok(())
    }
}

impl Record for ChildProfile {
    const TABLE: &'static str = "children";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Story
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub content: String,
    pub moral: String,
    pub language: Language,
    #[serde(default)]
    pub child_id: Option<String>,
    pub child_name: String,
    /// Provider that narrated the story, if audio was produced.
    #[serde(default)]
    pub audio_provider: Option<String>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Story {
    const TABLE: &'static str = "stories";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Generation request
// ============================================================================

pub const STORY_LENGTH_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Which child a story is for: a stored profile or one given inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildRef {
    Id(String),
    Profile(ChildProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRequest {
    pub child: ChildRef,
    pub moral: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_story_length")]
    pub story_length_minutes: u8,
    #[serde(default)]
    pub generate_audio: bool,
}

fn default_story_length() -> u8 {
    5
}

impl StoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.moral.trim().is_empty() {
            return Err("moral must not be empty".to_string());
        }
        if !STORY_LENGTH_RANGE.contains(&self.story_length_minutes) {
            return Err(format!(
                "story length {} minutes is outside {}..={}",
                self.story_length_minutes,
                STORY_LENGTH_RANGE.start(),
                STORY_LENGTH_RANGE.end()
            ));
        }
        match &self.child {
            ChildRef::Id(id) if id.trim().is_empty() => Err("child id must not be empty".to_string()),
            ChildRef::Id(_) => Ok(()),
            ChildRef::Profile(profile) => profile.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("russian".parse::<Language>().unwrap(), Language::Ru);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(serde_json::to_string(&Language::Ru).unwrap(), "\"ru\"");
    }

    #[test]
    fn test_child_validation() {
        assert!(ChildProfile::new("Mia", 6).validate().is_ok());
        assert!(ChildProfile::new("  ", 6).validate().is_err());
        assert!(ChildProfile::new("Mia", 0).validate().is_err());
        assert!(ChildProfile::new("Mia", 18).validate().is_err());
    }

    #[test]
    fn test_story_request_defaults_from_json() {
        let json = r#"{"child":{"id":"c-1"},"moral":"kindness"}"#;
        let req: StoryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.child, ChildRef::Id("c-1".into()));
        assert_eq!(req.language, Language::En);
        assert_eq!(req.story_length_minutes, 5);
        assert!(!req.generate_audio);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_inline_profile_gets_id_and_timestamp() {
        let json = r#"{"child":{"profile":{"name":"Ann","age":5}},"moral":"sharing"}"#;
        let req: StoryRequest = serde_json::from_str(json).unwrap();
        match req.child {
            ChildRef::Profile(p) => {
                assert_eq!(p.name, "Ann");
                assert!(!p.id.is_empty());
            }
            other => panic!("Expected inline profile, got {other:?}"),
        }
    }

    #[test]
    fn test_story_request_rejects_bad_input() {
        let mut req = StoryRequest {
            child: ChildRef::Profile(ChildProfile::new("Leo", 7)),
            moral: "honesty".into(),
            language: Language::Ru,
            story_length_minutes: 11,
            generate_audio: true,
        };
        assert!(req.validate().unwrap_err().contains("story length"));
        req.story_length_minutes = 3;
        req.moral = " ".into();
        assert!(req.validate().is_err());
    }
}
