use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tale_core::{AudioEncoding, Story};
use tale_generation::GeneratedStory;
use tale_voice::{AudioGenerationResult, ProviderStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    /// Falls back to `VOICE_OUTPUT_FORMAT`.
    #[serde(default)]
    pub encoding: Option<AudioEncoding>,
}

/// Synthesized audio, base64 encoded for JSON transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioPayload {
    pub provider: String,
    pub encoding: AudioEncoding,
    pub mime_type: String,
    pub audio_base64: String,
    #[serde(default)]
    pub characters_billed: Option<u64>,
}

impl From<&AudioGenerationResult> for AudioPayload {
    fn from(result: &AudioGenerationResult) -> Self {
        Self {
            provider: result.provider.clone(),
            encoding: result.encoding,
            mime_type: result.encoding.mime_type().to_string(),
            audio_base64: STANDARD.encode(&result.audio),
            characters_billed: result.characters_billed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryResponse {
    pub story: Story,
    #[serde(default)]
    pub audio: Option<AudioPayload>,
    #[serde(default)]
    pub audio_error: Option<String>,
    #[serde(default)]
    pub audio_partial: bool,
}

impl From<GeneratedStory> for StoryResponse {
    fn from(generated: GeneratedStory) -> Self {
        Self {
            audio: generated.audio.as_ref().map(AudioPayload::from),
            story: generated.story,
            audio_error: generated.audio_error,
            audio_partial: generated.audio_partial,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryQuery {
    #[serde(default)]
    pub child_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceHealth {
    pub default_provider: String,
    pub providers: Vec<ProviderStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub voice: VoiceHealth,
}
