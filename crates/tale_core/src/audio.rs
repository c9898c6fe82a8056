//! Audio encodings shared by settings and the voice providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    Wav,
    OggOpus,
    /// Raw 16-bit little-endian PCM
    Pcm,
}

impl AudioEncoding {
    pub const ALL: [AudioEncoding; 4] = [Self::Mp3, Self::Wav, Self::OggOpus, Self::Pcm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::OggOpus => "ogg_opus",
            Self::Pcm => "pcm",
        }
    }

    /// Get the MIME type for this encoding
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::OggOpus => "audio/ogg",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::OggOpus => "ogg",
            Self::Pcm => "pcm",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" | "mpeg" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "ogg" | "opus" | "ogg_opus" => Ok(Self::OggOpus),
            "pcm" | "linear16" => Ok(Self::Pcm),
            other => Err(format!(
                "unsupported audio encoding {other:?} (expected mp3, wav, ogg_opus or pcm)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("MP3".parse::<AudioEncoding>().unwrap(), AudioEncoding::Mp3);
        assert_eq!("opus".parse::<AudioEncoding>().unwrap(), AudioEncoding::OggOpus);
        assert_eq!("linear16".parse::<AudioEncoding>().unwrap(), AudioEncoding::Pcm);
        assert!("flac".parse::<AudioEncoding>().is_err());
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(AudioEncoding::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioEncoding::OggOpus.file_extension(), "ogg");
        assert_eq!(AudioEncoding::default(), AudioEncoding::Mp3);
    }
}
