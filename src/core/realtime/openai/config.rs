//! OpenAI Realtime API configuration types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model used when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Build the WebSocket URL for a model.
///
/// Any query already present on `base` is kept.
pub fn realtime_url(base: &str, model: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().append_pair("model", model);
    Ok(url)
}

// =============================================================================
// Voices
// =============================================================================

/// Voices accepted by the Realtime API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeVoice {
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl RealtimeVoice {
    pub const ALL: [RealtimeVoice; 8] = [
        Self::Alloy,
        Self::Ash,
        Self::Ballad,
        Self::Coral,
        Self::Echo,
        Self::Sage,
        Self::Shimmer,
        Self::Verse,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }
}

impl FromStr for RealtimeVoice {
    type Err = String;

    /// Strict parse; an unknown voice is a configuration error rather than a
    /// silent fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|voice| voice.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                format!("Unknown voice '{s}'. Supported: {}", known.join(", "))
            })
    }
}

impl fmt::Display for RealtimeVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Audio Formats
// =============================================================================

/// Audio formats for the model's input and output buffers.
///
/// Defaults to G.711 u-law, the format telephony media streams carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeAudioFormat {
    #[serde(rename = "pcm16")]
    Pcm16,
    #[default]
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    #[serde(rename = "g711_alaw")]
    G711Alaw,
}

impl RealtimeAudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16 => "pcm16",
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
        }
    }
}

impl fmt::Display for RealtimeAudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output modalities requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}
