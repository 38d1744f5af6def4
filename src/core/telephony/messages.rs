//! Twilio Media Streams WebSocket frames.
//!
//! Inbound (Twilio to us): `connected`, `start`, `media`, `mark`, `stop`,
//! `dtmf`. Anything else parses as [`TwilioInbound::Other`].
//!
//! Outbound (us to Twilio): `media`, `mark`, `clear`, all addressed by
//! `streamSid`.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Inbound
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioInbound {
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },

    Start {
        #[serde(default, rename = "streamSid")]
        stream_sid: Option<String>,
        #[serde(default)]
        start: StartPayload,
    },

    Media {
        #[serde(default, rename = "streamSid")]
        stream_sid: Option<String>,
        media: MediaPayload,
    },

    Mark {
        #[serde(default, rename = "streamSid")]
        stream_sid: Option<String>,
        #[serde(default)]
        mark: Option<MarkPayload>,
    },

    Stop {
        #[serde(default, rename = "streamSid")]
        stream_sid: Option<String>,
    },

    Dtmf {
        #[serde(default)]
        dtmf: Option<DtmfPayload>,
    },

    #[serde(other)]
    Other,
}

impl TwilioInbound {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Start { .. } => "start",
            Self::Media { .. } => "media",
            Self::Mark { .. } => "mark",
            Self::Stop { .. } => "stop",
            Self::Dtmf { .. } => "dtmf",
            Self::Other => "other",
        }
    }
}

/// Body of a `start` frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartPayload {
    pub stream_sid: Option<String>,
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
    pub tracks: Vec<String>,
    pub media_format: Option<MediaFormat>,
    pub custom_parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Body of an inbound `media` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    /// Base64 u-law audio
    pub payload: String,
    /// Milliseconds since the stream started
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: u64,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DtmfPayload {
    pub track: Option<String>,
    pub digit: String,
}

/// Twilio sends media timestamps as decimal strings; accept numbers too.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        Number(u64),
        Text(String),
    }

    match Timestamp::deserialize(deserializer)? {
        Timestamp::Number(value) => Ok(value),
        Timestamp::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid media timestamp '{text}': {e}"))),
    }
}

// =============================================================================
// Outbound
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioOutbound {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },

    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

impl TwilioOutbound {
    /// Play base64 u-law audio on the stream.
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    /// Ask Twilio to echo `name` back once playback reaches this point.
    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkPayload { name: name.into() },
        }
    }

    /// Discard all buffered playback on the stream.
    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}
