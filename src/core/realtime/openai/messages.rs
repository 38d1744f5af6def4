//! OpenAI Realtime API WebSocket message types.
//!
//! Only the part of the protocol the relay speaks is modelled here.
//!
//! Client events (sent to server):
//! - session.update - Configure formats, voice, instructions, VAD
//! - input_audio_buffer.append - Append caller audio
//! - conversation.item.create - Add an item (used for the opening greeting)
//! - conversation.item.truncate - Trim an assistant item to what was heard
//! - response.create - Ask the model to respond
//!
//! Server events of interest:
//! - response.audio.delta - Synthesized audio chunk
//! - input_audio_buffer.speech_started - Caller started talking
//!
//! Everything else is parsed leniently for logging or falls into
//! [`ServerEvent::Unknown`].

use serde::{Deserialize, Serialize};

use super::config::{Modality, RealtimeAudioFormat, RealtimeVoice};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent with `session.update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Input audio format
    pub input_audio_format: RealtimeAudioFormat,

    /// Output audio format
    pub output_audio_format: RealtimeAudioFormat,

    /// Voice for audio output
    pub voice: RealtimeVoice,

    /// System instructions for the assistant
    pub instructions: String,

    /// Response modalities
    pub modalities: Vec<Modality>,

    /// Sampling temperature
    pub temperature: f32,
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
}

impl TurnDetection {
    /// Server VAD with the provider's default tuning.
    pub fn server_vad() -> Self {
        TurnDetection::ServerVad {
            threshold: None,
            prefix_padding_ms: None,
            silence_duration_ms: None,
        }
    }
}

// =============================================================================
// Conversation Items
// =============================================================================

/// Conversation item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// A user message carrying a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            item_type: "message".to_string(),
            role: Some("user".to_string()),
            content: vec![ContentPart {
                content_type: "input_text".to_string(),
                text: Some(text.into()),
            }],
        }
    }
}

/// Content part within a conversation item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Append base64 audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },

    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Truncate an assistant item to the audio actually played
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u64,
    },

    /// Ask the model for a response
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Append an already base64-encoded payload, as carried by media streams.
    pub fn audio_append(payload: impl Into<String>) -> Self {
        ClientEvent::InputAudioBufferAppend {
            audio: payload.into(),
        }
    }

    /// Event type name as it appears on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            Self::ConversationItemCreate { .. } => "conversation.item.create",
            Self::ConversationItemTruncate { .. } => "conversation.item.truncate",
            Self::ResponseCreate => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
///
/// Fields are optional or defaulted so that a frame with an unexpected shape
/// still parses as its event type.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: ApiError,
    },

    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: SessionInfo,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: SessionInfo,
    },

    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: u64,
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: u64,
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted { item_id: Option<String> },

    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        response_id: Option<String>,
        item_id: Option<String>,
        /// Base64-encoded audio chunk
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.content_part.done")]
    ContentPartDone {
        response_id: Option<String>,
        item_id: Option<String>,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: ResponseInfo,
    },

    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated {
        #[serde(default)]
        rate_limits: Vec<RateLimit>,
    },

    /// Any event type the relay does not model
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Event type name as it appears on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::SessionCreated { .. } => "session.created",
            Self::SessionUpdated { .. } => "session.updated",
            Self::SpeechStarted { .. } => "input_audio_buffer.speech_started",
            Self::SpeechStopped { .. } => "input_audio_buffer.speech_stopped",
            Self::InputAudioBufferCommitted { .. } => "input_audio_buffer.committed",
            Self::AudioDelta { .. } => "response.audio.delta",
            Self::ContentPartDone { .. } => "response.content_part.done",
            Self::ResponseDone { .. } => "response.done",
            Self::RateLimitsUpdated { .. } => "rate_limits.updated",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: Option<String>,
    pub message: String,
}

/// Session information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub id: String,
    pub model: Option<String>,
    pub voice: Option<String>,
}

/// Response information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseInfo {
    pub id: String,
    pub status: String,
    pub status_details: Option<serde_json::Value>,
}

/// Rate limit information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    pub name: String,
    pub limit: u64,
    pub remaining: u64,
    pub reset_seconds: f64,
}
