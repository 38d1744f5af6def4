//! OpenAI Realtime API module.
//!
//! # Supported Voices
//!
//! alloy, ash, ballad, coral, echo, sage, shimmer, verse
//!
//! # Audio Format
//!
//! The relay configures G.711 u-law in both directions so telephony payloads
//! are forwarded without transcoding.

mod client;
mod config;
mod messages;

pub use client::OpenAIRealtimeConnector;
pub use config::{
    DEFAULT_REALTIME_MODEL, Modality, OPENAI_REALTIME_URL, RealtimeAudioFormat, RealtimeVoice,
    realtime_url,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, ServerEvent, SessionConfig,
    TurnDetection,
};
