//! Realtime voice-model channel.
//!
//! # Supported Providers
//!
//! - **OpenAI Realtime API** - full duplex audio over WebSocket with
//!   server-side voice activity detection
//!
//! # Audio Format
//!
//! Telephony audio is G.711 u-law at 8kHz. The model is configured to accept
//! and emit the same format so payloads pass through untouched.

mod base;
pub mod openai;

pub use base::{ModelConnector, RealtimeError, RealtimeResult, SharedModelConnector};
pub use openai::{
    ClientEvent, OPENAI_REALTIME_URL, OpenAIRealtimeConnector, RealtimeAudioFormat,
    RealtimeVoice, ServerEvent, SessionConfig, TurnDetection,
};
