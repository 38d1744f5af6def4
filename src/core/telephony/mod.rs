//! Twilio telephony integration.
//!
//! - [`messages`]: Media Streams WebSocket frames
//! - [`twiml`]: connect-stream instruction documents
//! - [`client`]: REST client for originating calls

pub mod client;
pub mod messages;
pub mod twiml;

pub use client::{CallCreated, TWILIO_API_BASE_URL, TwilioClient, TwilioError};
pub use messages::{MarkPayload, MediaPayload, StartPayload, TwilioInbound, TwilioOutbound};
pub use twiml::{MEDIA_STREAM_PATH, connect_stream, media_stream_url};
