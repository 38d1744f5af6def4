//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `calls` - Outbound call origination and TwiML
//! - `media_stream` - Twilio media stream WebSocket

pub mod api;
pub mod calls;
pub mod media_stream;

pub use media_stream::media_stream_handler;
