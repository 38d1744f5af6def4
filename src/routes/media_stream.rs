//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::core::telephony::MEDIA_STREAM_PATH;
use crate::handlers::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream WebSocket router
///
/// # Endpoint
///
/// `GET /media-stream` - WebSocket upgrade for a Twilio bidirectional media
/// stream
///
/// # Protocol
///
/// Twilio sends JSON control frames (`connected`, `start`, `media`, `mark`,
/// `stop`); the gateway answers with `media`, `mark` and `clear` frames
/// addressed by `streamSid`. Audio is base64 G.711 u-law at 8kHz in both
/// directions.
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
