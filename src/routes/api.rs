use axum::{
    Router,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, calls};
use crate::state::AppState;
use std::sync::Arc;

/// Create the HTTP API router
///
/// # Endpoints
///
/// - `GET /` - health check
/// - `GET /start-call` - place an outbound call through Twilio
/// - `GET|POST /outgoing-twiml` - TwiML connecting the call to `/media-stream`
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/start-call", get(calls::start_call))
        .route(
            "/outgoing-twiml",
            get(calls::outgoing_twiml).post(calls::outgoing_twiml),
        )
        .layer(TraceLayer::new_for_http())
}
