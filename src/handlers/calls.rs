//! Call origination and TwiML handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::telephony::{connect_stream, media_stream_url};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Response for a successfully placed call
#[derive(Debug, Serialize)]
pub struct StartCallResponse {
    pub message: &'static str,
    #[serde(rename = "callSid")]
    pub call_sid: String,
}

/// Place an outbound call to the configured number.
///
/// `GET /start-call`
///
/// Twilio dials `OUTGOING_PHONE_NUMBER` from `TWILIO_PHONE_NUMBER` and, once
/// answered, fetches `{public_url}/outgoing-twiml` for instructions.
///
/// # Responses
/// - `200 {"message": "Call initiated successfully", "callSid": ...}`
/// - `500 {"message": "Failed to initiate call", "error": ...}`
/// - `503` when Twilio or the public URL is not configured
pub async fn start_call(State(state): State<Arc<AppState>>) -> AppResult<Json<StartCallResponse>> {
    let twilio = state
        .twilio
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Twilio is not configured".to_string()))?;

    let twiml_url = state.config.outgoing_twiml_url().ok_or_else(|| {
        AppError::NotConfigured("PUBLIC_URL (or NGROK_SERVER_URL) is not configured".to_string())
    })?;

    let call = twilio.create_call(&twiml_url).await?;

    Ok(Json(StartCallResponse {
        message: "Call initiated successfully",
        call_sid: call.sid,
    }))
}

/// TwiML telling Twilio to stream the call audio to `/media-stream`.
///
/// `POST /outgoing-twiml` (also `GET`)
///
/// The stream URL uses the request's Host header, falling back to the host
/// of the configured public URL.
pub async fn outgoing_twiml(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            debug!("Request has no Host header, using public URL");
            state.config.public_host()
        })
        .ok_or_else(|| AppError::BadRequest("Missing Host header".to_string()))?;

    let stream_url = media_stream_url(&host);
    info!(stream_url = %stream_url, "Serving outgoing TwiML");

    Ok(([(header::CONTENT_TYPE, "text/xml")], connect_stream(&stream_url)).into_response())
}
