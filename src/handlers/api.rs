use axum::response::Json;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check handler
///
/// `GET /` returns `{"status": "OK"}` while the server is up.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}
