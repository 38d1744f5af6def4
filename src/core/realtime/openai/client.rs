//! OpenAI Realtime API connector.
//!
//! Opens the WebSocket, then hands the socket to a single task that both
//! writes queued [`ClientEvent`]s and forwards inbound frames into the call's
//! event queue.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Headers: `Authorization: Bearer <key>`, `OpenAI-Beta: realtime=v1`
//! - Protocol: WebSocket with JSON events

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, Request, StatusCode, header};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::config::realtime_url;
use super::messages::ClientEvent;
use crate::core::realtime::base::{ModelConnector, RealtimeError, RealtimeResult};
use crate::core::relay::{MODEL_CHANNEL_CAPACITY, RelayEvent, RelaySettings};

type RealtimeSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for the OpenAI Realtime API.
#[derive(Debug, Clone, Default)]
pub struct OpenAIRealtimeConnector;

impl OpenAIRealtimeConnector {
    pub fn new() -> Self {
        Self
    }

    /// Build the upgrade request with authentication headers.
    fn build_request(settings: &RelaySettings) -> RealtimeResult<Request<()>> {
        let url = realtime_url(&settings.realtime_url, &settings.model)
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("realtime url: {e}")))?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", settings.api_key()))
            .map_err(|_| {
                RealtimeError::AuthenticationFailed(
                    "API key contains characters not allowed in a header".to_string(),
                )
            })?;
        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert("openai-beta", HeaderValue::from_static("realtime=v1"));

        Ok(request)
    }
}

fn map_connect_error(err: tungstenite::Error) -> RealtimeError {
    match err {
        tungstenite::Error::Http(response)
            if matches!(
                response.status(),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ) =>
        {
            RealtimeError::AuthenticationFailed(format!(
                "upgrade rejected with {}",
                response.status()
            ))
        }
        other => RealtimeError::ConnectionFailed(other.to_string()),
    }
}

#[async_trait]
impl ModelConnector for OpenAIRealtimeConnector {
    async fn connect(
        &self,
        settings: &RelaySettings,
        events: mpsc::Sender<RelayEvent>,
    ) -> RealtimeResult<mpsc::Sender<ClientEvent>> {
        let request = Self::build_request(settings)?;

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(map_connect_error)?;

        info!(model = %settings.model, "Connected to the OpenAI Realtime API");

        let (tx, rx) = mpsc::channel::<ClientEvent>(MODEL_CHANNEL_CAPACITY);
        tokio::spawn(run_connection(socket, rx, events));
        Ok(tx)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Own the socket until either side goes away.
///
/// The relay releasing its command sender closes the socket quietly; the
/// server closing it, or any socket error, is reported as
/// [`RelayEvent::ModelClosed`].
async fn run_connection(
    socket: RealtimeSocket,
    mut commands: mpsc::Receiver<ClientEvent>,
    events: mpsc::Sender<RelayEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("Model channel released by relay, closing socket");
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                };

                let json = match serde_json::to_string(&command) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(event = command.event_type(), "Failed to serialize event: {}", e);
                        continue;
                    }
                };

                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    error!("Failed to send to the OpenAI Realtime API: {}", e);
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(RelayEvent::ModelFrame(text.to_string())).await.is_err() {
                            // Relay is gone; nothing left to deliver to.
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "OpenAI Realtime API closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Error in the OpenAI WebSocket: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = events.send(RelayEvent::ModelClosed).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_sets_auth_headers() {
        let settings = RelaySettings::new("sk-test");
        let request = OpenAIRealtimeConnector::build_request(&settings).unwrap();

        assert_eq!(
            request.uri().to_string(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01"
        );
        assert_eq!(request.headers()["authorization"], "Bearer sk-test");
        assert_eq!(request.headers()["openai-beta"], "realtime=v1");
    }

    #[test]
    fn test_build_request_rejects_bad_url() {
        let mut settings = RelaySettings::new("sk-test");
        settings.realtime_url = "not a url".to_string();
        assert!(matches!(
            OpenAIRealtimeConnector::build_request(&settings),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_build_request_rejects_header_breaking_key() {
        let settings = RelaySettings::new("sk-test\nInjected: 1");
        assert!(matches!(
            OpenAIRealtimeConnector::build_request(&settings),
            Err(RealtimeError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_reported() {
        let mut settings = RelaySettings::new("sk-test");
        // Port 9 (discard) is essentially never listening on loopback.
        settings.realtime_url = "ws://127.0.0.1:9/v1/realtime".to_string();
        let (events, _rx) = mpsc::channel(8);

        let result = OpenAIRealtimeConnector::new()
            .connect(&settings, events)
            .await;
        assert!(matches!(result, Err(RealtimeError::ConnectionFailed(_))));
    }
}
