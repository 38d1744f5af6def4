//! Twilio media stream WebSocket handler
//!
//! Each connection is one call. The socket is split into a reader task that
//! feeds the call's event queue and a writer task that empties the caller
//! outbound channel; the [`RelayOrchestrator`] runs on the handler task
//! between them. When the call ends the writer stops at once and whatever
//! is still queued is discarded.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use futures::stream::SplitSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::core::relay::{CALLER_CHANNEL_CAPACITY, RelayEvent, RelayOrchestrator};
use crate::core::telephony::TwilioOutbound;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB); media frames are a few hundred bytes
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Upper bound on the close handshake once the call is over
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Media stream WebSocket handler
///
/// `GET /media-stream` - upgraded by Twilio after it fetches the
/// `<Connect><Stream>` TwiML.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!("Media stream WebSocket upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state))
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");

    let (mut sender, mut receiver) = socket.split();
    let (caller_tx, caller_rx) = mpsc::channel::<TwilioOutbound>(CALLER_CHANNEL_CAPACITY);

    let relay = RelayOrchestrator::new(
        state.relay_settings.clone(),
        state.model_connector.clone(),
        caller_tx,
    );
    let events = relay.event_sender();

    // Writer: stops as soon as the call closes, discarding anything queued
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let writer = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = shutdown_rx => debug!("Call closed, discarding queued caller messages"),
            _ = write_caller_messages(&mut sender, caller_rx) => {}
        }
        if tokio::time::timeout(CLOSE_FRAME_TIMEOUT, sender.send(Message::Close(None)))
            .await
            .is_err()
        {
            debug!("Timed out sending close frame");
        }
    });

    // Reader: every text frame becomes a caller event
    let reader = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if events
                        .send(RelayEvent::CallerFrame(text.to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(data)) => {
                    debug!(len = data.len(), "Ignoring binary frame");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Media stream WebSocket error: {}", e);
                    break;
                }
            }
        }
        let _ = events.send(RelayEvent::CallerClosed).await;
    });

    relay.run().await;

    let _ = shutdown_tx.send(());
    reader.abort();
    if let Err(e) = writer.await {
        if !e.is_cancelled() {
            error!("Media stream writer task failed: {}", e);
        }
    }

    info!("Client disconnected");
}

/// Serialize queued caller messages onto the socket until the queue closes
/// or the socket fails.
async fn write_caller_messages(
    sender: &mut SplitSink<WebSocket, Message>,
    mut caller_rx: mpsc::Receiver<TwilioOutbound>,
) {
    while let Some(message) = caller_rx.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize outgoing message: {}", e);
                continue;
            }
        };
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            debug!("Failed to send WebSocket message: {}", e);
            return;
        }
    }
}
