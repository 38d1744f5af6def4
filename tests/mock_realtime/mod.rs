//! Mock realtime model server.
//!
//! Accepts a single WebSocket connection, records the upgrade headers, and
//! exposes what the client sent as parsed JSON. Frames pushed through
//! [`MockRealtime::send`] are written to the client.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// Default wait for any single expected frame.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Headers captured from the upgrade request.
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

/// Handle to a running mock server.
pub struct MockRealtime {
    pub addr: SocketAddr,
    upgrade: Option<oneshot::Receiver<UpgradeRequest>>,
    received: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Message>,
    closed: Option<oneshot::Receiver<()>>,
}

impl MockRealtime {
    /// Start a server that accepts one connection.
    pub async fn start() -> Self {
        Self::start_with_status(None).await
    }

    /// Start a server that rejects the upgrade with `status`.
    pub async fn rejecting(status: StatusCode) -> Self {
        Self::start_with_status(Some(status)).await
    }

    async fn start_with_status(reject: Option<StatusCode>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (upgrade_tx, upgrade_rx) = oneshot::channel();
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (closed_tx, closed_rx) = oneshot::channel();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };

            let callback = move |req: &Request, resp: Response| {
                let header = |name: &str| {
                    req.headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned)
                };
                let _ = upgrade_tx.send(UpgradeRequest {
                    path_and_query: req
                        .uri()
                        .path_and_query()
                        .map(|p| p.to_string())
                        .unwrap_or_default(),
                    authorization: header("authorization"),
                    openai_beta: header("openai-beta"),
                });

                match reject {
                    Some(status) => {
                        let mut error = ErrorResponse::new(Some("rejected".to_string()));
                        *error.status_mut() = status;
                        Err(error)
                    }
                    None => Ok(resp),
                }
            };

            let Ok(ws_stream) = accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(value) = serde_json::from_str::<Value>(text.as_str()) {
                                let _ = received_tx.send(value);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => {}
                    },
                    message = outbound_rx.recv() => match message {
                        Some(message) => {
                            let is_close = matches!(message, Message::Close(_));
                            if write.send(message).await.is_err() || is_close {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            let _ = closed_tx.send(());
        });

        Self {
            addr,
            upgrade: Some(upgrade_rx),
            received: received_rx,
            outbound: outbound_tx,
            closed: Some(closed_rx),
        }
    }

    /// Base URL to configure the connector with.
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    /// Upgrade request headers, once the client has connected.
    pub async fn upgrade_request(&mut self) -> UpgradeRequest {
        let rx = self.upgrade.take().expect("upgrade request already taken");
        tokio::time::timeout(RECV_TIMEOUT, rx)
            .await
            .expect("timed out waiting for upgrade")
            .expect("server dropped before upgrade")
    }

    /// Next JSON frame sent by the client.
    pub async fn recv(&mut self) -> Value {
        tokio::time::timeout(RECV_TIMEOUT, self.received.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("client connection ended")
    }

    /// Next client frame whose `type` is `event_type`, skipping others.
    pub async fn recv_type(&mut self, event_type: &str) -> Value {
        loop {
            let value = self.recv().await;
            if value["type"] == event_type {
                return value;
            }
        }
    }

    /// Send a JSON event to the client.
    pub fn send(&self, event: Value) {
        self.outbound
            .send(Message::Text(event.to_string().into()))
            .expect("mock server stopped");
    }

    /// Close the connection from the server side.
    pub fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }

    /// Wait until the connection has ended.
    pub async fn wait_closed(&mut self) {
        let rx = self.closed.take().expect("close already awaited");
        tokio::time::timeout(RECV_TIMEOUT, rx)
            .await
            .expect("timed out waiting for connection close")
            .expect("server task dropped");
    }
}
