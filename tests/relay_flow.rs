//! End-to-end relay tests against a mock realtime model server.
//!
//! These drive the real OpenAI connector over a local WebSocket, so they
//! cover the wire format in both directions as well as the orchestrator's
//! barge-in handling.

mod mock_realtime;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::http::StatusCode;

use callbridge_gateway::config::ServerConfig;
use callbridge_gateway::core::realtime::RealtimeVoice;
use callbridge_gateway::{
    AppState, ModelConnector, OpenAIRealtimeConnector, RealtimeError, RelayEvent,
    RelayOrchestrator, RelaySettings, TwilioOutbound, routes,
};

use mock_realtime::{MockRealtime, RECV_TIMEOUT};

fn settings_for(mock: &MockRealtime) -> RelaySettings {
    let mut settings = RelaySettings::new("sk-test-key");
    settings.realtime_url = mock.url();
    settings.instructions = "Be brief.".to_string();
    settings.session_update_delay = Duration::from_millis(10);
    settings
}

fn start_frame(stream_sid: &str) -> String {
    json!({
        "event": "start",
        "sequenceNumber": "1",
        "start": {
            "accountSid": "AC123",
            "streamSid": stream_sid,
            "callSid": "CA123",
            "tracks": ["inbound"],
            "mediaFormat": { "encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1 }
        },
        "streamSid": stream_sid
    })
    .to_string()
}

fn media_frame(stream_sid: &str, timestamp: u64, payload: &str) -> String {
    json!({
        "event": "media",
        "sequenceNumber": "2",
        "media": {
            "track": "inbound",
            "chunk": "1",
            "timestamp": timestamp.to_string(),
            "payload": payload
        },
        "streamSid": stream_sid
    })
    .to_string()
}

async fn recv_caller(rx: &mut mpsc::Receiver<TwilioOutbound>) -> TwilioOutbound {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for caller message")
        .expect("caller channel closed")
}

#[tokio::test]
async fn test_upgrade_carries_credentials_and_model() {
    let mut mock = MockRealtime::start().await;
    let settings = settings_for(&mock);
    let (events_tx, _events_rx) = mpsc::channel(16);

    let connector = OpenAIRealtimeConnector::new();
    let _sender = connector
        .connect(&settings, events_tx)
        .await
        .expect("connects to mock server");

    let upgrade = mock.upgrade_request().await;
    assert_eq!(upgrade.authorization.as_deref(), Some("Bearer sk-test-key"));
    assert_eq!(upgrade.openai_beta.as_deref(), Some("realtime=v1"));
    assert!(upgrade.path_and_query.starts_with("/v1/realtime?model="));
}

#[tokio::test]
async fn test_rejected_upgrade_is_authentication_failure() {
    let mock = MockRealtime::rejecting(StatusCode::UNAUTHORIZED).await;
    let settings = settings_for(&mock);
    let (events_tx, _events_rx) = mpsc::channel(16);

    let result = OpenAIRealtimeConnector::new()
        .connect(&settings, events_tx)
        .await;

    assert!(matches!(result, Err(RealtimeError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_call_with_barge_in() {
    let mut mock = MockRealtime::start().await;
    let settings = Arc::new(settings_for(&mock));
    let (caller_tx, mut caller_rx) = mpsc::channel(64);

    let relay = RelayOrchestrator::new(
        settings,
        Arc::new(OpenAIRealtimeConnector::new()),
        caller_tx,
    );
    let events = relay.event_sender();
    let run = tokio::spawn(relay.run());

    events
        .send(RelayEvent::CallerFrame(start_frame("MZ100")))
        .await
        .unwrap();

    // Session is configured after the model channel opens
    let update = mock.recv_type("session.update").await;
    assert_eq!(update["session"]["input_audio_format"], "g711_ulaw");
    assert_eq!(update["session"]["output_audio_format"], "g711_ulaw");
    assert_eq!(update["session"]["turn_detection"]["type"], "server_vad");
    assert_eq!(update["session"]["instructions"], "Be brief.");

    // Caller audio is forwarded untouched
    events
        .send(RelayEvent::CallerFrame(media_frame("MZ100", 1000, "dWxhdw==")))
        .await
        .unwrap();
    let append = mock.recv_type("input_audio_buffer.append").await;
    assert_eq!(append["audio"], "dWxhdw==");

    // Model audio is played to the caller and followed by a mark
    mock.send(json!({
        "type": "response.audio.delta",
        "event_id": "ev_1",
        "response_id": "resp_1",
        "item_id": "item_42",
        "output_index": 0,
        "content_index": 0,
        "delta": "AAEC"
    }));
    assert_eq!(
        recv_caller(&mut caller_rx).await,
        TwilioOutbound::media("MZ100", "AAEC")
    );
    match recv_caller(&mut caller_rx).await {
        TwilioOutbound::Mark { stream_sid, mark } => {
            assert_eq!(stream_sid, "MZ100");
            assert_eq!(mark.name, "responsePart");
        }
        other => panic!("expected mark, got {other:?}"),
    }

    // 350ms of caller audio plays while the assistant is speaking
    events
        .send(RelayEvent::CallerFrame(media_frame("MZ100", 1350, "AAAA")))
        .await
        .unwrap();
    mock.recv_type("input_audio_buffer.append").await;

    // Caller starts talking over the assistant
    mock.send(json!({
        "type": "input_audio_buffer.speech_started",
        "event_id": "ev_2",
        "audio_start_ms": 1350,
        "item_id": "item_user_1"
    }));

    let truncate = mock.recv_type("conversation.item.truncate").await;
    assert_eq!(truncate["item_id"], "item_42");
    assert_eq!(truncate["content_index"], 0);
    assert_eq!(truncate["audio_end_ms"], 350);
    assert_eq!(
        recv_caller(&mut caller_rx).await,
        TwilioOutbound::clear("MZ100")
    );

    // Caller hangs up: the relay stops and the model socket closes
    events.send(RelayEvent::CallerClosed).await.unwrap();
    tokio::time::timeout(RECV_TIMEOUT, run)
        .await
        .expect("relay stops after caller closes")
        .unwrap();
    mock.wait_closed().await;
    assert!(caller_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_model_close_ends_call() {
    let mut mock = MockRealtime::start().await;
    let settings = Arc::new(settings_for(&mock));
    let (caller_tx, mut caller_rx) = mpsc::channel(64);

    let relay = RelayOrchestrator::new(
        settings,
        Arc::new(OpenAIRealtimeConnector::new()),
        caller_tx,
    );
    let run = tokio::spawn(relay.run());

    mock.recv_type("session.update").await;
    mock.close();

    tokio::time::timeout(RECV_TIMEOUT, run)
        .await
        .expect("relay stops after model closes")
        .unwrap();
    assert!(caller_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_model_rejection_ends_call() {
    let mock = MockRealtime::rejecting(StatusCode::FORBIDDEN).await;
    let settings = Arc::new(settings_for(&mock));
    let (caller_tx, mut caller_rx) = mpsc::channel(64);

    let relay = RelayOrchestrator::new(
        settings,
        Arc::new(OpenAIRealtimeConnector::new()),
        caller_tx,
    );

    tokio::time::timeout(RECV_TIMEOUT, relay.run())
        .await
        .expect("relay stops after connect failure");
    assert!(caller_rx.recv().await.is_none());
}

fn server_config(realtime_url: String) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        public_url: None,
        openai_api_key: Some("sk-test-key".to_string()),
        openai_realtime_url: realtime_url,
        openai_model: "gpt-4o-realtime-preview".to_string(),
        openai_voice: RealtimeVoice::Alloy,
        openai_temperature: 0.8,
        instructions_path: None,
        client_name: "Ada".to_string(),
        greeting: Some("Say hello.".to_string()),
        session_update_delay_ms: 10,
        twilio: None,
        rate_limit_requests_per_second: 100,
        rate_limit_burst_size: 10,
    }
}

async fn serve_gateway(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(config).unwrap();
    let app = routes::app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

#[tokio::test]
async fn test_media_stream_endpoint_relays_audio() {
    let mut mock = MockRealtime::start().await;
    let addr = serve_gateway(server_config(mock.url())).await;

    let (twilio, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/media-stream"))
        .await
        .expect("media stream upgrade");
    let (mut twilio_tx, mut twilio_rx) = twilio.split();

    twilio_tx
        .send(Message::Text(start_frame("MZ200").into()))
        .await
        .unwrap();

    let update = mock.recv_type("session.update").await;
    assert_eq!(update["session"]["temperature"], 0.8);
    assert!(
        update["session"]["instructions"]
            .as_str()
            .unwrap()
            .contains("Ada")
    );

    // Configured greeting makes the assistant speak first
    let item = mock.recv_type("conversation.item.create").await;
    assert_eq!(item["item"]["content"][0]["text"], "Say hello.");
    mock.recv_type("response.create").await;

    twilio_tx
        .send(Message::Text(media_frame("MZ200", 20, "cGF5bG9hZA==").into()))
        .await
        .unwrap();
    let append = mock.recv_type("input_audio_buffer.append").await;
    assert_eq!(append["audio"], "cGF5bG9hZA==");

    mock.send(json!({
        "type": "response.audio.delta",
        "response_id": "resp_1",
        "item_id": "item_1",
        "delta": "AAEC"
    }));

    let frame = tokio::time::timeout(RECV_TIMEOUT, twilio_rx.next())
        .await
        .expect("timed out waiting for media")
        .expect("socket open")
        .unwrap();
    let media: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(media["event"], "media");
    assert_eq!(media["streamSid"], "MZ200");
    assert_eq!(media["media"]["payload"], "AAEC");

    // Hanging up the media stream closes the model socket
    twilio_tx.send(Message::Close(None)).await.unwrap();
    mock.wait_closed().await;
}

#[tokio::test]
async fn test_hangup_discards_unsent_caller_audio() {
    const CHUNKS: usize = 400;

    let mut mock = MockRealtime::start().await;
    let mut config = server_config(mock.url());
    config.greeting = None;
    let addr = serve_gateway(config).await;

    let (twilio, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/media-stream"))
        .await
        .expect("media stream upgrade");
    let (mut twilio_tx, mut twilio_rx) = twilio.split();

    twilio_tx
        .send(Message::Text(start_frame("MZ300").into()))
        .await
        .unwrap();
    twilio_tx
        .send(Message::Text(media_frame("MZ300", 20, "AAAA").into()))
        .await
        .unwrap();
    mock.recv_type("input_audio_buffer.append").await;

    // The caller stops reading while the model streams far more audio than
    // the socket buffers hold
    let chunk = "A".repeat(80_000);
    for _ in 0..CHUNKS {
        mock.send(json!({
            "type": "response.audio.delta",
            "response_id": "resp_1",
            "item_id": "item_1",
            "delta": chunk
        }));
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Hanging up tears the call down without flushing the backlog
    twilio_tx.send(Message::Close(None)).await.unwrap();
    mock.wait_closed().await;

    let mut media = 0;
    let drained = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(frame) = twilio_rx.next().await {
            match frame {
                Ok(Message::Text(text)) if text.as_str().contains("\"event\":\"media\"") => {
                    media += 1;
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;

    assert!(drained.is_ok(), "media stream socket stayed open");
    assert!(
        media < CHUNKS,
        "all {media} queued media frames were flushed after hangup"
    );
}
