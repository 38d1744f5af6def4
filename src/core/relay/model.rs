//! Model side: realtime API events and barge-in handling.

use std::borrow::Cow;

use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

use super::RelaySettings;
use super::channel::SendOutcome;
use super::orchestrator::CallContext;
use crate::core::realtime::{ClientEvent, ServerEvent};
use crate::core::telephony::TwilioOutbound;

/// Token attached to every forwarded audio chunk.
pub const PLAYBACK_MARK: &str = "responsePart";

/// Event types worth an info line.
const LOGGED_EVENT_TYPES: &[&str] = &[
    "error",
    "response.content_part.done",
    "rate_limits.updated",
    "response.done",
    "input_audio_buffer.committed",
    "input_audio_buffer.speech_stopped",
    "input_audio_buffer.speech_started",
    "session.created",
];

/// Send `session.update`, then the greeting if one is configured.
pub(crate) fn configure_session(ctx: &mut CallContext, settings: &RelaySettings) {
    info!(voice = %settings.voice, "Sending session update");
    ctx.model.send(ClientEvent::SessionUpdate {
        session: settings.session_config(),
    });

    for event in settings.greeting_events() {
        debug!(event = event.event_type(), "Sending greeting");
        ctx.model.send(event);
    }
}

/// Handle one inbound model frame to completion.
pub(crate) fn handle_model_frame(ctx: &mut CallContext, raw: &str) {
    let event: ServerEvent = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            warn!("Error processing OpenAI message: {}", e);
            return;
        }
    };

    observe(&event, &wire_event_type(&event, raw));

    match event {
        ServerEvent::AudioDelta { delta, item_id, .. } => {
            on_audio_delta(ctx, delta, item_id);
        }
        ServerEvent::SpeechStarted { .. } => on_speech_started(ctx),
        _ => {}
    }
}

/// Type name as sent by the server, including types without a variant.
fn wire_event_type<'a>(event: &ServerEvent, raw: &'a str) -> Cow<'a, str> {
    #[derive(Deserialize)]
    struct EventTag<'a> {
        #[serde(rename = "type", borrow)]
        event_type: Cow<'a, str>,
    }

    match event {
        ServerEvent::Unknown => serde_json::from_str::<EventTag>(raw)
            .map(|tag| tag.event_type)
            .unwrap_or(Cow::Borrowed("unknown")),
        known => Cow::Borrowed(known.event_type()),
    }
}

fn observe(event: &ServerEvent, event_type: &str) {
    match event {
        ServerEvent::Error { error } => {
            error!(
                error_type = %error.error_type,
                code = ?error.code,
                "Received event: error: {}",
                error.message
            );
        }
        _ if LOGGED_EVENT_TYPES.contains(&event_type) => {
            info!("Received event: {}", event_type);
        }
        _ => trace!("Received event: {}", event_type),
    }
}

/// Forward a chunk of assistant audio to the caller and track its playback.
fn on_audio_delta(ctx: &mut CallContext, delta: String, item_id: Option<String>) {
    if delta.is_empty() {
        return;
    }
    let Some(stream_sid) = ctx.session.stream_sid().map(str::to_owned) else {
        debug!("Audio delta before the media stream started, dropping");
        return;
    };

    let outcome = ctx.caller.send(TwilioOutbound::media(&stream_sid, delta));
    if outcome != SendOutcome::Sent {
        debug!(?outcome, "Audio chunk not queued for the caller, skipping playback tracking");
        return;
    }

    let latest = ctx.session.latest_media_timestamp();
    if ctx.session.response_start_timestamp().is_none() {
        debug!(start_ms = latest, "Setting start timestamp for new response");
    }
    ctx.session.begin_response(latest);

    if let Some(item_id) = item_id {
        ctx.session.set_assistant_item(item_id);
    }

    if ctx.caller.send(TwilioOutbound::mark(&stream_sid, PLAYBACK_MARK)) == SendOutcome::Sent {
        ctx.session.push_mark(PLAYBACK_MARK);
    }
}

/// The caller started talking over the assistant.
fn on_speech_started(ctx: &mut CallContext) {
    let Some(interruption) = ctx.session.interruption() else {
        return;
    };

    debug!(
        latest_ms = ctx.session.latest_media_timestamp(),
        start_ms = ?ctx.session.response_start_timestamp(),
        elapsed_ms = interruption.elapsed_ms,
        "Calculating elapsed time for truncation"
    );

    if let Some(item_id) = interruption.item_id {
        ctx.model.send(ClientEvent::ConversationItemTruncate {
            item_id,
            content_index: 0,
            audio_end_ms: interruption.elapsed_ms,
        });
    }

    if let Some(stream_sid) = ctx.session.stream_sid() {
        let clear = TwilioOutbound::clear(stream_sid);
        ctx.caller.send(clear);
    }

    ctx.session.reset_interruption();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ServerEvent {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_wire_event_type_for_modelled_event() {
        let raw = r#"{"type": "response.done", "response": {"id": "resp_1"}}"#;
        assert_eq!(wire_event_type(&parse(raw), raw), "response.done");
    }

    #[test]
    fn test_wire_event_type_keeps_unmodelled_name() {
        let raw = r#"{"type": "response.audio_transcript.delta", "delta": "Hel"}"#;
        let event = parse(raw);
        assert!(matches!(event, ServerEvent::Unknown));
        assert_eq!(
            wire_event_type(&event, raw),
            "response.audio_transcript.delta"
        );
    }
}
