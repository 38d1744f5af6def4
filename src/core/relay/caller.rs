//! Caller side: Twilio media stream frames.

use tracing::{debug, info, warn};

use super::orchestrator::CallContext;
use crate::core::realtime::ClientEvent;
use crate::core::telephony::TwilioInbound;

/// Handle one inbound Twilio frame to completion.
pub(crate) fn handle_caller_frame(ctx: &mut CallContext, raw: &str) {
    let frame: TwilioInbound = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Error parsing message: {}", e);
            return;
        }
    };

    match frame {
        TwilioInbound::Media { media, .. } => {
            ctx.session.record_media(media.timestamp);
            if ctx.model.is_open() {
                ctx.model.send(ClientEvent::audio_append(media.payload));
            }
        }

        TwilioInbound::Start { stream_sid, start } => {
            let Some(sid) = start.stream_sid.or(stream_sid) else {
                warn!("Start frame without a stream id, ignoring");
                return;
            };
            info!(stream_sid = %sid, call_sid = ?start.call_sid, "Incoming stream has started");
            ctx.session.start_stream(sid);
        }

        TwilioInbound::Mark { .. } => {
            ctx.session.ack_mark();
        }

        TwilioInbound::Stop { .. } => {
            info!("Media stream stopped");
        }

        other => {
            debug!(event = other.event_name(), "Received non-media event");
        }
    }
}
