//! Events feeding a call's single worker.

use tokio::sync::mpsc;

use crate::core::realtime::{ClientEvent, RealtimeError};

/// Per-call event queue capacity.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Outbound buffer towards the telephony socket writer.
pub const CALLER_CHANNEL_CAPACITY: usize = 1024;

/// Outbound buffer towards the model socket task.
pub const MODEL_CHANNEL_CAPACITY: usize = 256;

/// Everything that can happen to a call, in arrival order.
///
/// Producers (the caller socket reader, the model socket task and the
/// configure timer) push into one bounded queue; the orchestrator consumes it
/// and is the only code that touches session state.
#[derive(Debug)]
pub enum RelayEvent {
    /// Raw text frame from the telephony media stream
    CallerFrame(String),
    /// Telephony socket closed or errored
    CallerClosed,
    /// Model channel connected; carries its outbound command sender
    ModelOpened(mpsc::Sender<ClientEvent>),
    /// Model channel could not be opened
    ModelFailed(RealtimeError),
    /// Configure delay elapsed; time to send `session.update`
    ModelConfigure,
    /// Raw text frame from the model channel
    ModelFrame(String),
    /// Model channel closed or errored
    ModelClosed,
}

impl RelayEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallerFrame(_) => "caller_frame",
            Self::CallerClosed => "caller_closed",
            Self::ModelOpened(_) => "model_opened",
            Self::ModelFailed(_) => "model_failed",
            Self::ModelConfigure => "model_configure",
            Self::ModelFrame(_) => "model_frame",
            Self::ModelClosed => "model_closed",
        }
    }
}
