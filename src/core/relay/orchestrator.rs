//! Per-call relay orchestrator.
//!
//! Owns the session state and both channel handles for one call. The caller
//! socket reader, the model socket task and the configure timer all push
//! [`RelayEvent`]s into one queue; [`RelayOrchestrator::run`] drains it on a
//! single task, so every event is handled to completion before the next and
//! no locking is needed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use super::caller::handle_caller_frame;
use super::channel::ChannelHandle;
use super::events::{EVENT_QUEUE_CAPACITY, RelayEvent};
use super::model::{configure_session, handle_model_frame};
use super::session::SessionState;
use super::settings::RelaySettings;
use crate::core::realtime::{ClientEvent, SharedModelConnector};
use crate::core::telephony::TwilioOutbound;

/// Lifecycle of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    /// Model channel is being opened
    Connecting,
    /// Both channels open; audio flows
    Active,
    /// Terminal
    Closed,
}

/// State the adapters operate on.
#[derive(Debug)]
pub(crate) struct CallContext {
    pub session: SessionState,
    pub caller: ChannelHandle<TwilioOutbound>,
    pub model: ChannelHandle<ClientEvent>,
}

pub struct RelayOrchestrator {
    call_id: Uuid,
    settings: Arc<RelaySettings>,
    connector: SharedModelConnector,
    phase: RelayPhase,
    ctx: CallContext,
    events_tx: mpsc::Sender<RelayEvent>,
    events_rx: mpsc::Receiver<RelayEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl RelayOrchestrator {
    /// Create the orchestrator for a call whose telephony socket writer
    /// drains `caller_tx`.
    pub fn new(
        settings: Arc<RelaySettings>,
        connector: SharedModelConnector,
        caller_tx: mpsc::Sender<TwilioOutbound>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        Self {
            call_id: Uuid::new_v4(),
            settings,
            connector,
            phase: RelayPhase::Connecting,
            ctx: CallContext {
                session: SessionState::new(),
                caller: ChannelHandle::open("caller", caller_tx),
                model: ChannelHandle::connecting("model"),
            },
            events_tx,
            events_rx,
            tasks: Vec::new(),
        }
    }

    /// Sender for producers feeding this call.
    pub fn event_sender(&self) -> mpsc::Sender<RelayEvent> {
        self.events_tx.clone()
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    pub fn session(&self) -> &SessionState {
        &self.ctx.session
    }

    /// Connect the model channel and process events until the call closes.
    pub async fn run(mut self) {
        let span = info_span!("call", call_id = %self.call_id);
        async move {
            info!(provider = self.connector.provider_name(), "Call started");
            self.start_connect();

            while let Some(event) = self.events_rx.recv().await {
                self.handle(event);
                if self.phase == RelayPhase::Closed {
                    break;
                }
            }

            self.close();
            info!("Call finished");
        }
        .instrument(span)
        .await
    }

    /// Apply one event.
    pub fn handle(&mut self, event: RelayEvent) {
        if self.phase == RelayPhase::Closed {
            debug!(event = event.kind(), "Ignoring event after close");
            return;
        }

        match event {
            RelayEvent::CallerFrame(raw) => handle_caller_frame(&mut self.ctx, &raw),

            RelayEvent::CallerClosed => {
                info!("Client disconnected");
                self.close();
            }

            RelayEvent::ModelOpened(sender) => {
                if self.phase == RelayPhase::Connecting && self.ctx.model.attach(sender) {
                    info!("Model channel open");
                    self.phase = RelayPhase::Active;
                    self.schedule_session_configure();
                }
            }

            RelayEvent::ModelFailed(e) => {
                error!("Failed to connect to the realtime model: {}", e);
                self.close();
            }

            RelayEvent::ModelConfigure => {
                if self.phase == RelayPhase::Active {
                    configure_session(&mut self.ctx, &self.settings);
                }
            }

            RelayEvent::ModelFrame(raw) => handle_model_frame(&mut self.ctx, &raw),

            RelayEvent::ModelClosed => {
                info!("Disconnected from the OpenAI Realtime API");
                self.close();
            }
        }
    }

    /// Tear the call down. Idempotent.
    pub fn close(&mut self) {
        if self.phase != RelayPhase::Closed {
            debug!(stream_sid = ?self.ctx.session.stream_sid(), "Closing call");
        }
        self.phase = RelayPhase::Closed;
        self.ctx.model.close();
        self.ctx.caller.close();
        self.ctx.session = SessionState::new();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn start_connect(&mut self) {
        let connector = self.connector.clone();
        let settings = self.settings.clone();
        let events = self.events_tx.clone();

        self.tasks.push(tokio::spawn(
            async move {
                let event = match connector.connect(&settings, events.clone()).await {
                    Ok(sender) => RelayEvent::ModelOpened(sender),
                    Err(e) => RelayEvent::ModelFailed(e),
                };
                let _ = events.send(event).await;
            }
            .in_current_span(),
        ));
    }

    fn schedule_session_configure(&mut self) {
        let delay = self.settings.session_update_delay;
        let events = self.events_tx.clone();

        self.tasks.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(RelayEvent::ModelConfigure).await;
        }));
    }
}

impl Drop for RelayOrchestrator {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
