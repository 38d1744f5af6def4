//! Telephony to realtime-model relay.
//!
//! One [`RelayOrchestrator`] per call. It owns the [`SessionState`] and two
//! [`ChannelHandle`]s, consumes [`RelayEvent`]s from a single queue and
//! drives the caller and model adapters:
//!
//! - caller frames update the media clock and feed audio to the model
//! - model audio deltas are played to the caller, each followed by a mark
//! - `speech_started` while playback is outstanding truncates the assistant
//!   item to what was heard and clears the caller's playback buffer

mod caller;
mod channel;
mod events;
mod model;
mod orchestrator;
mod session;
mod settings;

pub use channel::{ChannelHandle, ChannelState, SendOutcome};
pub use events::{
    CALLER_CHANNEL_CAPACITY, EVENT_QUEUE_CAPACITY, MODEL_CHANNEL_CAPACITY, RelayEvent,
};
pub use model::PLAYBACK_MARK;
pub use orchestrator::{RelayOrchestrator, RelayPhase};
pub use session::{Interruption, SessionState};
pub use settings::{DEFAULT_SESSION_UPDATE_DELAY, DEFAULT_TEMPERATURE, RelaySettings};
