pub mod realtime;
pub mod relay;
pub mod telephony;

// Re-export commonly used types for convenience
pub use realtime::{
    ClientEvent, ModelConnector, OpenAIRealtimeConnector, RealtimeError, RealtimeResult,
    ServerEvent, SharedModelConnector,
};

pub use relay::{RelayEvent, RelayOrchestrator, RelayPhase, RelaySettings, SessionState};

pub use telephony::{TwilioClient, TwilioError, TwilioInbound, TwilioOutbound};
