//! Base abstractions for the realtime voice-model channel.
//!
//! The relay never talks to a concrete provider directly. It asks a
//! [`ModelConnector`] to open the channel and receives back a command sender;
//! everything the model emits is pushed into the call's event queue.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::openai::ClientEvent;
use crate::core::relay::{RelayEvent, RelaySettings};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur on the model channel.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Connector Trait
// =============================================================================

/// Opens the model channel for one call.
///
/// Implementations must spawn whatever task owns the socket, forward every
/// inbound text frame as [`RelayEvent::ModelFrame`] and finish with
/// [`RelayEvent::ModelClosed`] when the socket goes away. Dropping the
/// returned sender must close the socket.
#[async_trait]
pub trait ModelConnector: Send + Sync {
    /// Connect and return the outbound command sender.
    async fn connect(
        &self,
        settings: &RelaySettings,
        events: mpsc::Sender<RelayEvent>,
    ) -> RealtimeResult<mpsc::Sender<ClientEvent>>;

    /// Short provider name used in logs.
    fn provider_name(&self) -> &'static str;
}

/// Shared connector handle stored in application state.
pub type SharedModelConnector = Arc<dyn ModelConnector>;
