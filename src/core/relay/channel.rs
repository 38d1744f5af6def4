//! Outbound channel handle with an explicit connection state.
//!
//! Every send goes through [`ChannelHandle::send`], which checks the state
//! first. Sends never wait: a full buffer drops the item with a warning and a
//! vanished receiver flips the handle to [`ChannelState::Closed`], after which
//! every send is a no-op.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Connection state of one side of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What happened to an item handed to [`ChannelHandle::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for the writer
    Sent,
    /// Outbound buffer was full; item discarded
    Dropped,
    /// Channel not open; item discarded
    NotOpen,
}

#[derive(Debug)]
pub struct ChannelHandle<T> {
    name: &'static str,
    state: ChannelState,
    sender: Option<mpsc::Sender<T>>,
}

impl<T> ChannelHandle<T> {
    /// A handle whose channel is still being established.
    pub fn connecting(name: &'static str) -> Self {
        Self {
            name,
            state: ChannelState::Connecting,
            sender: None,
        }
    }

    /// A handle over an already open channel.
    pub fn open(name: &'static str, sender: mpsc::Sender<T>) -> Self {
        Self {
            name,
            state: ChannelState::Open,
            sender: Some(sender),
        }
    }

    /// Attach the sender of a channel that just finished connecting.
    ///
    /// Returns `false` (and drops the sender) unless the handle is still
    /// connecting.
    pub fn attach(&mut self, sender: mpsc::Sender<T>) -> bool {
        if self.state != ChannelState::Connecting {
            debug!(channel = self.name, state = ?self.state, "Ignoring late attach");
            return false;
        }
        self.sender = Some(sender);
        self.state = ChannelState::Open;
        true
    }

    pub fn send(&mut self, item: T) -> SendOutcome {
        if self.state != ChannelState::Open {
            return SendOutcome::NotOpen;
        }
        let Some(sender) = self.sender.as_ref() else {
            return SendOutcome::NotOpen;
        };

        match sender.try_send(item) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full(_)) => {
                warn!(channel = self.name, "Outbound buffer full, dropping message");
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!(channel = self.name, "Outbound receiver gone, closing handle");
                self.close();
                SendOutcome::NotOpen
            }
        }
    }

    /// Close the handle. Dropping the sender lets the writer shut its socket.
    pub fn close(&mut self) {
        self.state = ChannelState::Closed;
        self.sender = None;
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }
}
