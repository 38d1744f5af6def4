//! Per-call playback bookkeeping.
//!
//! Tracks where the caller's media clock is, which assistant item is being
//! played and how many playback marks are still unacknowledged. That is
//! enough to work out, on barge-in, how much of the response the caller
//! actually heard.

use std::collections::VecDeque;

/// Result of [`SessionState::interruption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    /// Assistant item to truncate, if the model told us its id
    pub item_id: Option<String>,
    /// Milliseconds of the response that were played before the barge-in
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    stream_sid: Option<String>,
    latest_media_timestamp: u64,
    last_assistant_item: Option<String>,
    pending_marks: VecDeque<String>,
    response_start_timestamp: Option<u64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new media stream started on the socket.
    ///
    /// Replaces the stream id, rewinds the media clock and forgets any
    /// in-flight response.
    pub fn start_stream(&mut self, stream_sid: impl Into<String>) {
        self.stream_sid = Some(stream_sid.into());
        self.latest_media_timestamp = 0;
        self.reset_interruption();
    }

    /// Record the timestamp of the latest caller audio frame.
    pub fn record_media(&mut self, timestamp: u64) {
        self.latest_media_timestamp = timestamp;
    }

    /// Mark the start of response playback. No-op while a response is
    /// already playing.
    pub fn begin_response(&mut self, at_timestamp: u64) {
        if self.response_start_timestamp.is_none() {
            self.response_start_timestamp = Some(at_timestamp);
        }
    }

    pub fn set_assistant_item(&mut self, item_id: impl Into<String>) {
        self.last_assistant_item = Some(item_id.into());
    }

    pub fn push_mark(&mut self, token: impl Into<String>) {
        self.pending_marks.push_back(token.into());
    }

    /// Acknowledge the oldest outstanding mark. Empty queue is a no-op.
    pub fn ack_mark(&mut self) -> Option<String> {
        self.pending_marks.pop_front()
    }

    /// Forget the in-flight response. Idempotent.
    pub fn reset_interruption(&mut self) {
        self.pending_marks.clear();
        self.last_assistant_item = None;
        self.response_start_timestamp = None;
    }

    /// The truncation window if a response is audibly playing.
    ///
    /// `None` unless marks are outstanding and a response start is known.
    pub fn interruption(&self) -> Option<Interruption> {
        if self.pending_marks.is_empty() {
            return None;
        }
        let started = self.response_start_timestamp?;
        Some(Interruption {
            item_id: self.last_assistant_item.clone(),
            elapsed_ms: self.latest_media_timestamp.saturating_sub(started),
        })
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn latest_media_timestamp(&self) -> u64 {
        self.latest_media_timestamp
    }

    pub fn last_assistant_item(&self) -> Option<&str> {
        self.last_assistant_item.as_deref()
    }

    pub fn response_start_timestamp(&self) -> Option<u64> {
        self.response_start_timestamp
    }

    pub fn pending_marks(&self) -> usize {
        self.pending_marks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(start: u64, latest: u64) -> SessionState {
        let mut state = SessionState::new();
        state.start_stream("MZ123");
        state.record_media(start);
        state.begin_response(start);
        state.set_assistant_item("item_42");
        state.push_mark("responsePart");
        state.record_media(latest);
        state
    }

    #[test]
    fn test_latest_timestamp_tracks_last_frame() {
        let mut state = SessionState::new();
        for ts in [0, 20, 40, 60] {
            state.record_media(ts);
        }
        assert_eq!(state.latest_media_timestamp(), 60);
    }

    #[test]
    fn test_start_stream_clears_response_bookkeeping() {
        let mut state = playing(1000, 1350);
        state.start_stream("MZ456");

        assert_eq!(state.stream_sid(), Some("MZ456"));
        assert_eq!(state.latest_media_timestamp(), 0);
        assert_eq!(state.pending_marks(), 0);
        assert!(state.last_assistant_item().is_none());
        assert!(state.response_start_timestamp().is_none());
    }

    #[test]
    fn test_begin_response_keeps_first_start() {
        let mut state = SessionState::new();
        state.begin_response(100);
        state.begin_response(500);
        assert_eq!(state.response_start_timestamp(), Some(100));
    }

    #[test]
    fn test_interruption_window() {
        let state = playing(1000, 1350);
        assert_eq!(
            state.interruption(),
            Some(Interruption {
                item_id: Some("item_42".to_string()),
                elapsed_ms: 350,
            })
        );
    }

    #[test]
    fn test_interruption_requires_marks() {
        let mut state = playing(1000, 1350);
        state.ack_mark();
        assert!(state.interruption().is_none());
    }

    #[test]
    fn test_interruption_requires_response_start() {
        let mut state = SessionState::new();
        state.push_mark("responsePart");
        assert!(state.interruption().is_none());
    }

    #[test]
    fn test_interruption_after_stream_restart_saturates() {
        let mut state = playing(1000, 1350);
        // Clock rewound below the response start without a reset.
        state.record_media(200);
        assert_eq!(state.interruption().map(|i| i.elapsed_ms), Some(0));
    }

    #[test]
    fn test_ack_on_empty_queue_is_noop() {
        let mut state = SessionState::new();
        assert!(state.ack_mark().is_none());
        assert_eq!(state.pending_marks(), 0);
    }

    #[test]
    fn test_marks_acknowledged_in_order() {
        let mut state = SessionState::new();
        state.push_mark("a");
        state.push_mark("b");
        assert_eq!(state.ack_mark().as_deref(), Some("a"));
        assert_eq!(state.ack_mark().as_deref(), Some("b"));
        assert_eq!(state.pending_marks(), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = playing(1000, 1350);
        once.reset_interruption();
        let mut twice = playing(1000, 1350);
        twice.reset_interruption();
        twice.reset_interruption();

        assert_eq!(once.pending_marks(), twice.pending_marks());
        assert_eq!(once.last_assistant_item(), twice.last_assistant_item());
        assert_eq!(
            once.response_start_timestamp(),
            twice.response_start_timestamp()
        );
        assert_eq!(
            once.latest_media_timestamp(),
            twice.latest_media_timestamp()
        );
        assert_eq!(once.stream_sid(), twice.stream_sid());
    }
}
