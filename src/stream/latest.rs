//! Single-slot frame mailbox for asynchronously fed backends.
//!
//! A producer (driver callback, capture thread) publishes frames; the stream
//! consumer takes them with a timeout. Only the most recent frame is kept:
//! publishing over an unread frame drops the older one.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{StreamError, StreamResult};

/// A frame captured by the producer side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    pub data: Vec<u8>,
    pub timestamp_us: u64,
}

/// Counters for a `LatestFrame` slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub published: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct SlotState {
    frame: Option<CapturedFrame>,
    closed: bool,
    stats: SlotStats,
}

/// Shared latest-frame slot. Cloning shares the same slot.
#[derive(Clone, Default)]
pub struct LatestFrame {
    inner: Arc<(Mutex<SlotState>, Condvar)>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, replacing any unread one. Returns false once closed.
    pub fn publish(&self, data: Vec<u8>, timestamp_us: u64) -> bool {
        let (_, condvar) = &*self.inner;
        let Ok(mut state) = self.lock() else {
            return false;
        };
        if state.closed {
            return false;
        }
        if state.frame.is_some() {
            state.stats.dropped += 1;
        }
        state.stats.published += 1;
        state.frame = Some(CapturedFrame { data, timestamp_us });
        drop(state);
        condvar.notify_one();
        true
    }

    /// Take the latest frame, waiting at most `timeout` for one to arrive.
    pub fn take(&self, timeout: Duration) -> StreamResult<CapturedFrame> {
        let (_, condvar) = &*self.inner;
        let state = self.lock()?;
        let (mut state, _) = condvar
            .wait_timeout_while(state, timeout, |state| {
                state.frame.is_none() && !state.closed
            })
            .map_err(|_| StreamError::unavailable("latest-frame", "frame slot lock poisoned"))?;

        if let Some(frame) = state.frame.take() {
            return Ok(frame);
        }
        if state.closed {
            return Err(StreamError::unavailable("latest-frame", "frame source closed"));
        }
        Err(StreamError::Timeout { timeout })
    }

    /// Discard any unread frame without counting it as dropped.
    pub fn clear(&self) {
        if let Ok(mut state) = self.lock() {
            state.frame = None;
        }
    }

    /// Close the slot and wake any waiting consumer.
    pub fn close(&self) {
        let (_, condvar) = &*self.inner;
        if let Ok(mut state) = self.lock() {
            state.closed = true;
            state.frame = None;
        }
        condvar.notify_all();
    }

    /// Reopen a closed slot for a new session.
    pub fn reopen(&self) {
        if let Ok(mut state) = self.lock() {
            state.closed = false;
            state.frame = None;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|state| state.closed).unwrap_or(true)
    }

    pub fn stats(&self) -> SlotStats {
        self.lock().map(|state| state.stats).unwrap_or_default()
    }

    fn lock(&self) -> StreamResult<MutexGuard<'_, SlotState>> {
        self.inner
            .0
            .lock()
            .map_err(|_| StreamError::unavailable("latest-frame", "frame slot lock poisoned"))
    }
}
