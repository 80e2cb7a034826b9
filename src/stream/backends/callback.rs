//! Backend fed by an asynchronous producer.
//!
//! Hardware SDKs typically deliver frames on their own thread through a
//! callback. `CallbackBackend` is the stream side of that arrangement and
//! `FrameFeeder` is the handle the callback publishes through. Delivery is
//! latest-frame: frames the consumer did not pick up in time are dropped.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{StreamError, StreamResult};
use crate::mode::{StreamKind, StreamMode};
use crate::stream::backend::StreamBackend;
use crate::stream::latest::{LatestFrame, SlotStats};

/// Producer handle for a `CallbackBackend`.
#[derive(Clone)]
pub struct FrameFeeder {
    slot: LatestFrame,
    requested: Arc<Mutex<Option<StreamMode>>>,
}

impl FrameFeeder {
    /// Publish a frame. Returns false when the stream is closed.
    pub fn push(&self, data: Vec<u8>, timestamp_us: u64) -> bool {
        self.slot.publish(data, timestamp_us)
    }

    /// Mode the consumer has negotiated, so the producer knows what to emit.
    pub fn requested_mode(&self) -> Option<StreamMode> {
        self.requested.lock().ok().and_then(|mode| *mode)
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }
}

pub struct CallbackBackend {
    name: &'static str,
    kind: StreamKind,
    modes: Vec<StreamMode>,
    slot: LatestFrame,
    requested: Arc<Mutex<Option<StreamMode>>>,
    frame_bytes: usize,
    discarded: u64,
}

impl CallbackBackend {
    /// Create a backend advertising `modes`, plus the feeder for its producer.
    pub fn new(name: &'static str, kind: StreamKind, modes: Vec<StreamMode>) -> (Self, FrameFeeder) {
        let slot = LatestFrame::new();
        let requested = Arc::new(Mutex::new(None));
        let feeder = FrameFeeder {
            slot: slot.clone(),
            requested: requested.clone(),
        };
        let backend = Self {
            name,
            kind,
            modes,
            slot,
            requested,
            frame_bytes: 0,
            discarded: 0,
        };
        (backend, feeder)
    }

    pub fn slot_stats(&self) -> SlotStats {
        self.slot.stats()
    }

    /// Frames discarded because their size did not match the active mode.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl StreamBackend for CallbackBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn open(&mut self) -> StreamResult<()> {
        self.slot.reopen();
        Ok(())
    }

    fn query_modes(&self) -> StreamResult<Vec<StreamMode>> {
        Ok(self.modes.clone())
    }

    fn set_mode(&mut self, mode: &StreamMode) -> StreamResult<()> {
        let mut requested = self
            .requested
            .lock()
            .map_err(|_| StreamError::unavailable(self.name, "mode lock poisoned"))?;
        *requested = Some(*mode);
        self.frame_bytes = mode.frame_bytes();
        // Frames captured under the previous mode are stale.
        self.slot.clear();
        Ok(())
    }

    fn poll_frame(&mut self, dest: &mut [u8], timeout: Duration) -> StreamResult<u64> {
        // No deadline when the timeout does not fit in an Instant.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            let frame = self.slot.take(remaining).map_err(|err| match err {
                StreamError::Timeout { .. } => StreamError::Timeout { timeout },
                other => other,
            })?;
            if frame.data.len() == dest.len() && dest.len() == self.frame_bytes {
                dest.copy_from_slice(&frame.data);
                return Ok(frame.timestamp_us);
            }
            self.discarded += 1;
            log::warn!(
                "CallbackBackend: '{}' discarded {} byte frame, expected {}",
                self.name,
                frame.data.len(),
                dest.len()
            );
            if remaining.is_zero() {
                return Err(StreamError::Timeout { timeout });
            }
        }
    }

    fn close(&mut self) {
        self.slot.close();
        if let Ok(mut requested) = self.requested.lock() {
            *requested = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::PixelFormat;

    fn depth_mode() -> StreamMode {
        StreamMode::new(2, 2, 30, PixelFormat::Depth16)
    }

    #[test]
    fn delivers_latest_frame_for_active_mode() -> StreamResult<()> {
        let (mut backend, feeder) = CallbackBackend::new("sdk", StreamKind::Depth, vec![depth_mode()]);
        backend.open()?;
        backend.set_mode(&depth_mode())?;
        assert_eq!(feeder.requested_mode(), Some(depth_mode()));

        feeder.push(vec![1; 8], 1);
        feeder.push(vec![2; 8], 2);
        let mut dest = [0u8; 8];
        assert_eq!(backend.poll_frame(&mut dest, Duration::ZERO)?, 2);
        assert_eq!(dest, [2; 8]);
        assert_eq!(backend.slot_stats().dropped, 1);
        Ok(())
    }

    #[test]
    fn unbounded_timeout_returns_pending_frame() -> StreamResult<()> {
        let (mut backend, feeder) = CallbackBackend::new("sdk", StreamKind::Depth, vec![depth_mode()]);
        backend.open()?;
        backend.set_mode(&depth_mode())?;

        feeder.push(vec![3; 8], 7);
        let mut dest = [0u8; 8];
        assert_eq!(backend.poll_frame(&mut dest, Duration::MAX)?, 7);
        assert_eq!(dest, [3; 8]);
        Ok(())
    }

    #[test]
    fn wrong_sized_frames_are_discarded() -> StreamResult<()> {
        let (mut backend, feeder) = CallbackBackend::new("sdk", StreamKind::Depth, vec![depth_mode()]);
        backend.open()?;
        backend.set_mode(&depth_mode())?;

        feeder.push(vec![1; 6], 1);
        let mut dest = [0u8; 8];
        let err = backend.poll_frame(&mut dest, Duration::from_millis(5)).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(dest, [0; 8]);
        assert_eq!(backend.discarded(), 1);
        Ok(())
    }

    #[test]
    fn mode_change_drops_pending_frame() -> StreamResult<()> {
        let (mut backend, feeder) = CallbackBackend::new("sdk", StreamKind::Depth, vec![depth_mode()]);
        backend.open()?;
        backend.set_mode(&depth_mode())?;
        feeder.push(vec![1; 8], 1);
        backend.set_mode(&depth_mode())?;

        let mut dest = [0u8; 8];
        assert!(backend.poll_frame(&mut dest, Duration::from_millis(2)).is_err());
        Ok(())
    }

    #[test]
    fn close_detaches_feeder() -> StreamResult<()> {
        let (mut backend, feeder) = CallbackBackend::new("sdk", StreamKind::Color, vec![depth_mode()]);
        backend.open()?;
        backend.close();
        assert!(feeder.is_closed());
        assert!(!feeder.push(vec![0; 8], 0));
        assert_eq!(feeder.requested_mode(), None);
        Ok(())
    }
}
