use std::time::Duration;

use crate::error::StreamResult;
use crate::mode::{StreamFlags, StreamKind, StreamMode};

/// Backend adapter consumed by `DeviceStream`.
///
/// # Contract
///
/// Implementations translate every native failure into `StreamError` and
/// never surface raw driver codes. `DeviceStream` owns the mode catalog and
/// size validation; a backend only has to:
/// - claim its source in `open` and fail with `BackendUnavailable` if it cannot
/// - advertise its modes in `query_modes`, in preference order
/// - reallocate mode-dependent state in `set_mode`
/// - fill exactly `dest.len()` bytes in `poll_frame`, or leave `dest` untouched on error
/// - release everything in `close`
pub trait StreamBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    fn kind(&self) -> StreamKind;

    fn open(&mut self) -> StreamResult<()>;

    fn query_modes(&self) -> StreamResult<Vec<StreamMode>>;

    /// Switch to `mode`. Only called with modes from `query_modes`.
    fn set_mode(&mut self, mode: &StreamMode) -> StreamResult<()>;

    /// Produce one frame into `dest`, sized exactly for the active mode.
    ///
    /// Returns the capture timestamp in microseconds. Generative backends are
    /// always ready; hardware backends wait at most `timeout`.
    fn poll_frame(&mut self, dest: &mut [u8], timeout: Duration) -> StreamResult<u64>;

    fn close(&mut self);

    /// Optional hook for presentation flag changes.
    fn set_flags(&mut self, _flags: StreamFlags) {}
}
