//! Status taxonomy shared by every stream backend.
//!
//! Backends translate their native failures into `StreamError` before
//! returning, so no hardware-specific code crosses the stream boundary.

use std::time::Duration;

use thiserror::Error;

use crate::mode::StreamMode;
use crate::stream::StreamState;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The backend source could not be opened. Fatal for the stream.
    #[error("backend '{backend}' unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    /// Requested mode is not in the stream's catalog.
    #[error("stream mode {mode} is not supported")]
    UnsupportedMode { mode: StreamMode },

    /// Destination buffer cannot hold one frame of the active mode.
    #[error("destination buffer too small: {required} bytes required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    /// No frame became available in time. The caller may retry.
    #[error("no frame available within {timeout:?}")]
    Timeout { timeout: Duration },

    /// Operation issued in a lifecycle state that does not allow it.
    #[error("cannot {operation} while stream is {state}")]
    InvalidState {
        state: StreamState,
        operation: &'static str,
    },
}

impl StreamError {
    pub(crate) fn unavailable(backend: &'static str, reason: impl Into<String>) -> Self {
        StreamError::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// True for conditions a plain retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(self, StreamError::Timeout { .. })
    }

    /// True when the caller can recover by changing its request.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StreamError::UnsupportedMode { .. }
                | StreamError::BufferTooSmall { .. }
                | StreamError::InvalidState { .. }
        )
    }
}
