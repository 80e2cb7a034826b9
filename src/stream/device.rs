//! Device stream lifecycle.
//!
//! `DeviceStream` composes a `StreamBackend` with mode catalog bookkeeping and
//! buffer-size validation:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --read_into--> Initialized
//!        \                            |
//!         `------- shutdown ------> Closed (irreversible)
//! ```
//!
//! A stream is driven by a single consumer. Mode changes take `&mut self`, so
//! they cannot overlap an in-flight read on the same stream.

use std::fmt;
use std::time::Duration;

use crate::error::{StreamError, StreamResult};
use crate::frame::{FrameBuffer, FrameMetadata};
use crate::mode::{ModeCatalog, StreamFlags, StreamKind, StreamMode};

use super::backend::StreamBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Uninitialized,
    Initialized,
    Closed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Uninitialized => f.write_str("uninitialized"),
            StreamState::Initialized => f.write_str("initialized"),
            StreamState::Closed => f.write_str("closed"),
        }
    }
}

/// Statistics for a device stream.
#[derive(Clone, Debug)]
pub struct StreamStats {
    pub backend: &'static str,
    pub frames_read: u64,
    pub timeouts: u64,
}

pub struct DeviceStream<B: StreamBackend> {
    backend: B,
    state: StreamState,
    catalog: ModeCatalog,
    active_mode: Option<StreamMode>,
    flags: StreamFlags,
    frames_read: u64,
    timeouts: u64,
}

impl<B: StreamBackend> DeviceStream<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: StreamState::Uninitialized,
            catalog: ModeCatalog::new(),
            active_mode: None,
            flags: StreamFlags::default(),
            frames_read: 0,
            timeouts: 0,
        }
    }

    /// Claim backend resources, build the mode catalog and select the first
    /// advertised mode.
    pub fn initialize(&mut self) -> StreamResult<()> {
        match self.state {
            StreamState::Initialized => return Ok(()),
            StreamState::Closed => return Err(self.invalid_state("initialize")),
            StreamState::Uninitialized => {}
        }

        let name = self.backend.name();
        self.backend
            .open()
            .map_err(|err| as_unavailable(name, err))?;

        if let Err(err) = self.populate_catalog() {
            self.backend.close();
            self.catalog.clear();
            return Err(err);
        }

        self.state = StreamState::Initialized;
        if let Some(mode) = self.active_mode {
            log::info!(
                "DeviceStream: {} stream '{}' initialized with {} modes, active {}",
                self.backend.kind(),
                name,
                self.catalog.len(),
                mode
            );
        }
        Ok(())
    }

    fn populate_catalog(&mut self) -> StreamResult<()> {
        let name = self.backend.name();
        let modes = self
            .backend
            .query_modes()
            .map_err(|err| as_unavailable(name, err))?;
        for mode in modes {
            self.catalog.add(mode);
        }

        let default = *self
            .catalog
            .first()
            .ok_or_else(|| StreamError::unavailable(name, "backend advertised no stream modes"))?;
        self.backend.set_mode(&default)?;
        self.backend.set_flags(self.flags);
        self.active_mode = Some(default);
        Ok(())
    }

    /// Switch the active mode. The catalog is left untouched and the previous
    /// mode stays active if the backend rejects the switch.
    pub fn set_active_mode(&mut self, mode: StreamMode) -> StreamResult<()> {
        self.require_initialized("set active mode")?;
        if !self.catalog.contains(&mode) {
            log::warn!(
                "DeviceStream: '{}' rejected unsupported mode {}",
                self.backend.name(),
                mode
            );
            return Err(StreamError::UnsupportedMode { mode });
        }

        self.backend.set_mode(&mode)?;
        if self.active_mode != Some(mode) {
            log::info!("DeviceStream: '{}' switched to {}", self.backend.name(), mode);
        }
        self.active_mode = Some(mode);
        Ok(())
    }

    /// Bytes one frame of the active mode occupies.
    pub fn required_bytes(&self) -> StreamResult<usize> {
        self.require_initialized("query frame size")?;
        Ok(self.current_mode()?.frame_bytes())
    }

    /// Read one frame into `dest`.
    ///
    /// Writes exactly the active mode's byte count. On any error `dest` is
    /// left unmodified.
    pub fn read_into(&mut self, dest: &mut [u8], timeout: Duration) -> StreamResult<FrameMetadata> {
        self.require_initialized("read")?;
        let mode = self.current_mode()?;
        let required = mode.frame_bytes();
        if dest.len() < required {
            return Err(StreamError::BufferTooSmall {
                required,
                provided: dest.len(),
            });
        }

        let timestamp_us = match self.backend.poll_frame(&mut dest[..required], timeout) {
            Ok(timestamp_us) => timestamp_us,
            Err(err @ StreamError::Timeout { .. }) => {
                self.timeouts += 1;
                log::debug!(
                    "DeviceStream: '{}' read timed out after {:?}",
                    self.backend.name(),
                    timeout
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let metadata = FrameMetadata {
            width: mode.width,
            height: mode.height,
            bytes_per_pixel: mode.bytes_per_pixel(),
            timestamp_us,
            sequence: self.frames_read,
        };
        self.frames_read += 1;
        log::trace!(
            "DeviceStream: '{}' frame {} at {}us",
            self.backend.name(),
            metadata.sequence,
            timestamp_us
        );
        Ok(metadata)
    }

    /// Read one frame into a reusable `FrameBuffer`, sizing it for the active mode.
    pub fn read_frame(&mut self, buffer: &mut FrameBuffer, timeout: Duration) -> StreamResult<FrameMetadata> {
        self.require_initialized("read")?;
        buffer.ensure_mode(&self.current_mode()?);
        let metadata = self.read_into(buffer.as_mut_bytes(), timeout)?;
        buffer.set_metadata(metadata);
        Ok(metadata)
    }

    /// Release backend resources. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        if self.state == StreamState::Initialized {
            self.backend.close();
            log::info!(
                "DeviceStream: '{}' closed after {} frames",
                self.backend.name(),
                self.frames_read
            );
        }
        self.state = StreamState::Closed;
        self.active_mode = None;
        self.catalog.clear();
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn kind(&self) -> StreamKind {
        self.backend.kind()
    }

    pub fn available_modes(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn active_mode(&self) -> Option<StreamMode> {
        self.active_mode
    }

    pub fn flags(&self) -> StreamFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: StreamFlags) {
        self.flags = flags;
        if self.state == StreamState::Initialized {
            self.backend.set_flags(flags);
        }
    }

    /// Read-only access for rendering and debug paths.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            backend: self.backend.name(),
            frames_read: self.frames_read,
            timeouts: self.timeouts,
        }
    }

    fn current_mode(&self) -> StreamResult<StreamMode> {
        self.active_mode
            .ok_or_else(|| self.invalid_state("use active mode"))
    }

    fn require_initialized(&self, operation: &'static str) -> StreamResult<()> {
        if self.state == StreamState::Initialized {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> StreamError {
        StreamError::InvalidState {
            state: self.state,
            operation,
        }
    }
}

impl<B: StreamBackend> Drop for DeviceStream<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn as_unavailable(backend: &'static str, err: StreamError) -> StreamError {
    match err {
        err @ StreamError::BackendUnavailable { .. } => err,
        other => StreamError::unavailable(backend, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::PixelFormat;

    /// Backend that records calls and fills frames with a constant.
    struct RecordingBackend {
        modes: Vec<StreamMode>,
        fail_open: bool,
        open: bool,
        closes: u32,
        set_modes: Vec<StreamMode>,
        fill: u8,
        timeout_next: bool,
    }

    impl RecordingBackend {
        fn new(modes: Vec<StreamMode>) -> Self {
            Self {
                modes,
                fail_open: false,
                open: false,
                closes: 0,
                set_modes: Vec::new(),
                fill: 0xAB,
                timeout_next: false,
            }
        }
    }

    impl StreamBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn kind(&self) -> StreamKind {
            StreamKind::Color
        }

        fn open(&mut self) -> StreamResult<()> {
            if self.fail_open {
                return Err(StreamError::Timeout {
                    timeout: Duration::ZERO,
                });
            }
            self.open = true;
            Ok(())
        }

        fn query_modes(&self) -> StreamResult<Vec<StreamMode>> {
            Ok(self.modes.clone())
        }

        fn set_mode(&mut self, mode: &StreamMode) -> StreamResult<()> {
            self.set_modes.push(*mode);
            Ok(())
        }

        fn poll_frame(&mut self, dest: &mut [u8], timeout: Duration) -> StreamResult<u64> {
            if std::mem::take(&mut self.timeout_next) {
                return Err(StreamError::Timeout { timeout });
            }
            dest.fill(self.fill);
            Ok(42)
        }

        fn close(&mut self) {
            self.open = false;
            self.closes += 1;
        }
    }

    fn rgb(width: u32, height: u32, fps: u32) -> StreamMode {
        StreamMode::new(width, height, fps, PixelFormat::Rgb888)
    }

    #[test]
    fn initialize_selects_first_advertised_mode() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30), rgb(8, 4, 30)]));
        assert_eq!(stream.state(), StreamState::Uninitialized);
        stream.initialize()?;

        assert_eq!(stream.state(), StreamState::Initialized);
        assert_eq!(stream.active_mode(), Some(rgb(4, 2, 30)));
        assert_eq!(stream.available_modes().len(), 2);
        assert_eq!(stream.backend().set_modes, vec![rgb(4, 2, 30)]);
        Ok(())
    }

    #[test]
    fn open_failures_surface_as_backend_unavailable() {
        let mut backend = RecordingBackend::new(vec![rgb(4, 2, 30)]);
        backend.fail_open = true;
        let mut stream = DeviceStream::new(backend);

        let err = stream.initialize().unwrap_err();
        assert!(matches!(err, StreamError::BackendUnavailable { backend: "recording", .. }));
        assert_eq!(stream.state(), StreamState::Uninitialized);
    }

    #[test]
    fn empty_catalog_fails_and_releases_backend() {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![]));
        let err = stream.initialize().unwrap_err();
        assert!(matches!(err, StreamError::BackendUnavailable { .. }));
        assert_eq!(stream.backend().closes, 1);
        assert!(!stream.backend().open);
    }

    #[test]
    fn reads_require_initialization() {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        let mut dest = [0u8; 24];
        let err = stream.read_into(&mut dest, Duration::ZERO).unwrap_err();
        assert_eq!(
            err,
            StreamError::InvalidState {
                state: StreamState::Uninitialized,
                operation: "read"
            }
        );
    }

    #[test]
    fn read_writes_exactly_active_mode_bytes() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        stream.initialize()?;

        let mut dest = [0u8; 30];
        let metadata = stream.read_into(&mut dest, Duration::ZERO)?;
        assert_eq!(metadata.byte_len(), 24);
        assert_eq!(metadata.timestamp_us, 42);
        assert!(dest[..24].iter().all(|&b| b == 0xAB));
        assert!(dest[24..].iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn short_buffer_is_rejected_untouched() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        stream.initialize()?;

        let mut dest = [0x11u8; 23];
        let err = stream.read_into(&mut dest, Duration::ZERO).unwrap_err();
        assert_eq!(
            err,
            StreamError::BufferTooSmall {
                required: 24,
                provided: 23
            }
        );
        assert!(dest.iter().all(|&b| b == 0x11));
        assert_eq!(stream.stats().frames_read, 0);
        Ok(())
    }

    #[test]
    fn timeouts_are_counted_and_retryable() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        stream.initialize()?;
        stream.backend.timeout_next = true;

        let mut dest = [0u8; 24];
        let err = stream.read_into(&mut dest, Duration::from_millis(3)).unwrap_err();
        assert!(err.is_transient());
        assert!(dest.iter().all(|&b| b == 0));

        stream.read_into(&mut dest, Duration::from_millis(3))?;
        let stats = stream.stats();
        assert_eq!((stats.frames_read, stats.timeouts), (1, 1));
        Ok(())
    }

    #[test]
    fn unsupported_mode_keeps_active_mode() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        stream.initialize()?;

        let err = stream.set_active_mode(rgb(4, 2, 60)).unwrap_err();
        assert_eq!(err, StreamError::UnsupportedMode { mode: rgb(4, 2, 60) });
        assert_eq!(stream.active_mode(), Some(rgb(4, 2, 30)));
        Ok(())
    }

    #[test]
    fn shutdown_is_idempotent_and_final() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        stream.initialize()?;
        stream.shutdown();
        stream.shutdown();

        assert_eq!(stream.state(), StreamState::Closed);
        assert_eq!(stream.backend().closes, 1);
        assert!(stream.initialize().is_err());
        assert!(stream.set_active_mode(rgb(4, 2, 30)).is_err());
        Ok(())
    }

    #[test]
    fn flags_reach_backend_after_initialize() -> StreamResult<()> {
        let mut stream = DeviceStream::new(RecordingBackend::new(vec![rgb(4, 2, 30)]));
        let flags = StreamFlags {
            mirrored: true,
            registered: false,
        };
        stream.set_flags(flags);
        stream.initialize()?;
        assert_eq!(stream.flags(), flags);
        Ok(())
    }
}
