use std::time::Duration;

use crate::convert::decode_depth16_le;
use crate::error::{StreamError, StreamResult};
use crate::frame::{DepthFrame, FrameMetadata};
use crate::mode::{PixelFormat, StreamMode};

use super::backend::StreamBackend;
use super::device::DeviceStream;

/// Depth-specific stream.
///
/// Wraps a `DeviceStream` whose modes are `Depth16` and decodes each frame
/// into a reusable `DepthFrame`. Reported metadata is always the native
/// resolution of the negotiated mode with 2 bytes per pixel.
pub struct DepthStream<B: StreamBackend> {
    stream: DeviceStream<B>,
    raw: Vec<u8>,
}

impl<B: StreamBackend> DepthStream<B> {
    pub fn new(backend: B) -> Self {
        Self {
            stream: DeviceStream::new(backend),
            raw: Vec::new(),
        }
    }

    pub fn initialize(&mut self) -> StreamResult<()> {
        self.stream.initialize()?;
        match self.stream.active_mode() {
            Some(mode) if mode.pixel_format == PixelFormat::Depth16 => Ok(()),
            Some(mode) => {
                self.stream.shutdown();
                Err(StreamError::UnsupportedMode { mode })
            }
            None => Err(StreamError::unavailable(
                self.stream.backend().name(),
                "no active depth mode",
            )),
        }
    }

    pub fn set_active_mode(&mut self, mode: StreamMode) -> StreamResult<()> {
        if mode.pixel_format != PixelFormat::Depth16 {
            return Err(StreamError::UnsupportedMode { mode });
        }
        self.stream.set_active_mode(mode)
    }

    /// Read and decode one depth frame into `frame`.
    ///
    /// The raw staging buffer follows the active mode, so it is resized
    /// before every read that follows a mode switch.
    pub fn read_frame(&mut self, frame: &mut DepthFrame, timeout: Duration) -> StreamResult<FrameMetadata> {
        let required = self.stream.required_bytes()?;
        if self.raw.len() != required {
            self.raw.resize(required, 0);
        }
        let metadata = self.stream.read_into(&mut self.raw, timeout)?;
        let samples = frame.ensure_size(metadata.width as usize, metadata.height as usize);
        decode_depth16_le(&self.raw, samples)?;
        frame.set_metadata(metadata);
        Ok(metadata)
    }

    pub fn active_mode(&self) -> Option<StreamMode> {
        self.stream.active_mode()
    }

    pub fn stream(&self) -> &DeviceStream<B> {
        &self.stream
    }

    pub fn shutdown(&mut self) {
        self.stream.shutdown();
        self.raw = Vec::new();
    }
}
