//! Frame payloads handed from a stream to its consumer.
//!
//! - `FrameBuffer`: caller-owned byte region reused across reads.
//! - `FrameMetadata`: dimensions and timestamp reported with each read.
//! - `DepthFrame` / `DepthImage`: decoded native-resolution depth, owned and borrowed.

use crate::mode::StreamMode;

/// Metadata reported for each frame read from a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameMetadata {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: usize,
    /// Capture time in microseconds, monotonic per stream.
    pub timestamp_us: u64,
    /// Number of frames successfully read from the stream before this one.
    pub sequence: u64,
}

impl FrameMetadata {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel
    }
}

/// Caller-managed destination buffer.
///
/// The stream writes into it and never allocates per frame. The buffer is
/// reallocated only when the active mode's frame size changes.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
    metadata: Option<FrameMetadata>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a buffer sized for one frame of `mode`.
    pub fn for_mode(mode: &StreamMode) -> Self {
        Self {
            data: vec![0u8; mode.frame_bytes()],
            metadata: None,
        }
    }

    /// Ensure the buffer holds exactly one frame of `mode`.
    ///
    /// A size change discards the old allocation rather than resizing it in place.
    pub fn ensure_mode(&mut self, mode: &StreamMode) {
        let required = mode.frame_bytes();
        if self.data.len() != required {
            self.data = vec![0u8; required];
            self.metadata = None;
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Metadata of the last frame written, if any.
    pub fn metadata(&self) -> Option<&FrameMetadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn set_metadata(&mut self, metadata: FrameMetadata) {
        self.metadata = Some(metadata);
    }
}

/// Borrowed native-resolution depth image. A reading of 0 means no data.
#[derive(Clone, Copy, Debug)]
pub struct DepthImage<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [i16],
}

impl<'a> DepthImage<'a> {
    pub fn new(width: usize, height: usize, data: &'a [i16]) -> Self {
        Self {
            width,
            height,
            data,
        }
    }
}

/// Owned decoded depth frame, reused across reads.
#[derive(Clone, Debug, Default)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    data: Vec<i16>,
    metadata: Option<FrameMetadata>,
}

impl DepthFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[i16] {
        &self.data
    }

    pub fn metadata(&self) -> Option<&FrameMetadata> {
        self.metadata.as_ref()
    }

    pub fn view(&self) -> DepthImage<'_> {
        DepthImage::new(self.width, self.height, &self.data)
    }

    /// Resize for a new native resolution. No-op when unchanged.
    pub(crate) fn ensure_size(&mut self, width: usize, height: usize) -> &mut [i16] {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.data = vec![0i16; width * height];
            self.metadata = None;
        }
        &mut self.data
    }

    pub(crate) fn set_metadata(&mut self, metadata: FrameMetadata) {
        self.metadata = Some(metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::PixelFormat;

    #[test]
    fn frame_buffer_reallocates_only_on_size_change() {
        let small = StreamMode::new(320, 240, 30, PixelFormat::Rgb888);
        let fast = StreamMode::new(320, 240, 60, PixelFormat::Rgb888);
        let large = StreamMode::new(640, 480, 30, PixelFormat::Rgb888);

        let mut buffer = FrameBuffer::for_mode(&small);
        assert_eq!(buffer.len(), 320 * 240 * 3);
        buffer.as_mut_bytes()[0] = 7;

        buffer.ensure_mode(&fast);
        assert_eq!(buffer.as_bytes()[0], 7);

        buffer.ensure_mode(&large);
        assert_eq!(buffer.len(), 640 * 480 * 3);
        assert_eq!(buffer.as_bytes()[0], 0);
    }

    #[test]
    fn depth_frame_view_matches_size() {
        let mut frame = DepthFrame::new();
        frame.ensure_size(4, 2).fill(250);
        let view = frame.view();
        assert_eq!((view.width, view.height), (4, 2));
        assert_eq!(view.data.len(), 8);
        assert!(view.data.iter().all(|&d| d == 250));
    }
}
