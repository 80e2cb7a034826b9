use std::time::Duration;

use crate::convert::copy_rgba_to_rgb;
use crate::error::{StreamError, StreamResult};
use crate::mode::{PixelFormat, StreamFlags, StreamKind, StreamMode};
use crate::stream::backend::StreamBackend;

use super::pattern::ColorGenerator;

/// Simulated color camera.
///
/// Each read renders a fresh RGBA test pattern with an overlay describing the
/// active mode and flags, then narrows it to RGB into the destination.
pub struct MockColorBackend {
    modes: Vec<StreamMode>,
    available: bool,
    generator: Option<ColorGenerator>,
    mode: Option<StreamMode>,
    flags: StreamFlags,
    frames_generated: u64,
}

impl MockColorBackend {
    pub fn new() -> Self {
        Self::with_modes(vec![
            StreamMode::new(320, 240, 30, PixelFormat::Rgb888),
            StreamMode::new(320, 240, 60, PixelFormat::Rgb888),
            StreamMode::new(640, 480, 30, PixelFormat::Rgb888),
            StreamMode::new(640, 480, 60, PixelFormat::Rgb888),
        ])
    }

    /// Advertise a custom set of RGB modes.
    pub fn with_modes(modes: Vec<StreamMode>) -> Self {
        Self {
            modes,
            available: true,
            generator: None,
            mode: None,
            flags: StreamFlags::default(),
            frames_generated: 0,
        }
    }

    /// A backend whose device cannot be opened.
    pub fn unplugged() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Overlay rendered on the most recent frame.
    pub fn overlay_text(&self) -> Option<&str> {
        self.generator.as_ref().map(|generator| generator.overlay_text())
    }

    pub fn frames_generated(&self) -> u64 {
        self.frames_generated
    }

    fn build_overlay(mode: &StreamMode, flags: StreamFlags) -> String {
        let mut text = format!("color\n{}\n", mode);
        if flags.has_flags() {
            text.push_str(&format!("({})", flags));
        }
        text
    }
}

impl Default for MockColorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBackend for MockColorBackend {
    fn name(&self) -> &'static str {
        "mock-color"
    }

    fn kind(&self) -> StreamKind {
        StreamKind::Color
    }

    fn open(&mut self) -> StreamResult<()> {
        if !self.available {
            return Err(StreamError::unavailable(self.name(), "device not present"));
        }
        log::info!("MockColorBackend: opened (synthetic)");
        Ok(())
    }

    fn query_modes(&self) -> StreamResult<Vec<StreamMode>> {
        Ok(self
            .modes
            .iter()
            .copied()
            .filter(|mode| mode.pixel_format == PixelFormat::Rgb888)
            .collect())
    }

    fn set_mode(&mut self, mode: &StreamMode) -> StreamResult<()> {
        if mode.pixel_format != PixelFormat::Rgb888 {
            return Err(StreamError::UnsupportedMode { mode: *mode });
        }
        self.generator = Some(ColorGenerator::new(
            mode.width as usize,
            mode.height as usize,
        ));
        self.mode = Some(*mode);
        Ok(())
    }

    fn poll_frame(&mut self, dest: &mut [u8], _timeout: Duration) -> StreamResult<u64> {
        let (Some(mode), Some(generator)) = (self.mode, self.generator.as_mut()) else {
            return Err(StreamError::unavailable("mock-color", "no active mode"));
        };

        generator.set_size(mode.width as usize, mode.height as usize);
        generator.set_overlay_text(Self::build_overlay(&mode, self.flags));
        generator.set_overlay_color(255, 255, 255, 255);
        generator.generate();

        copy_rgba_to_rgb(dest, generator.pixels(), mode.pixel_count())?;

        let timestamp_us = self.frames_generated * 1_000_000 / u64::from(mode.frame_rate);
        self.frames_generated += 1;
        Ok(timestamp_us)
    }

    fn close(&mut self) {
        self.generator = None;
        self.mode = None;
    }

    fn set_flags(&mut self, flags: StreamFlags) {
        self.flags = flags;
    }
}
