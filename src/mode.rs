//! Stream mode catalog.
//!
//! A `StreamMode` describes one capture configuration a backend can produce.
//! Each stream owns an ordered `ModeCatalog`; advertisement order is kept so
//! the first advertised mode can serve as the default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb888,
    Rgba8888,
    Gray8,
    Gray16,
    /// Little-endian signed 16-bit depth, one reading per pixel. 0 = no data.
    Depth16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgba8888 => 4,
            PixelFormat::Gray8 => 1,
            PixelFormat::Gray16 | PixelFormat::Depth16 => 2,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Rgb888 => "rgb888",
            PixelFormat::Rgba8888 => "rgba8888",
            PixelFormat::Gray8 => "gray8",
            PixelFormat::Gray16 => "gray16",
            PixelFormat::Depth16 => "depth16",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb888" | "rgb" => Ok(PixelFormat::Rgb888),
            "rgba8888" | "rgba" => Ok(PixelFormat::Rgba8888),
            "gray8" => Ok(PixelFormat::Gray8),
            "gray16" => Ok(PixelFormat::Gray16),
            "depth16" | "depth" => Ok(PixelFormat::Depth16),
            other => Err(ParseModeError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseModeError {
    #[error("expected WIDTHxHEIGHT@FPS, got '{0}'")]
    Malformed(String),
    #[error("unknown pixel format '{0}'")]
    UnknownFormat(String),
    #[error("mode dimensions and frame rate must be greater than zero")]
    Zero,
}

/// One capture configuration. Equality covers all four fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamMode {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub pixel_format: PixelFormat,
}

impl StreamMode {
    pub const fn new(width: u32, height: u32, frame_rate: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            frame_rate,
            pixel_format,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.frame_rate > 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.pixel_format.bytes_per_pixel()
    }

    /// Byte length of one frame in this mode.
    pub fn frame_bytes(&self) -> usize {
        self.pixel_count() * self.bytes_per_pixel()
    }

    /// Parse `WxH@FPS` with an optional trailing format, using `default_format`
    /// when the format is omitted.
    pub fn parse_with_default(s: &str, default_format: PixelFormat) -> Result<Self, ParseModeError> {
        let s = s.trim();
        let (geometry, format) = match s.split_once(|c: char| c == ' ' || c == ':') {
            Some((geometry, format)) => (geometry, format.parse()?),
            None => (s, default_format),
        };
        let (size, rate) = geometry
            .split_once('@')
            .ok_or_else(|| ParseModeError::Malformed(s.to_string()))?;
        let (width, height) = parse_size(size).ok_or_else(|| ParseModeError::Malformed(s.to_string()))?;
        let frame_rate = rate
            .trim()
            .parse()
            .map_err(|_| ParseModeError::Malformed(s.to_string()))?;

        let mode = StreamMode::new(width, height, frame_rate, format);
        if !mode.is_valid() {
            return Err(ParseModeError::Zero);
        }
        Ok(mode)
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{} {}",
            self.width, self.height, self.frame_rate, self.pixel_format
        )
    }
}

impl FromStr for StreamMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.trim().contains([' ', ':']) {
            return Err(ParseModeError::Malformed(s.to_string()));
        }
        StreamMode::parse_with_default(s, PixelFormat::Rgb888)
    }
}

/// Parse `WxH`.
pub fn parse_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Ordered, duplicate-free set of modes a stream advertises.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeCatalog {
    modes: Vec<StreamMode>,
}

impl ModeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mode. Invalid and duplicate modes are rejected.
    pub fn add(&mut self, mode: StreamMode) -> bool {
        if !mode.is_valid() {
            log::warn!("ModeCatalog: rejecting invalid mode {}", mode);
            return false;
        }
        if self.contains(&mode) {
            return false;
        }
        self.modes.push(mode);
        true
    }

    pub fn contains(&self, mode: &StreamMode) -> bool {
        self.modes.contains(mode)
    }

    /// First advertised mode.
    pub fn first(&self) -> Option<&StreamMode> {
        self.modes.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamMode> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn clear(&mut self) {
        self.modes.clear();
    }
}

impl<'a> IntoIterator for &'a ModeCatalog {
    type Item = &'a StreamMode;
    type IntoIter = std::slice::Iter<'a, StreamMode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Color,
    Depth,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Color => f.write_str("color"),
            StreamKind::Depth => f.write_str("depth"),
        }
    }
}

/// Per-stream presentation flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamFlags {
    pub mirrored: bool,
    /// Depth is registered to the color camera's viewpoint.
    pub registered: bool,
}

impl StreamFlags {
    pub fn has_flags(&self) -> bool {
        self.mirrored || self.registered
    }
}

impl fmt::Display for StreamFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [(self.mirrored, "mirrored"), (self.registered, "registered")]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect();
        f.write_str(&names.join(","))
    }
}
