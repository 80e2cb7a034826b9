/// Classification of one processing-resolution pixel.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelType {
    Background = 0,
    Foreground = 1,
}

impl PixelType {
    /// Foreground iff `eroded_velocity` is strictly greater than `threshold`.
    /// NaN classifies as background.
    pub fn classify(eroded_velocity: f32, threshold: f32) -> Self {
        if eroded_velocity > threshold {
            PixelType::Foreground
        } else {
            PixelType::Background
        }
    }
}

/// Foreground/background mask at processing resolution, one byte per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForegroundMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ForegroundMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![PixelType::Background as u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major bytes, each `0` (background) or `1` (foreground).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<PixelType> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(match self.data[y * self.width + x] {
            0 => PixelType::Background,
            _ => PixelType::Foreground,
        })
    }

    pub fn foreground_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&v| v == PixelType::Foreground as u8)
            .count()
    }

    pub(crate) fn set(&mut self, index: usize, pixel: PixelType) {
        self.data[index] = pixel as u8;
    }
}
