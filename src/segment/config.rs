use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROCESSING_WIDTH: usize = 160;
pub const DEFAULT_PROCESSING_HEIGHT: usize = 120;
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.05;
pub const DEFAULT_FOREGROUND_THRESHOLD: f32 = 0.02;
pub const DEFAULT_MAX_DEPTH_JUMP_PERCENT: f32 = 0.1;
pub const DEFAULT_ERODE_SIZE: usize = 1;

/// Tunable constants of the depth segmentation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Resolution all temporal state is kept at, independent of the sensor.
    pub processing_width: usize,
    pub processing_height: usize,
    /// Weight of the new frame in the running depth average.
    pub smoothing_factor: f32,
    /// Relative velocity a pixel must exceed to be foreground.
    pub foreground_threshold: f32,
    /// Relative frame-to-frame change treated as a discontinuity, not motion.
    pub max_depth_jump_percent: f32,
    /// Half-width of the square erosion element.
    pub erode_size: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            processing_width: DEFAULT_PROCESSING_WIDTH,
            processing_height: DEFAULT_PROCESSING_HEIGHT,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            foreground_threshold: DEFAULT_FOREGROUND_THRESHOLD,
            max_depth_jump_percent: DEFAULT_MAX_DEPTH_JUMP_PERCENT,
            erode_size: DEFAULT_ERODE_SIZE,
        }
    }
}

impl SegmentationConfig {
    pub fn with_processing_size(mut self, width: usize, height: usize) -> Self {
        self.processing_width = width;
        self.processing_height = height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing_width == 0 || self.processing_height == 0 {
            return Err(anyhow!(
                "processing resolution must be non-zero, got {}x{}",
                self.processing_width,
                self.processing_height
            ));
        }
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(anyhow!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            ));
        }
        if !(self.foreground_threshold >= 0.0) {
            return Err(anyhow!(
                "foreground_threshold must be non-negative, got {}",
                self.foreground_threshold
            ));
        }
        if !(self.max_depth_jump_percent >= 0.0) {
            return Err(anyhow!(
                "max_depth_jump_percent must be non-negative, got {}",
                self.max_depth_jump_percent
            ));
        }
        Ok(())
    }
}
