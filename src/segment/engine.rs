//! Temporal depth segmentation.
//!
//! `DepthProcessor` turns a sequence of native-resolution depth frames into a
//! foreground mask at a fixed processing resolution. Per frame:
//!
//! 1. convert depth to `f32` at native resolution (0 = no data)
//! 2. nearest-neighbor downsample to the processing resolution
//! 3. `velocity = (depth - average) / average`
//! 4. `average += smoothing_factor * (depth - average)`
//! 5. zero/jump filter against the previous frame: on dropout or a relative
//!    jump above `max_depth_jump_percent`, snap the average to the new depth
//!    and zero the velocity
//! 6. erode `|velocity|` with a square element to remove single-pixel spikes
//! 7. foreground iff eroded velocity > `foreground_threshold`
//!
//! The processor is not synchronized. Its running average is a recurrence
//! that is only meaningful for one temporally ordered sequence of frames, so
//! feed each camera from a single thread.

use anyhow::{anyhow, Result};
use ndarray::{Array2, ArrayView2, Zip};

use crate::frame::DepthImage;

use super::config::SegmentationConfig;
use super::mask::{ForegroundMask, PixelType};
use super::morphology::{erode, resize_nearest};

pub struct DepthProcessor {
    config: SegmentationConfig,
    depth_full: Array2<f32>,
    depth: Array2<f32>,
    previous: Array2<f32>,
    average: Array2<f32>,
    velocity: Array2<f32>,
    velocity_abs: Array2<f32>,
    velocity_eroded: Array2<f32>,
    erode_scratch: Array2<f32>,
    mask: ForegroundMask,
    frames_since_reset: u64,
    frames_processed: u64,
}

impl DepthProcessor {
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        let shape = (config.processing_height, config.processing_width);
        Ok(Self {
            depth_full: Array2::zeros((0, 0)),
            depth: Array2::zeros(shape),
            previous: Array2::zeros(shape),
            average: Array2::zeros(shape),
            velocity: Array2::zeros(shape),
            velocity_abs: Array2::zeros(shape),
            velocity_eroded: Array2::zeros(shape),
            erode_scratch: Array2::zeros(shape),
            mask: ForegroundMask::new(config.processing_width, config.processing_height),
            frames_since_reset: 0,
            frames_processed: 0,
            config,
        })
    }

    /// Clear temporal state. A mask is unavailable until the next frame.
    pub fn reset(&mut self) {
        self.previous.fill(0.0);
        self.average.fill(0.0);
        self.mask = ForegroundMask::new(self.config.processing_width, self.config.processing_height);
        self.frames_since_reset = 0;
        log::debug!(
            "DepthProcessor: reset at {}x{}",
            self.config.processing_width,
            self.config.processing_height
        );
    }

    /// Change the processing resolution. Always resets temporal state.
    pub fn set_processing_size(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "processing resolution must be non-zero, got {}x{}",
                width,
                height
            ));
        }
        self.config.processing_width = width;
        self.config.processing_height = height;
        let shape = (height, width);
        for state in [
            &mut self.depth,
            &mut self.previous,
            &mut self.average,
            &mut self.velocity,
            &mut self.velocity_abs,
            &mut self.velocity_eroded,
            &mut self.erode_scratch,
        ] {
            *state = Array2::zeros(shape);
        }
        self.reset();
        Ok(())
    }

    /// Process one native-resolution depth frame and return the updated mask.
    ///
    /// # Panics
    ///
    /// Panics if `frame.data` does not hold exactly `width * height` samples.
    pub fn process_frame(&mut self, frame: DepthImage<'_>) -> &ForegroundMask {
        assert_eq!(
            frame.data.len(),
            frame.width * frame.height,
            "depth frame holds {} samples but claims {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        );

        self.load_full_size(frame);
        resize_nearest(self.depth_full.view(), &mut self.depth);
        self.update_velocity_and_average();
        self.filter_zero_values_and_jumps();

        Zip::from(&mut self.velocity_abs)
            .and(&self.velocity)
            .for_each(|abs, &v| *abs = v.abs());
        erode(
            self.velocity_abs.view(),
            &mut self.erode_scratch,
            &mut self.velocity_eroded,
            self.config.erode_size,
        );
        self.threshold_foreground();

        self.frames_since_reset += 1;
        self.frames_processed += 1;
        log::trace!(
            "DepthProcessor: frame {} has {} foreground pixels",
            self.frames_processed,
            self.mask.foreground_count()
        );
        &self.mask
    }

    fn load_full_size(&mut self, frame: DepthImage<'_>) {
        if self.depth_full.dim() != (frame.height, frame.width) {
            self.depth_full = Array2::zeros((frame.height, frame.width));
        }
        for (dst, &src) in self.depth_full.iter_mut().zip(frame.data) {
            *dst = f32::from(src);
        }
    }

    fn update_velocity_and_average(&mut self) {
        // Relative change, not absolute. A zero average yields a non-finite
        // value that the zero/jump filter or the clamp below resolves.
        Zip::from(&mut self.velocity)
            .and(&self.depth)
            .and(&self.average)
            .for_each(|v, &d, &avg| *v = (d - avg) / avg);

        let alpha = self.config.smoothing_factor;
        Zip::from(&mut self.average)
            .and(&self.depth)
            .for_each(|avg, &d| *avg += alpha * (d - *avg));
    }

    fn filter_zero_values_and_jumps(&mut self) {
        let max_jump = self.config.max_depth_jump_percent;
        Zip::from(&self.depth)
            .and(&mut self.previous)
            .and(&mut self.average)
            .and(&mut self.velocity)
            .for_each(|&depth, previous, avg, v| {
                let prev = *previous;
                let delta_percent = (depth - prev).abs() / prev;
                if depth == 0.0 || prev == 0.0 || (delta_percent > max_jump && delta_percent > 0.0) {
                    // Edge jumps and dropouts are not motion.
                    *avg = depth;
                    *v = 0.0;
                }
                if !v.is_finite() {
                    *v = 0.0;
                }
                *previous = depth;
            });
    }

    fn threshold_foreground(&mut self) {
        let threshold = self.config.foreground_threshold;
        for (i, &v) in self.velocity_eroded.iter().enumerate() {
            self.mask.set(i, PixelType::classify(v, threshold));
        }
    }

    /// Mask of the latest frame, or `None` if no frame was processed since
    /// construction or the last reset.
    pub fn mask(&self) -> Option<&ForegroundMask> {
        (self.frames_since_reset > 0).then_some(&self.mask)
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// `(width, height)` of the processing resolution.
    pub fn processing_size(&self) -> (usize, usize) {
        (self.config.processing_width, self.config.processing_height)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Latest frame at native resolution.
    pub fn full_size_depth(&self) -> ArrayView2<'_, f32> {
        self.depth_full.view()
    }

    /// Latest frame at processing resolution.
    pub fn depth(&self) -> ArrayView2<'_, f32> {
        self.depth.view()
    }

    pub fn previous_depth(&self) -> ArrayView2<'_, f32> {
        self.previous.view()
    }

    pub fn average_depth(&self) -> ArrayView2<'_, f32> {
        self.average.view()
    }

    pub fn velocity(&self) -> ArrayView2<'_, f32> {
        self.velocity.view()
    }

    pub fn eroded_velocity(&self) -> ArrayView2<'_, f32> {
        self.velocity_eroded.view()
    }
}
