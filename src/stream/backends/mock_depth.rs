use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::convert::encode_depth16_le;
use crate::error::{StreamError, StreamResult};
use crate::mode::{PixelFormat, StreamKind, StreamMode};
use crate::stream::backend::StreamBackend;

/// Synthetic depth scene: a flat wall with a disc that approaches the camera
/// in a repeating cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthScene {
    /// Wall distance in millimeters.
    pub background_mm: i16,
    /// Nearest distance the disc reaches before the cycle restarts.
    pub near_mm: i16,
    /// How far the disc moves toward the camera per frame.
    pub approach_mm_per_frame: i16,
    /// Disc radius as a fraction of the shorter frame side.
    pub radius_fraction: f32,
    /// Uniform noise amplitude added to every valid reading.
    pub noise_mm: i16,
    /// Probability that a pixel reads 0 (sensor dropout).
    pub dropout: f32,
    pub seed: u64,
}

impl Default for DepthScene {
    fn default() -> Self {
        Self {
            background_mm: 2000,
            near_mm: 600,
            approach_mm_per_frame: 40,
            radius_fraction: 0.2,
            noise_mm: 0,
            dropout: 0.0,
            seed: 0x5eed,
        }
    }
}

impl DepthScene {
    /// Disc distance on the given frame.
    pub fn object_depth(&self, frame_index: u64) -> i16 {
        let span = i64::from(self.background_mm) - i64::from(self.near_mm);
        let step = i64::from(self.approach_mm_per_frame.max(1));
        let cycle = (span / step).max(1) + 1;
        let offset = (frame_index as i64 % cycle) * step;
        (i64::from(self.background_mm) - offset).max(i64::from(self.near_mm)) as i16
    }
}

/// Simulated depth camera producing little-endian depth16 frames.
pub struct MockDepthBackend {
    modes: Vec<StreamMode>,
    scene: DepthScene,
    available: bool,
    mode: Option<StreamMode>,
    samples: Vec<i16>,
    rng: StdRng,
    frames_generated: u64,
}

impl MockDepthBackend {
    pub fn new(scene: DepthScene) -> Self {
        Self::with_modes(
            vec![
                StreamMode::new(320, 240, 30, PixelFormat::Depth16),
                StreamMode::new(640, 480, 30, PixelFormat::Depth16),
            ],
            scene,
        )
    }

    pub fn with_modes(modes: Vec<StreamMode>, scene: DepthScene) -> Self {
        let rng = StdRng::seed_from_u64(scene.seed);
        Self {
            modes,
            scene,
            available: true,
            mode: None,
            samples: Vec::new(),
            rng,
            frames_generated: 0,
        }
    }

    pub fn unplugged() -> Self {
        Self {
            available: false,
            ..Self::new(DepthScene::default())
        }
    }

    pub fn scene(&self) -> &DepthScene {
        &self.scene
    }

    fn render(&mut self, mode: &StreamMode) {
        let (w, h) = (mode.width as usize, mode.height as usize);
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let radius = w.min(h) as f32 * self.scene.radius_fraction;
        let object_mm = self.scene.object_depth(self.frames_generated);
        let noise = self.scene.noise_mm.max(0);

        for (i, sample) in self.samples.iter_mut().enumerate() {
            let (x, y) = ((i % w) as f32 + 0.5, (i / w) as f32 + 0.5);
            let inside = (x - cx).powi(2) + (y - cy).powi(2) <= radius * radius;
            let mut depth = if inside {
                object_mm
            } else {
                self.scene.background_mm
            };
            if noise > 0 {
                depth = depth.saturating_add(self.rng.gen_range(-noise..=noise));
            }
            if self.scene.dropout > 0.0 && self.rng.gen::<f32>() < self.scene.dropout {
                depth = 0;
            }
            *sample = depth.max(0);
        }
    }
}

impl Default for MockDepthBackend {
    fn default() -> Self {
        Self::new(DepthScene::default())
    }
}

impl StreamBackend for MockDepthBackend {
    fn name(&self) -> &'static str {
        "mock-depth"
    }

    fn kind(&self) -> StreamKind {
        StreamKind::Depth
    }

    fn open(&mut self) -> StreamResult<()> {
        if !self.available {
            return Err(StreamError::unavailable(self.name(), "device not present"));
        }
        log::info!(
            "MockDepthBackend: opened (synthetic, wall at {}mm)",
            self.scene.background_mm
        );
        Ok(())
    }

    fn query_modes(&self) -> StreamResult<Vec<StreamMode>> {
        Ok(self
            .modes
            .iter()
            .copied()
            .filter(|mode| mode.pixel_format == PixelFormat::Depth16)
            .collect())
    }

    fn set_mode(&mut self, mode: &StreamMode) -> StreamResult<()> {
        if mode.pixel_format != PixelFormat::Depth16 {
            return Err(StreamError::UnsupportedMode { mode: *mode });
        }
        self.samples = vec![0i16; mode.pixel_count()];
        self.mode = Some(*mode);
        Ok(())
    }

    fn poll_frame(&mut self, dest: &mut [u8], _timeout: Duration) -> StreamResult<u64> {
        let Some(mode) = self.mode else {
            return Err(StreamError::unavailable("mock-depth", "no active mode"));
        };
        self.render(&mode);
        encode_depth16_le(&self.samples, dest)?;

        let timestamp_us = self.frames_generated * 1_000_000 / u64::from(mode.frame_rate);
        self.frames_generated += 1;
        Ok(timestamp_us)
    }

    fn close(&mut self) {
        self.samples = Vec::new();
        self.mode = None;
    }
}
