use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::mode::{parse_size, PixelFormat, StreamMode};
use crate::segment::SegmentationConfig;

const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Deserialize, Default)]
struct SensorConfigFile {
    color: Option<StreamMode>,
    depth: Option<StreamMode>,
    read_timeout_ms: Option<u64>,
    segmentation: Option<SegmentationConfig>,
}

/// Runtime configuration for the sensor streams and the segmentation engine.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Preferred color mode. `None` keeps the first advertised mode.
    pub color_mode: Option<StreamMode>,
    /// Preferred depth mode. `None` keeps the first advertised mode.
    pub depth_mode: Option<StreamMode>,
    pub read_timeout: Duration,
    pub segmentation: SegmentationConfig,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            color_mode: None,
            depth_mode: None,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl SensorConfig {
    /// Load from the file named by `SENSOR_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENSOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SensorConfigFile) -> Self {
        Self {
            color_mode: file.color,
            depth_mode: file.depth,
            read_timeout: Duration::from_millis(
                file.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS),
            ),
            segmentation: file.segmentation.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(mode) = env_value("SENSOR_DEPTH_MODE") {
            self.depth_mode = Some(
                StreamMode::parse_with_default(&mode, PixelFormat::Depth16)
                    .context("SENSOR_DEPTH_MODE")?,
            );
        }
        if let Some(mode) = env_value("SENSOR_COLOR_MODE") {
            self.color_mode = Some(
                StreamMode::parse_with_default(&mode, PixelFormat::Rgb888)
                    .context("SENSOR_COLOR_MODE")?,
            );
        }
        if let Some(size) = env_value("SENSOR_PROCESSING_SIZE") {
            let (width, height) = parse_size(&size)
                .ok_or_else(|| anyhow!("SENSOR_PROCESSING_SIZE must look like 160x120"))?;
            self.segmentation.processing_width = width as usize;
            self.segmentation.processing_height = height as usize;
        }
        if let Some(timeout) = env_value("SENSOR_READ_TIMEOUT_MS") {
            let millis: u64 = timeout.parse().map_err(|_| {
                anyhow!("SENSOR_READ_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.read_timeout = Duration::from_millis(millis);
        }
        if let Some(factor) = env_value("SENSOR_SMOOTHING_FACTOR") {
            self.segmentation.smoothing_factor = factor
                .parse()
                .map_err(|_| anyhow!("SENSOR_SMOOTHING_FACTOR must be a number"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.segmentation.validate()?;
        if let Some(mode) = self.depth_mode {
            if mode.pixel_format != PixelFormat::Depth16 {
                return Err(anyhow!("depth mode {} must use depth16", mode));
            }
        }
        for mode in [self.color_mode, self.depth_mode].into_iter().flatten() {
            if !mode.is_valid() {
                return Err(anyhow!("stream mode {} has a zero dimension", mode));
            }
        }
        if self.read_timeout.is_zero() {
            return Err(anyhow!("read timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<SensorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
