//! Depth foreground segmentation.
//!
//! Turns noisy depth frames into a stable presence mask for downstream hand
//! tracking, using a running average, relative velocity, jump rejection and
//! morphological cleanup.

pub mod config;
mod engine;
mod mask;
pub mod morphology;

pub use config::SegmentationConfig;
pub use engine::DepthProcessor;
pub use mask::{ForegroundMask, PixelType};
