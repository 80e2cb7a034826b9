//! Depth sensor stream abstraction and foreground segmentation.
//!
//! This crate implements the sensor side of a hand-tracking stack.
//!
//! # Architecture
//!
//! Two cores, tightly coupled:
//!
//! 1. **Device streams**: every backend, simulated or hardware, is driven
//!    through the same lifecycle (initialize, negotiate mode, read frames,
//!    shut down) with uniform buffer validation and a single error taxonomy.
//! 2. **Depth segmentation**: a temporal engine that turns noisy depth frames
//!    into a stable foreground/background mask using a running average,
//!    relative velocity, jump rejection and erosion.
//!
//! # Module Structure
//!
//! - `mode`: stream modes, the mode catalog, stream flags
//! - `frame`: frame buffers, metadata, decoded depth frames
//! - `stream`: backend trait, `DeviceStream`, `DepthStream`, backends
//! - `segment`: `DepthProcessor` and the foreground mask
//! - `pipeline`: depth stream feeding the segmentation engine
//! - `config`: file and environment configuration
//! - `convert`: pixel packing helpers

pub mod config;
pub mod convert;
pub mod error;
pub mod frame;
pub mod mode;
pub mod pipeline;
pub mod segment;
pub mod stream;

pub use config::SensorConfig;
pub use error::{StreamError, StreamResult};
pub use frame::{DepthFrame, DepthImage, FrameBuffer, FrameMetadata};
pub use mode::{ModeCatalog, PixelFormat, StreamFlags, StreamKind, StreamMode};
pub use pipeline::{ForegroundPipeline, SegmentedFrame};
pub use segment::{DepthProcessor, ForegroundMask, PixelType, SegmentationConfig};
pub use stream::backends::{
    CallbackBackend, DepthScene, FrameFeeder, MockColorBackend, MockDepthBackend,
};
pub use stream::{DepthStream, DeviceStream, LatestFrame, StreamBackend, StreamState};
