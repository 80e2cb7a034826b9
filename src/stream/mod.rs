//! Device streams.
//!
//! This module provides the stream side of the sensor abstraction:
//! - `StreamBackend`: the adapter every backend implements (simulated or hardware)
//! - `DeviceStream`: lifecycle, mode negotiation and buffer validation over a backend
//! - `DepthStream`: depth16 variant decoding frames for the segmentation engine
//! - `LatestFrame`: latest-frame mailbox for callback-driven backends
//!
//! Streams are driven by a single consumer thread calling `read_into`
//! synchronously. Backends never hand out raw driver errors.

mod backend;
pub mod backends;
mod depth;
mod device;
mod latest;

pub use backend::StreamBackend;
pub use depth::DepthStream;
pub use device::{DeviceStream, StreamState, StreamStats};
pub use latest::{CapturedFrame, LatestFrame, SlotStats};
