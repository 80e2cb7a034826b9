//! Depth stream to foreground mask.
//!
//! `ForegroundPipeline` is the frame consumer: it reads from a `DepthStream`
//! and drives a `DepthProcessor` one frame at a time, in capture order.

use std::time::Duration;

use anyhow::Result;

use crate::error::StreamResult;
use crate::frame::{DepthFrame, FrameMetadata};
use crate::mode::StreamMode;
use crate::segment::{DepthProcessor, ForegroundMask, SegmentationConfig};
use crate::stream::{DepthStream, StreamBackend};

/// A processed frame: the depth read's metadata and the resulting mask.
pub struct SegmentedFrame<'a> {
    pub metadata: FrameMetadata,
    pub mask: &'a ForegroundMask,
}

pub struct ForegroundPipeline<B: StreamBackend> {
    stream: DepthStream<B>,
    frame: DepthFrame,
    processor: DepthProcessor,
}

impl<B: StreamBackend> ForegroundPipeline<B> {
    pub fn new(backend: B, config: SegmentationConfig) -> Result<Self> {
        Ok(Self {
            stream: DepthStream::new(backend),
            frame: DepthFrame::new(),
            processor: DepthProcessor::new(config)?,
        })
    }

    /// Initialize the depth stream.
    pub fn start(&mut self) -> StreamResult<()> {
        self.stream.initialize()
    }

    /// Switch the native depth mode.
    ///
    /// Temporal state gathered at another native mode is discarded.
    pub fn set_depth_mode(&mut self, mode: StreamMode) -> StreamResult<()> {
        let previous = self.stream.active_mode();
        self.stream.set_active_mode(mode)?;
        if previous != Some(mode) {
            self.processor.reset();
        }
        Ok(())
    }

    /// Change the processing resolution; resets the engine.
    pub fn set_processing_size(&mut self, width: usize, height: usize) -> Result<()> {
        self.processor.set_processing_size(width, height)
    }

    /// Read one depth frame and segment it.
    ///
    /// A timed-out read leaves the engine untouched.
    pub fn step(&mut self, timeout: Duration) -> StreamResult<SegmentedFrame<'_>> {
        let metadata = self.stream.read_frame(&mut self.frame, timeout)?;
        let mask = self.processor.process_frame(self.frame.view());
        Ok(SegmentedFrame { metadata, mask })
    }

    pub fn mask(&self) -> Option<&ForegroundMask> {
        self.processor.mask()
    }

    pub fn processor(&self) -> &DepthProcessor {
        &self.processor
    }

    /// Last decoded native depth frame.
    pub fn depth_frame(&self) -> &DepthFrame {
        &self.frame
    }

    pub fn stream(&self) -> &DepthStream<B> {
        &self.stream
    }

    pub fn shutdown(&mut self) {
        self.stream.shutdown();
    }
}
