//! depth_segment - run the foreground pipeline on the simulated depth sensor

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depthstream::{DepthScene, ForegroundPipeline, MockDepthBackend, SensorConfig, StreamError};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of frames to process (0 = until Ctrl-C).
    #[arg(long, default_value_t = 90)]
    frames: u64,
    /// Depth mode, e.g. 640x480@30 (overrides SENSOR_DEPTH_MODE).
    #[arg(long)]
    mode: Option<String>,
    /// Uniform sensor noise in millimeters.
    #[arg(long, default_value_t = 0)]
    noise_mm: i16,
    /// Fraction of pixels reading 0.
    #[arg(long, default_value_t = 0.0)]
    dropout: f32,
    /// Log a summary every N frames.
    #[arg(long, default_value_t = 10)]
    report_every: u64,
    /// Write the final mask as a grayscale PNG.
    #[cfg(feature = "snapshot")]
    #[arg(long)]
    snapshot: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = SensorConfig::load()?;
    if let Some(mode) = &args.mode {
        config.depth_mode = Some(
            depthstream::StreamMode::parse_with_default(mode, depthstream::PixelFormat::Depth16)
                .context("--mode")?,
        );
    }

    let scene = DepthScene {
        noise_mm: args.noise_mm,
        dropout: args.dropout,
        ..DepthScene::default()
    };
    let mut pipeline = ForegroundPipeline::new(MockDepthBackend::new(scene), config.segmentation.clone())?;
    pipeline.start()?;
    if let Some(mode) = config.depth_mode {
        pipeline.set_depth_mode(mode)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    let (width, height) = pipeline.processor().processing_size();
    log::info!(
        "depth_segment: processing at {}x{}, read timeout {:?}",
        width,
        height,
        config.read_timeout
    );

    let mut processed = 0u64;
    while running.load(Ordering::SeqCst) && (args.frames == 0 || processed < args.frames) {
        let frame = match pipeline.step(config.read_timeout) {
            Ok(frame) => frame,
            Err(err @ StreamError::Timeout { .. }) => {
                log::warn!("depth_segment: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        processed += 1;
        if args.report_every > 0 && processed % args.report_every == 0 {
            log::info!(
                "frame {} ({}x{} @ {}us): {} foreground pixels",
                frame.metadata.sequence,
                frame.metadata.width,
                frame.metadata.height,
                frame.metadata.timestamp_us,
                frame.mask.foreground_count()
            );
        }
    }

    #[cfg(feature = "snapshot")]
    write_snapshot(&args, &pipeline)?;

    let stats = pipeline.stream().stream().stats();
    log::info!(
        "depth_segment: {} frames read, {} timeouts",
        stats.frames_read,
        stats.timeouts
    );
    pipeline.shutdown();
    Ok(())
}

#[cfg(feature = "snapshot")]
fn write_snapshot<B: depthstream::StreamBackend>(args: &Args, pipeline: &ForegroundPipeline<B>) -> Result<()> {
    let (Some(path), Some(mask)) = (&args.snapshot, pipeline.mask()) else {
        return Ok(());
    };
    let pixels: Vec<u8> = mask.as_bytes().iter().map(|&v| v * 255).collect();
    let image = image::GrayImage::from_raw(mask.width() as u32, mask.height() as u32, pixels)
        .ok_or_else(|| anyhow!("mask dimensions do not match its data"))?;
    image
        .save(path)
        .with_context(|| format!("write snapshot {}", path.display()))?;
    log::info!("depth_segment: wrote mask snapshot to {}", path.display());
    Ok(())
}
