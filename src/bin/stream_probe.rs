//! stream_probe - list modes and read one frame from each simulated stream

use anyhow::Result;
use clap::Parser;

use depthstream::{
    DepthFrame, DepthScene, DepthStream, DeviceStream, FrameBuffer, MockColorBackend,
    MockDepthBackend, SensorConfig, StreamFlags,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Mark the color stream as mirrored.
    #[arg(long)]
    mirrored: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = SensorConfig::load()?;

    let mut color = DeviceStream::new(MockColorBackend::new());
    color.set_flags(StreamFlags {
        mirrored: args.mirrored,
        registered: false,
    });
    color.initialize()?;
    if let Some(mode) = config.color_mode {
        color.set_active_mode(mode)?;
    }
    println!("color modes:");
    for mode in color.available_modes() {
        println!("  {}", mode);
    }
    let mut buffer = FrameBuffer::new();
    let metadata = color.read_frame(&mut buffer, config.read_timeout)?;
    println!(
        "color frame: {}x{} x{} bytes, {} bytes total",
        metadata.width,
        metadata.height,
        metadata.bytes_per_pixel,
        buffer.len()
    );
    if let Some(overlay) = color.backend().overlay_text() {
        println!("overlay: {:?}", overlay);
    }
    color.shutdown();

    let mut depth = DepthStream::new(MockDepthBackend::new(DepthScene::default()));
    depth.initialize()?;
    if let Some(mode) = config.depth_mode {
        depth.set_active_mode(mode)?;
    }
    println!("depth modes:");
    for mode in depth.stream().available_modes() {
        println!("  {}", mode);
    }
    let mut frame = DepthFrame::new();
    let metadata = depth.read_frame(&mut frame, config.read_timeout)?;
    let center = frame.data()[frame.height() / 2 * frame.width() + frame.width() / 2];
    println!(
        "depth frame: {}x{} x{} bytes, center reading {}mm",
        metadata.width, metadata.height, metadata.bytes_per_pixel, center
    );
    depth.shutdown();
    Ok(())
}
