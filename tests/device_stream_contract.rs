use std::thread;
use std::time::Duration;

use depthstream::{
    CallbackBackend, DeviceStream, FrameBuffer, MockColorBackend, PixelFormat, StreamError,
    StreamFlags, StreamKind, StreamMode, StreamState,
};

fn small_color_modes() -> Vec<StreamMode> {
    vec![
        StreamMode::new(16, 12, 30, PixelFormat::Rgb888),
        StreamMode::new(16, 12, 60, PixelFormat::Rgb888),
        StreamMode::new(32, 24, 30, PixelFormat::Rgb888),
    ]
}

#[test]
fn every_advertised_mode_reads_exact_frame_size() {
    let modes = small_color_modes();
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(modes.clone()));
    stream.initialize().expect("initialize");
    assert_eq!(stream.active_mode(), Some(modes[0]));
    assert_eq!(stream.available_modes().len(), modes.len());

    for mode in &modes {
        stream.set_active_mode(*mode).expect("set mode");
        let required = mode.width as usize * mode.height as usize * 3;
        assert_eq!(stream.required_bytes().expect("size"), required);

        let mut dest = vec![0u8; required + 7];
        let meta = stream.read_into(&mut dest, Duration::ZERO).expect("read");
        assert_eq!((meta.width, meta.height), (mode.width, mode.height));
        assert_eq!(meta.byte_len(), required);
        assert!(dest[required..].iter().all(|&b| b == 0));
    }
}

#[test]
fn short_buffer_is_rejected_untouched() {
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(small_color_modes()));
    stream.initialize().expect("initialize");
    let required = stream.required_bytes().expect("size");

    let mut dest = vec![0xAAu8; required - 1];
    let err = stream.read_into(&mut dest, Duration::ZERO).unwrap_err();
    assert_eq!(
        err,
        StreamError::BufferTooSmall {
            required,
            provided: required - 1
        }
    );
    assert!(err.is_caller_error());
    assert!(dest.iter().all(|&b| b == 0xAA));
    assert_eq!(stream.stats().frames_read, 0);
}

#[test]
fn setting_the_same_mode_twice_is_idempotent() {
    let modes = small_color_modes();
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(modes.clone()));
    stream.initialize().expect("initialize");

    stream.set_active_mode(modes[2]).expect("first set");
    let first = stream.required_bytes().expect("size");
    stream.set_active_mode(modes[2]).expect("second set");
    assert_eq!(stream.required_bytes().expect("size"), first);
    assert_eq!(stream.active_mode(), Some(modes[2]));
}

#[test]
fn unknown_mode_keeps_previous_mode() {
    let modes = small_color_modes();
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(modes.clone()));
    stream.initialize().expect("initialize");

    let unknown = StreamMode::new(1920, 1080, 30, PixelFormat::Rgb888);
    let err = stream.set_active_mode(unknown).unwrap_err();
    assert_eq!(err, StreamError::UnsupportedMode { mode: unknown });
    assert_eq!(stream.active_mode(), Some(modes[0]));
}

#[test]
fn unplugged_backend_is_unavailable() {
    let mut stream = DeviceStream::new(MockColorBackend::unplugged());
    let err = stream.initialize().unwrap_err();
    assert!(matches!(err, StreamError::BackendUnavailable { .. }));
    assert_eq!(stream.state(), StreamState::Uninitialized);
    assert!(stream.available_modes().is_empty());
}

#[test]
fn operations_after_shutdown_fail() {
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(small_color_modes()));
    stream.initialize().expect("initialize");
    stream.shutdown();
    stream.shutdown();
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(stream.active_mode().is_none());

    let mut buffer = FrameBuffer::new();
    let err = stream.read_frame(&mut buffer, Duration::ZERO).unwrap_err();
    assert!(matches!(err, StreamError::InvalidState { .. }));
    assert!(matches!(
        stream.initialize(),
        Err(StreamError::InvalidState { .. })
    ));
}

#[test]
fn overlay_follows_active_mode_and_flags() {
    let modes = small_color_modes();
    let mut stream = DeviceStream::new(MockColorBackend::with_modes(modes.clone()));
    stream.initialize().expect("initialize");
    let mut buffer = FrameBuffer::new();

    stream.read_frame(&mut buffer, Duration::ZERO).expect("read");
    assert_eq!(
        stream.backend().overlay_text(),
        Some("color\n16x12@30 rgb888\n")
    );

    stream.set_active_mode(modes[2]).expect("set mode");
    stream.set_flags(StreamFlags {
        mirrored: true,
        registered: true,
    });
    stream.read_frame(&mut buffer, Duration::ZERO).expect("read");
    assert_eq!(buffer.len(), modes[2].frame_bytes());
    assert_eq!(
        stream.backend().overlay_text(),
        Some("color\n32x24@30 rgb888\n(mirrored,registered)")
    );
}

#[test]
fn callback_stream_times_out_without_frames() {
    let mode = StreamMode::new(4, 2, 30, PixelFormat::Depth16);
    let (backend, _feeder) = CallbackBackend::new("callback", StreamKind::Depth, vec![mode]);
    let mut stream = DeviceStream::new(backend);
    stream.initialize().expect("initialize");

    let mut dest = vec![0u8; mode.frame_bytes()];
    let err = stream
        .read_into(&mut dest, Duration::from_millis(10))
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(stream.stats().timeouts, 1);
}

#[test]
fn callback_stream_delivers_latest_frame() {
    let mode = StreamMode::new(2, 1, 30, PixelFormat::Depth16);
    let (backend, feeder) = CallbackBackend::new("callback", StreamKind::Depth, vec![mode]);
    let mut stream = DeviceStream::new(backend);
    stream.initialize().expect("initialize");
    assert_eq!(feeder.requested_mode(), Some(mode));

    assert!(feeder.push(vec![1, 0, 2, 0], 100));
    assert!(feeder.push(vec![3, 0, 4, 0], 200));

    let mut dest = vec![0u8; 4];
    let meta = stream.read_into(&mut dest, Duration::ZERO).expect("read");
    assert_eq!(dest, vec![3, 0, 4, 0]);
    assert_eq!(meta.timestamp_us, 200);
    assert_eq!(stream.backend().slot_stats().dropped, 1);

    stream.shutdown();
    assert!(feeder.is_closed());
    assert!(!feeder.push(vec![5, 0, 6, 0], 300));
}

#[test]
fn callback_stream_reads_from_producer_thread() {
    let mode = StreamMode::new(2, 2, 30, PixelFormat::Gray8);
    let (backend, feeder) = CallbackBackend::new("producer", StreamKind::Color, vec![mode]);
    let mut stream = DeviceStream::new(backend);
    stream.initialize().expect("initialize");

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        feeder.push(vec![9; 4], 42)
    });

    let mut buffer = FrameBuffer::new();
    let meta = stream
        .read_frame(&mut buffer, Duration::from_secs(5))
        .expect("read");
    assert!(producer.join().expect("producer thread"));
    assert_eq!(buffer.as_bytes(), &[9, 9, 9, 9]);
    assert_eq!(meta.timestamp_us, 42);
    assert_eq!(buffer.metadata(), Some(&meta));
}
