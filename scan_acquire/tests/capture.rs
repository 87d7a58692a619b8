mod common;

use common::{init_logging, save_png, GatedSource};
use scan_acquire::capture::{Capture, CaptureConfig, CaptureOutcome};
use scan_acquire::device::{MemoryFrame, MemorySource, ScanContext, ScanState};
use scan_acquire::model::params::ScanParameters;
use scan_acquire::model::status::DeviceStatus;
use scan_acquire::raster::{ImageHolder, PixelFormat};
use std::sync::Arc;
use std::time::Duration;

fn mono_params(lines: Option<u32>) -> ScanParameters {
    ScanParameters {
        lines,
        ..MemorySource::sample_params()
    }
}

#[test]
fn sample_pattern_is_captured_exactly() {
    init_logging();
    let context = ScanContext::new();
    let device = Arc::new(context.open_device("stub", MemorySource::sample()).unwrap());
    let holder = ImageHolder::new();
    let mut capture = Capture::new(device.clone(), holder.clone());

    assert_eq!(capture.run_blocking(), CaptureOutcome::Finished);
    assert!(capture.is_done());
    let raster = holder.snapshot().unwrap();
    assert_eq!((raster.width(), raster.height()), (32, 34));
    assert_eq!(raster.format(), PixelFormat::Mono1);
    assert_eq!(raster.as_bytes(), MemorySource::sample_data());
    // top left corner of the frame is black, the inner margin white
    assert_eq!(raster.pixel(0, 0), 1);
    assert_eq!(raster.pixel(1, 1), 0);
    save_png("sample", &raster);
}

#[test]
fn square_geometry_in_small_chunks() {
    init_logging();
    let context = ScanContext::new();
    let data = MemorySource::sample_data()[..128].to_vec();
    let source = MemorySource::new(mono_params(Some(32)), data.clone()).chunk_limit(11);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();

    assert_eq!(
        Capture::new(device.clone(), holder.clone()).run_blocking(),
        CaptureOutcome::Finished
    );
    let raster = holder.snapshot().unwrap();
    assert_eq!((raster.width(), raster.height()), (32, 32));
    for y in 0..32 {
        for x in 0..32 {
            let expected = (data[(y * 4 + x / 8) as usize] >> (7 - x % 8)) & 1;
            assert_eq!(raster.pixel(x, y), expected as u16, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(device.source().cancel_count(), 1);
}

#[test]
fn unknown_height_starts_square_and_is_finalized() {
    init_logging();
    let context = ScanContext::new();
    let source =
        MemorySource::new(mono_params(None), MemorySource::sample_data().to_vec()).chunk_limit(11);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();
    let config = CaptureConfig {
        grow_height: 8,
        ..CaptureConfig::default()
    };

    let mut capture = Capture::with_config(device, holder.clone(), config);
    assert_eq!(capture.run_blocking(), CaptureOutcome::Finished);
    let raster = holder.snapshot().unwrap();
    assert_eq!((raster.width(), raster.height()), (32, 34));
    assert_eq!(raster.as_bytes(), MemorySource::sample_data());
}

#[test]
fn height_hint_is_used_and_then_corrected() {
    init_logging();
    let context = ScanContext::new();
    // 10 full lines and the half of the 11th
    let data = MemorySource::sample_data()[..42].to_vec();
    let source = MemorySource::new(mono_params(None), data);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();
    let config = CaptureConfig {
        height_hint: Some(4),
        ..CaptureConfig::default()
    };

    let mut capture = Capture::with_config(device, holder.clone(), config);
    assert_eq!(capture.run_blocking(), CaptureOutcome::Finished);
    let raster = holder.snapshot().unwrap();
    assert_eq!(raster.height(), 11);
    assert_eq!(raster.row(10), &[0b10100000, 0b11100000, 0, 0]);
}

#[test]
fn cancel_before_data_is_reported_as_cancelled() {
    init_logging();
    let (source, gate) = GatedSource::new(MemorySource::sample());
    let context = ScanContext::new();
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let mut capture = Capture::new(device.clone(), ImageHolder::new());

    assert_eq!(capture.start(None), None);
    capture.abort();
    gate.send(()).unwrap();
    assert_eq!(capture.on_notify(), Some(CaptureOutcome::Cancelled));
    assert_eq!(device.source().inner().read_count(), 0);
    assert_eq!(device.state(), ScanState::Idle);
}

#[test]
fn abort_while_reading_is_reported_as_cancelled() {
    init_logging();
    let context = ScanContext::new();
    let source = MemorySource::sample().read_delay(Duration::from_millis(20));
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();
    let mut capture = Capture::new(device, holder.clone());
    let handle = capture.handle();

    let aborter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(70));
        handle.abort();
    });
    let outcome = capture.run_blocking();
    aborter.join().unwrap();
    assert_eq!(outcome, CaptureOutcome::Cancelled);
    assert_eq!(outcome.to_string(), "Operation cancelled");
    // never finalized, the raster still has the reported height
    assert_eq!(holder.dimensions(), Some((32, 34)));
}

#[test]
fn read_error_fails_the_capture() {
    init_logging();
    let context = ScanContext::new();
    let source = MemorySource::sample()
        .read_delay(Duration::from_millis(10))
        .fail_read_at(3, DeviceStatus::IoError);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let mut capture = Capture::new(device.clone(), ImageHolder::new());

    assert_eq!(
        capture.run_blocking(),
        CaptureOutcome::Failed(
            "Can't get another captured image data:\n\
             unable to read next packet of data from scanner: Error during device I/O"
                .to_owned()
        )
    );
    assert_eq!(device.source().cancel_count(), 1);
}

#[test]
fn second_frame_of_gray_image_fails_after_draining() {
    init_logging();
    let context = ScanContext::new();
    let frame = |last_frame| MemoryFrame {
        params: ScanParameters {
            last_frame,
            ..MemorySource::sample_params()
        },
        data: MemorySource::sample_data().to_vec(),
    };
    let source = MemorySource::with_frames(vec![frame(false), frame(true)]).chunk_limit(64);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let mut capture = Capture::new(device.clone(), ImageHolder::new());

    assert_eq!(
        capture.run_blocking(),
        CaptureOutcome::Failed(
            "Can't accept new image frame:\nunexpected new frame for gray image".to_owned()
        )
    );
    assert_eq!(device.source().start_count(), 2);
    assert_eq!(device.state(), ScanState::Idle);
}

#[test]
fn unsupported_depth_fails_after_draining() {
    init_logging();
    let context = ScanContext::new();
    let params = ScanParameters {
        depth: 4,
        ..MemorySource::sample_params()
    };
    let source = MemorySource::new(params, vec![0; 68]);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();

    assert_eq!(
        Capture::new(device, holder.clone()).run_blocking(),
        CaptureOutcome::Failed(
            "Can't accept new image frame:\nunsupported image depth 4 bits per pixel".to_owned()
        )
    );
    assert_eq!(holder.dimensions(), None);
}

#[test]
fn busy_device_cannot_be_captured() {
    init_logging();
    let (source, gate) = GatedSource::new(MemorySource::sample());
    let context = ScanContext::new();
    let device = Arc::new(context.open_device("stub", source).unwrap());
    device.start_scanning(None).unwrap();

    let mut capture = Capture::new(device.clone(), ImageHolder::new());
    match capture.start(None) {
        Some(CaptureOutcome::Failed(message)) => {
            assert!(message.starts_with("Can't start scanning on device \"stub\":\n"));
            assert!(message.contains("while the scanning is in progress"));
        }
        outcome => panic!("unexpected outcome {outcome:?}"),
    }
    gate.send(()).unwrap();
}

#[test]
fn gray16_samples_are_stored_big_endian() {
    init_logging();
    let context = ScanContext::new();
    let params = ScanParameters {
        depth: 16,
        bytes_per_line: 8,
        pixels_per_line: 4,
        lines: Some(2),
        ..MemorySource::sample_params()
    };
    let samples: [u16; 8] = [0, 0x1234, 0x8000, 0xffff, 1, 2, 3, 4];
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
    let device = Arc::new(
        context
            .open_device("stub", MemorySource::new(params, data).chunk_limit(3))
            .unwrap(),
    );
    let holder = ImageHolder::new();

    assert_eq!(
        Capture::new(device, holder.clone()).run_blocking(),
        CaptureOutcome::Finished
    );
    let raster = holder.snapshot().unwrap();
    assert_eq!(raster.pixel(1, 0), 0x1234);
    assert_eq!(raster.pixel(3, 0), 0xffff);
    assert_eq!(raster.pixel(3, 1), 4);
    assert_eq!(&raster.row(0)[2..4], &[0x12, 0x34]);
    save_png("gray16", &raster);
}

#[tokio::test]
async fn async_capture_of_gray8_image() {
    init_logging();
    let context = ScanContext::new();
    let (width, height) = (48u32, 24u32);
    let params = ScanParameters {
        depth: 8,
        bytes_per_line: width,
        pixels_per_line: width,
        lines: Some(height),
        ..MemorySource::sample_params()
    };
    let data: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x + y) * 255 / (width + height)) as u8))
        .collect();
    let source = MemorySource::new(params, data.clone()).chunk_limit(100);
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let holder = ImageHolder::new();

    let outcome = Capture::new(device.clone(), holder.clone()).run().await;
    assert_eq!(outcome, CaptureOutcome::Finished);
    let raster = holder.snapshot().unwrap();
    assert_eq!(raster.format(), PixelFormat::Gray8);
    assert_eq!(raster.as_bytes(), &data[..]);
    assert_eq!(device.state(), ScanState::Idle);
    save_png("gradient", &raster);
}

#[tokio::test(flavor = "multi_thread")]
async fn async_capture_can_be_aborted() {
    init_logging();
    let context = ScanContext::new();
    let source = MemorySource::sample().read_delay(Duration::from_millis(20));
    let device = Arc::new(context.open_device("stub", source).unwrap());
    let capture = Capture::new(device, ImageHolder::new());
    let handle = capture.handle();

    let aborter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(70)).await;
        handle.abort();
    });
    let outcome = capture.run().await;
    aborter.await.unwrap();
    assert_eq!(outcome, CaptureOutcome::Cancelled);
}

#[tokio::test]
async fn async_capture_reports_start_failure() {
    init_logging();
    let context = ScanContext::new();
    let source = MemorySource::sample().fail_start(DeviceStatus::CoverOpen);
    let device = Arc::new(context.open_device("stub", source).unwrap());

    let outcome = Capture::new(device, ImageHolder::new()).run().await;
    assert_eq!(
        outcome,
        CaptureOutcome::Failed(
            "Can't get actual image scanning parameters:\n\
             unable to start scanning: Scanner cover is open"
                .to_owned()
        )
    );
}
