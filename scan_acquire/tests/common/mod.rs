#![allow(dead_code)]

use flexi_logger::{Logger, LoggerHandle};
use image::{ImageBuffer, Luma};
use scan_acquire::device::{DataSource, MemorySource, ReadStatus};
use scan_acquire::error::DeviceError;
use scan_acquire::model::params::ScanParameters;
use scan_acquire::raster::{PixelFormat, Raster};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, OnceLock};

static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

/// Routes the crate's log records to stderr, filtered by `RUST_LOG`.
pub fn init_logging() {
    LOGGER_HANDLE.get_or_init(|| {
        let handle = Logger::try_with_env_or_str("warn")
            .unwrap()
            .start()
            .unwrap();
        Mutex::new(handle)
    });
}

/// Holds every `start` until the test opens the gate.
pub struct GatedSource {
    inner: MemorySource,
    gate: Mutex<Receiver<()>>,
}

impl GatedSource {
    pub fn new(inner: MemorySource) -> (Self, Sender<()>) {
        let (sender, receiver) = mpsc::channel();
        let source = Self {
            inner,
            gate: Mutex::new(receiver),
        };
        (source, sender)
    }

    pub fn inner(&self) -> &MemorySource {
        &self.inner
    }
}

impl DataSource for GatedSource {
    fn start(&self) -> Result<(), DeviceError> {
        self.gate.lock().unwrap().recv().unwrap();
        self.inner.start()
    }

    fn parameters(&self) -> Result<ScanParameters, DeviceError> {
        self.inner.parameters()
    }

    fn read(&self, buf: &mut [u8]) -> Result<ReadStatus, DeviceError> {
        self.inner.read(buf)
    }

    fn cancel(&self) {
        self.inner.cancel()
    }
}

/// Saves `raster` as a grayscale PNG under `tests/test_outputs/`.
pub fn save_png(name: &str, raster: &Raster) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_outputs");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.png", name));
    let (width, height) = (raster.width(), raster.height());
    match raster.format() {
        PixelFormat::Mono1 => {
            // 1 is black in the raster
            ImageBuffer::from_fn(width, height, |x, y| {
                Luma([if raster.pixel(x, y) == 1 { 0u8 } else { 255u8 }])
            })
            .save(path)
            .unwrap();
        }
        PixelFormat::Gray8 => {
            ImageBuffer::<Luma<u8>, Vec<u8>>::from_vec(width, height, raster.as_bytes().to_vec())
                .unwrap()
                .save(path)
                .unwrap();
        }
        PixelFormat::Gray16 => {
            ImageBuffer::from_fn(width, height, |x, y| Luma([raster.pixel(x, y)]))
                .save(path)
                .unwrap();
        }
    }
}
