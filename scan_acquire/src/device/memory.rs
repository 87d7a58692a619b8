use super::{DataSource, ReadStatus};
use crate::error::DeviceError;
use crate::model::params::{FrameFormat, ScanParameters};
use crate::model::status::DeviceStatus;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// 32x34 1-bit pattern, the last two lines lie beyond a 32x32 square.
#[rustfmt::skip]
const SAMPLE_IMAGE: [u8; 136] = [
    0b11111111, 0b11111111, 0b11111111, 0b11111111,
    0b10000000, 0b00000000, 0b00000000, 0b00000001,
    0b10111111, 0b11111111, 0b11111111, 0b11111101,
    0b10100000, 0b00000000, 0b00000000, 0b00000101,
    0b10100000, 0b00000000, 0b00000000, 0b11000101,
    0b10100000, 0b00001111, 0b11110001, 0b10000101,
    0b10100000, 0b00011111, 0b11111000, 0b00000101,
    0b10100000, 0b00111000, 0b00011100, 0b00000101,
    0b10100000, 0b01110000, 0b00001110, 0b00000101,
    0b10100000, 0b11100000, 0b00000111, 0b00000101,
    0b10100000, 0b11100000, 0b00000111, 0b00000101,
    0b10100000, 0b11111111, 0b11111111, 0b00000101,
    0b10100000, 0b11111111, 0b11111111, 0b00000101,
    0b10100000, 0b11100000, 0b00000111, 0b00000101,
    0b10100000, 0b11100000, 0b00000111, 0b00000101,
    0b10100000, 0b11100000, 0b00000111, 0b00000101,
    0b10100000, 0b01110000, 0b00001110, 0b00000101,
    0b10100000, 0b00111000, 0b00011100, 0b00000101,
    0b10100000, 0b00011111, 0b11111000, 0b00000101,
    0b10100000, 0b00001111, 0b11100000, 0b00000101,
    0b10100000, 0b00000011, 0b11000000, 0b00000101,
    0b10100000, 0b00000001, 0b10000000, 0b00000101,
    0b10100000, 0b00000001, 0b10000000, 0b00000101,
    0b10100000, 0b00000011, 0b11000000, 0b00000101,
    0b10100000, 0b00000111, 0b11100000, 0b00000101,
    0b10100000, 0b00000000, 0b01110000, 0b00000101,
    0b10100000, 0b00000000, 0b00111000, 0b00000101,
    0b10100000, 0b00000000, 0b00011000, 0b00000101,
    0b10100000, 0b00000000, 0b00000000, 0b00000101,
    0b10111111, 0b11111111, 0b11111111, 0b11111101,
    0b10000000, 0b00000000, 0b00000000, 0b00000001,
    0b11111111, 0b11111111, 0b11111111, 0b11111111,
    0b11111111, 0b11111100, 0b00111111, 0b11111111,
    0b11111111, 0b11111111, 0b11111111, 0b11111111,
];

const SAMPLE_CHUNK_SIZE: usize = 11;

/// One frame replayed by a [`MemorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFrame {
    pub params: ScanParameters,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Playback {
    frame: Option<usize>,
    offset: usize,
    reads: usize,
}

/// In-process device replaying prepared frames.
///
/// Every start moves on to the next frame, the last one is repeated once the sequence is
/// exhausted.
#[derive(Debug)]
pub struct MemorySource {
    frames: Vec<MemoryFrame>,
    chunk_limit: Option<usize>,
    read_delay: Option<Duration>,
    fail_read_at: Option<(usize, DeviceStatus)>,
    fail_start: Option<DeviceStatus>,
    playback: Mutex<Playback>,
    cancelled: AtomicBool,
    starts: AtomicUsize,
    cancels: AtomicUsize,
}

impl MemorySource {
    pub fn new(params: ScanParameters, data: Vec<u8>) -> Self {
        Self::with_frames(vec![MemoryFrame { params, data }])
    }

    pub fn with_frames(frames: Vec<MemoryFrame>) -> Self {
        Self {
            frames,
            chunk_limit: None,
            read_delay: None,
            fail_read_at: None,
            fail_start: None,
            playback: Mutex::new(Playback::default()),
            cancelled: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// The built-in 32x34 monochrome test pattern, handed out 11 bytes per read.
    pub fn sample() -> Self {
        Self::new(Self::sample_params(), SAMPLE_IMAGE.to_vec()).chunk_limit(SAMPLE_CHUNK_SIZE)
    }

    pub fn sample_params() -> ScanParameters {
        ScanParameters {
            format: FrameFormat::Gray,
            last_frame: true,
            bytes_per_line: 4,
            pixels_per_line: 32,
            lines: Some(34),
            depth: 1,
        }
    }

    pub fn sample_data() -> &'static [u8] {
        &SAMPLE_IMAGE
    }

    /// Returns at most `limit` bytes per read.
    pub fn chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = Some(limit.max(1));
        self
    }

    /// Sleeps before answering every read.
    pub fn read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Fails the `call`-th read of a session (counting from 1) with `status`.
    pub fn fail_read_at(mut self, call: usize, status: DeviceStatus) -> Self {
        self.fail_read_at = Some((call, status));
        self
    }

    pub fn fail_start(mut self, status: DeviceStatus) -> Self {
        self.fail_start = Some(status);
        self
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Reads performed during the current session.
    pub fn read_count(&self) -> usize {
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reads
    }

    fn current_frame(&self, playback: &Playback) -> Result<&MemoryFrame, DeviceError> {
        playback
            .frame
            .and_then(|index| self.frames.get(index))
            .ok_or_else(|| DeviceError::new("scanning is not started", DeviceStatus::Invalid))
    }
}

impl DataSource for MemorySource {
    fn start(&self) -> Result<(), DeviceError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_start {
            return Err(DeviceError::new("unable to start scanning", status));
        }
        if self.frames.is_empty() {
            return Err(DeviceError::new(
                "unable to start scanning",
                DeviceStatus::NoDocuments,
            ));
        }
        self.cancelled.store(false, Ordering::SeqCst);
        let mut playback = self.playback.lock().unwrap_or_else(PoisonError::into_inner);
        let next = playback.frame.map_or(0, |index| index + 1);
        playback.frame = Some(next.min(self.frames.len() - 1));
        playback.offset = 0;
        playback.reads = 0;
        Ok(())
    }

    fn parameters(&self) -> Result<ScanParameters, DeviceError> {
        let playback = self.playback.lock().unwrap_or_else(PoisonError::into_inner);
        self.current_frame(&playback)
            .map(|frame| frame.params.clone())
            .map_err(|err| DeviceError::new("unable to get scan parameters", err.status))
    }

    fn read(&self, buf: &mut [u8]) -> Result<ReadStatus, DeviceError> {
        if let Some(delay) = self.read_delay {
            thread::sleep(delay);
        }
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(DeviceError::new(
                "unable to read next packet of data from scanner",
                DeviceStatus::Cancelled,
            ));
        }
        let mut playback = self.playback.lock().unwrap_or_else(PoisonError::into_inner);
        playback.reads += 1;
        if let Some((call, status)) = self.fail_read_at {
            if playback.reads == call {
                return Err(DeviceError::new(
                    "unable to read next packet of data from scanner",
                    status,
                ));
            }
        }
        let data = &self.current_frame(&playback)?.data;
        let remaining = &data[playback.offset.min(data.len())..];
        if remaining.is_empty() {
            return Ok(ReadStatus::Eof);
        }
        let len = remaining
            .len()
            .min(buf.len())
            .min(self.chunk_limit.unwrap_or(usize::MAX));
        buf[..len].copy_from_slice(&remaining[..len]);
        playback.offset += len;
        Ok(ReadStatus::Data(len))
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
