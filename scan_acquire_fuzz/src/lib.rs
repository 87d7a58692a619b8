use arbitrary::Arbitrary;
use scan_acquire::device::MemorySource;
use scan_acquire::model::params::{FrameFormat, ScanParameters};
use scan_acquire::model::status::DeviceStatus;

/// A single-frame gray scan with arbitrary geometry, delivered in arbitrary pieces.
#[derive(Clone, Debug, Arbitrary)]
pub struct ScriptedScan {
    pub depth_index: u8,
    pub width: u8,
    pub lines: Option<u8>,
    pub height_hint: Option<u8>,
    pub chunk_size: u8,
    pub fail_read_at: Option<u8>,
    pub data: Vec<u8>,
}

impl ScriptedScan {
    pub fn depth(&self) -> u32 {
        [1, 8, 16][self.depth_index as usize % 3]
    }

    pub fn bytes_per_line(&self) -> usize {
        (self.width as usize * self.depth() as usize).div_ceil(8)
    }

    pub fn params(&self) -> ScanParameters {
        ScanParameters {
            format: FrameFormat::Gray,
            last_frame: true,
            bytes_per_line: self.bytes_per_line() as u32,
            pixels_per_line: self.width as u32,
            lines: self.lines.map(u32::from),
            depth: self.depth(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        (self.chunk_size as usize).max(1)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks(self.chunk_size())
    }

    /// Lines the image must end up with: every full line plus a partial one.
    pub fn expected_height(&self) -> u32 {
        self.data.len().div_ceil(self.bytes_per_line()) as u32
    }

    pub fn source(&self) -> MemorySource {
        let source = MemorySource::new(self.params(), self.data.clone()).chunk_limit(self.chunk_size());
        match self.fail_read_at {
            Some(call) => source.fail_read_at(call as usize + 1, DeviceStatus::IoError),
            None => source,
        }
    }

    /// Whether the scripted read failure happens before the device reports the end.
    pub fn fails(&self) -> bool {
        let reads = self.data.len().div_ceil(self.chunk_size()) + 1;
        self.fail_read_at
            .is_some_and(|call| (call as usize) < reads)
    }
}
