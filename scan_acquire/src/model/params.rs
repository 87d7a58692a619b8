use crate::error::LogicError;
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum FrameFormat {
    /// Band covering human visual range.
    Gray,
    /// Pixel-interleaved red/green/blue bands.
    Rgb,
    /// Red band of a red/green/blue image.
    Red,
    /// Green band of a red/green/blue image.
    Green,
    /// Blue band of a red/green/blue image.
    Blue,
}

impl FrameFormat {
    pub fn num_channels(&self) -> usize {
        match self {
            FrameFormat::Gray | FrameFormat::Red | FrameFormat::Green | FrameFormat::Blue => 1,
            FrameFormat::Rgb => 3,
        }
    }

    /// Whether the frame is a complete single-channel image on its own.
    pub fn is_single_channel(&self) -> bool {
        matches!(self, FrameFormat::Gray)
    }
}

/// Geometry of the frame being acquired, as reported by the device after it started.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanParameters {
    pub format: FrameFormat,
    pub last_frame: bool,
    pub bytes_per_line: u32,
    pub pixels_per_line: u32,
    /// `None` while the device can't tell how many lines it is going to deliver.
    pub lines: Option<u32>,
    /// Bits per sample.
    pub depth: u32,
}

/// Parameters in the shape the C device API reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawScanParameters {
    pub format: u32,
    pub last_frame: bool,
    pub bytes_per_line: i32,
    pub pixels_per_line: i32,
    pub lines: i32,
    pub depth: i32,
}

impl TryFrom<RawScanParameters> for ScanParameters {
    type Error = LogicError;

    fn try_from(raw: RawScanParameters) -> Result<Self, Self::Error> {
        let non_negative = |v: i32| u32::try_from(v).map_err(|_| LogicError::InvalidGeometry);
        Ok(ScanParameters {
            format: FrameFormat::try_from_primitive(raw.format)?,
            last_frame: raw.last_frame,
            bytes_per_line: non_negative(raw.bytes_per_line)?,
            pixels_per_line: non_negative(raw.pixels_per_line)?,
            // a negative line count is how the device says "unknown yet"
            lines: u32::try_from(raw.lines).ok(),
            depth: non_negative(raw.depth)?,
        })
    }
}
