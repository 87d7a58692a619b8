use super::PixelFormat;
use crate::error::LogicError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    // The maximum number of pixels per line accepted from a device.
    pub max_width: u32,
    // The maximum number of lines a raster may grow to.
    pub max_height: u32,
    // The maximum number of bytes a raster may occupy.
    pub max_bytes: u64,
}

impl Limits {
    pub const NO_LIMITS: &Self = &Self {
        max_width: u32::MAX,
        max_height: u32::MAX,
        max_bytes: u64::MAX,
    };

    pub fn check(&self, width: u32, height: u32, format: PixelFormat) -> Result<(), LogicError> {
        if width > self.max_width || height > self.max_height {
            return Err(LogicError::DataTooLarge);
        }
        let num_bytes = (format.bytes_per_line(width) as u64)
            .checked_mul(height as u64)
            .ok_or(LogicError::DataTooLarge)?;
        if num_bytes > self.max_bytes || usize::try_from(num_bytes).is_err() {
            return Err(LogicError::DataTooLarge);
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::NO_LIMITS.clone()
    }
}
