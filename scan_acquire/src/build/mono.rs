use super::RowWriter;
use crate::error::LogicError;
use crate::raster::{ImageHolder, PixelFormat};

/// Builds 1 bit per pixel images, the device packs 8 pixels into a byte.
#[derive(Debug, Clone)]
pub struct MonoBuilder {
    holder: ImageHolder,
    rows: RowWriter,
}

impl MonoBuilder {
    pub(crate) fn new(holder: ImageHolder, width: u32) -> Self {
        Self {
            holder,
            rows: RowWriter::new(PixelFormat::Mono1.bytes_per_line(width), 1),
        }
    }

    pub fn feed(&mut self, data: &[u8]) -> Result<(), LogicError> {
        let mut modifier = self.holder.modifier();
        self.rows.write(&mut modifier, data)
    }

    pub fn final_height(&self) -> u32 {
        self.rows.rows_completed() + u32::from(self.rows.has_partial_row())
    }
}
