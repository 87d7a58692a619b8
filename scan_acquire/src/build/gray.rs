use super::RowWriter;
use crate::error::LogicError;
use crate::raster::{ImageHolder, PixelFormat};
use byteorder::{BigEndian, ByteOrder, NativeEndian};

#[derive(Debug, Clone)]
pub struct Gray8Builder {
    holder: ImageHolder,
    rows: RowWriter,
}

impl Gray8Builder {
    pub(crate) fn new(holder: ImageHolder, width: u32) -> Self {
        Self {
            holder,
            rows: RowWriter::new(PixelFormat::Gray8.bytes_per_line(width), 8),
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

/// Builds 16 bits per pixel images. The device sends samples in host byte order, the raster
/// keeps them big-endian.
#[derive(Debug, Clone)]
pub struct Gray16Builder {
    holder: ImageHolder,
    rows: RowWriter,
    // first byte of a sample split between two chunks
    carry: Option<u8>,
}

impl Gray16Builder {
    pub(crate) fn new(holder: ImageHolder, width: u32) -> Self {
        Self {
            holder,
            rows: RowWriter::new(PixelFormat::Gray16.bytes_per_line(width), 16),
            carry: None,
        }
    }

    pub fn feed(&mut self, data: &[u8]) -> Result<(), LogicError> {
        let mut samples = Vec::with_capacity(data.len() + 1);
        samples.extend(self.carry.take());
        samples.extend_from_slice(data);
        if samples.len() % 2 == 1 {
            self.carry = samples.pop();
        }
        for sample in samples.chunks_exact_mut(2) {
            let value = NativeEndian::read_u16(sample);
            BigEndian::write_u16(sample, value);
        }
        let mut modifier = self.holder.modifier();
        self.rows.write(&mut modifier, &samples)
    }

    pub fn final_height(&self) -> u32 {
        let pending = self.rows.has_partial_row() || self.carry.is_some();
        self.rows.rows_completed() + u32::from(pending)
    }
}
