use crate::error::LogicError;
use crate::raster::RasterModifier;

/// Write position of a byte stream laid out row after row.
#[derive(Debug, Clone)]
pub struct RowWriter {
    row: u32,
    column: usize,
    bytes_per_line: usize,
    bits_per_pixel: u32,
}

impl RowWriter {
    pub fn new(bytes_per_line: usize, bits_per_pixel: u32) -> Self {
        Self {
            row: 0,
            column: 0,
            bytes_per_line,
            bits_per_pixel,
        }
    }

    /// Lines completely written so far.
    pub fn rows_completed(&self) -> u32 {
        self.row
    }

    /// Whether the current line already got some bytes.
    pub fn has_partial_row(&self) -> bool {
        self.column != 0
    }

    pub fn write(
        &mut self,
        modifier: &mut RasterModifier<'_>,
        mut data: &[u8],
    ) -> Result<(), LogicError> {
        while !data.is_empty() {
            let to_copy = (self.bytes_per_line - self.column).min(data.len());
            let start_px = (self.column * 8) as u32 / self.bits_per_pixel;
            let px_count = (to_copy * 8) as u32 / self.bits_per_pixel;
            let line = modifier.scan_line(self.row, start_px, px_count)?;
            line[self.column..self.column + to_copy].copy_from_slice(&data[..to_copy]);
            data = &data[to_copy..];
            self.column += to_copy;
            if self.column == self.bytes_per_line {
                self.column = 0;
                self.row += 1;
            }
        }
        Ok(())
    }
}
