mod holder;
mod limits;
pub use holder::*;
pub use limits::*;

use byteorder::{BigEndian, ByteOrder};

/// Storage format of a raster, always a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 bit per pixel, 8 pixels per byte with the most significant bit first, 1 is black.
    Mono1,
    /// 8 bits per pixel.
    Gray8,
    /// 16 bits per pixel, stored big-endian.
    Gray16,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Mono1 => 1,
            PixelFormat::Gray8 => 8,
            PixelFormat::Gray16 => 16,
        }
    }

    pub fn bytes_per_line(&self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel() as usize).div_ceil(8)
    }

    /// The byte value of a white pixel run.
    pub fn white(&self) -> u8 {
        match self {
            PixelFormat::Mono1 => 0x00,
            PixelFormat::Gray8 | PixelFormat::Gray16 => 0xff,
        }
    }
}

/// A row-major pixel buffer whose width is fixed and whose height can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Raster {
    /// Creates a raster filled with white pixels.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let bytes_per_line = format.bytes_per_line(width);
        Self {
            width,
            height,
            format,
            data: vec![format.white(); bytes_per_line * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_line(&self) -> usize {
        self.format.bytes_per_line(self.width)
    }

    pub fn row(&self, index: u32) -> &[u8] {
        let bytes_per_line = self.bytes_per_line();
        let start = index as usize * bytes_per_line;
        &self.data[start..start + bytes_per_line]
    }

    pub fn row_mut(&mut self, index: u32) -> &mut [u8] {
        let bytes_per_line = self.bytes_per_line();
        let start = index as usize * bytes_per_line;
        &mut self.data[start..start + bytes_per_line]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Sample value of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> u16 {
        let row = self.row(y);
        match self.format {
            PixelFormat::Mono1 => ((row[x as usize / 8] >> (7 - x % 8)) & 1) as u16,
            PixelFormat::Gray8 => row[x as usize] as u16,
            PixelFormat::Gray16 => BigEndian::read_u16(&row[x as usize * 2..]),
        }
    }

    /// Reallocates the raster to `height` lines, keeping every byte of the rows preserved.
    /// Added rows are white.
    pub fn set_height(&mut self, height: u32) {
        if height != self.height {
            let bytes_per_line = self.bytes_per_line();
            self.data
                .resize(bytes_per_line * height as usize, self.format.white());
            self.height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_line_rounds_up_partial_bytes() {
        assert_eq!(PixelFormat::Mono1.bytes_per_line(32), 4);
        assert_eq!(PixelFormat::Mono1.bytes_per_line(33), 5);
        assert_eq!(PixelFormat::Gray8.bytes_per_line(33), 33);
        assert_eq!(PixelFormat::Gray16.bytes_per_line(33), 66);
    }

    #[test]
    fn growing_preserves_written_rows() {
        let mut raster = Raster::new(16, 2, PixelFormat::Gray8);
        raster.row_mut(1).copy_from_slice(&[7; 16]);
        raster.set_height(40);
        assert_eq!(raster.height(), 40);
        assert_eq!(raster.row(1), &[7; 16]);
        assert_eq!(raster.row(39), &[0xff; 16]);
        raster.set_height(2);
        assert_eq!(raster.as_bytes().len(), 32);
        assert_eq!(raster.row(1), &[7; 16]);
    }

    #[test]
    fn reads_pixels_of_every_format() {
        let mut mono = Raster::new(10, 1, PixelFormat::Mono1);
        mono.row_mut(0).copy_from_slice(&[0b1000_0001, 0b0100_0000]);
        assert_eq!(mono.pixel(0, 0), 1);
        assert_eq!(mono.pixel(1, 0), 0);
        assert_eq!(mono.pixel(7, 0), 1);
        assert_eq!(mono.pixel(9, 0), 1);

        let mut gray = Raster::new(2, 1, PixelFormat::Gray16);
        gray.row_mut(0).copy_from_slice(&[0x12, 0x34, 0xab, 0xcd]);
        assert_eq!(gray.pixel(0, 0), 0x1234);
        assert_eq!(gray.pixel(1, 0), 0xabcd);
    }
}
