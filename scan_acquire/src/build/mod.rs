mod gray;
mod mono;
mod rows;
pub use gray::*;
pub use mono::*;
pub use rows::*;

use crate::error::LogicError;
use crate::model::params::ScanParameters;
use crate::raster::{ImageHolder, PixelFormat, Raster};
use derive_more::From;

/// Turns the byte stream of a frame into lines of the raster kept by an [`ImageHolder`].
#[derive(Debug, Clone, From)]
pub enum ImageBuilder {
    Mono(MonoBuilder),
    Gray8(Gray8Builder),
    Gray16(Gray16Builder),
}

impl ImageBuilder {
    /// Creates a builder for the first frame described by `params` and installs a fresh white
    /// raster into `holder`.
    ///
    /// The initial height is the line count reported by the device, else `height_hint`, else
    /// the width. Unknown heights are corrected at the end with [`ImageBuilder::final_height`].
    pub fn new(
        params: &ScanParameters,
        holder: ImageHolder,
        height_hint: Option<u32>,
    ) -> Result<Self, LogicError> {
        let format = match params.depth {
            1 => PixelFormat::Mono1,
            8 => PixelFormat::Gray8,
            16 => PixelFormat::Gray16,
            depth => return Err(LogicError::UnsupportedDepth(depth)),
        };
        if !params.format.is_single_channel() {
            return Err(LogicError::UnsupportedFormat(params.format));
        }
        let width = params.pixels_per_line;
        if width == 0 {
            return Err(LogicError::InvalidGeometry);
        }
        let height = params
            .lines
            .filter(|&lines| lines > 0)
            .or(height_hint.filter(|&hint| hint > 0))
            .unwrap_or(width);
        holder.limits().check(width, height, format)?;
        holder
            .modifier()
            .set_raster(Raster::new(width, height, format));

        Ok(match format {
            PixelFormat::Mono1 => MonoBuilder::new(holder, width).into(),
            PixelFormat::Gray8 => Gray8Builder::new(holder, width).into(),
            PixelFormat::Gray16 => Gray16Builder::new(holder, width).into(),
        })
    }

    /// Prepares the builder for one more frame of a multi-frame image.
    pub fn new_frame(&mut self, _params: &ScanParameters) -> Result<(), LogicError> {
        match self {
            ImageBuilder::Mono(_) | ImageBuilder::Gray8(_) | ImageBuilder::Gray16(_) => {
                Err(LogicError::UnexpectedFrame)
            }
        }
    }

    pub fn feed(&mut self, data: &[u8]) -> Result<(), LogicError> {
        match self {
            ImageBuilder::Mono(builder) => builder.feed(data),
            ImageBuilder::Gray8(builder) => builder.feed(data),
            ImageBuilder::Gray16(builder) => builder.feed(data),
        }
    }

    /// Lines actually delivered, counting a partially filled last line.
    pub fn final_height(&self) -> u32 {
        match self {
            ImageBuilder::Mono(builder) => builder.final_height(),
            ImageBuilder::Gray8(builder) => builder.final_height(),
            ImageBuilder::Gray16(builder) => builder.final_height(),
        }
    }
}
