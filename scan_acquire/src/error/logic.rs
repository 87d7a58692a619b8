use crate::device::ScanState;
use crate::model::params::FrameFormat;
use num_enum::TryFromPrimitiveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    #[error("trying to start scanning on \"{device}\" device while the scanning is in progress (state={state})")]
    AlreadyScanning { device: String, state: ScanState },
    #[error("trying to get scanner data on \"{device}\" device while even parameters hasn't been got")]
    DataBeforeParameters { device: String },
    #[error("no scanning session is running on \"{device}\" device")]
    NotScanning { device: String },
    #[error("unexpected new frame for gray image")]
    UnexpectedFrame,
    #[error("unsupported image depth {0} bits per pixel")]
    UnsupportedDepth(u32),
    #[error("unable to decode image with format {0:?}")]
    UnsupportedFormat(FrameFormat),
    #[error("Unknown frame format")]
    UnknownFrameFormat(#[from] TryFromPrimitiveError<FrameFormat>),
    #[error("Invalid image geometry")]
    InvalidGeometry,
    #[error("Data too large")]
    DataTooLarge,
    #[error("already having device \"{0}\" somewhere in the program")]
    DeviceAlreadyOpen(String),
}
