use crate::error::DeviceError;
use crate::model::params::ScanParameters;
use std::sync::Arc;

/// Outcome of a successful read call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadStatus {
    /// Number of bytes placed at the beginning of the buffer, may be zero.
    Data(usize),
    /// The device has no more data for the current frame.
    Eof,
}

/// A scanning device driven through a blocking start/read/cancel API.
///
/// Every call may block for an arbitrary time. Apart from [`DataSource::cancel`] the methods
/// are only called from the worker thread of the running scanning session.
pub trait DataSource: Send + Sync + 'static {
    /// Starts acquisition of the next frame.
    fn start(&self) -> Result<(), DeviceError>;
    /// Parameters of the frame being acquired, valid after a successful start.
    fn parameters(&self) -> Result<ScanParameters, DeviceError>;
    /// Reads up to `buf.len()` bytes of frame data.
    fn read(&self, buf: &mut [u8]) -> Result<ReadStatus, DeviceError>;
    /// Cancels the operation in progress. Can be called from any thread.
    fn cancel(&self);
}

/// Called without arguments after every observable change of a scanning session. The
/// receiver pulls the actual state through the [`super::Device`] getters, but must not call
/// them from inside the callback.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;
