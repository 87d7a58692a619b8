use crate::model::status::DeviceStatus;
use thiserror::Error;

/// A non-good status returned by a call into the device API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {status}")]
pub struct DeviceError {
    pub status: DeviceStatus,
    pub context: String,
}

impl DeviceError {
    pub fn new(context: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            status,
            context: context.into(),
        }
    }

    /// The device reports that an operation in progress has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == DeviceStatus::Cancelled
    }
}
