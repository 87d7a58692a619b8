use super::{DeviceError, LogicError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Logic(#[from] LogicError),
    /// A failure that is neither a device status nor API misuse, such as a panicking backend.
    #[error("{0}")]
    Unknown(String),
}

impl ScanError {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown error".to_owned()
        };
        ScanError::Unknown(message)
    }
}
