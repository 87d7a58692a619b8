use num_enum::TryFromPrimitive;
use std::fmt;

/// Status codes reported by the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum DeviceStatus {
    Good = 0,
    Unsupported,
    Cancelled,
    DeviceBusy,
    Invalid,
    Eof,
    Jammed,
    NoDocuments,
    CoverOpen,
    IoError,
    NoMemory,
    AccessDenied,
}

impl DeviceStatus {
    pub fn description(&self) -> &'static str {
        match self {
            DeviceStatus::Good => "Success",
            DeviceStatus::Unsupported => "Operation not supported",
            DeviceStatus::Cancelled => "Operation was cancelled",
            DeviceStatus::DeviceBusy => "Device busy",
            DeviceStatus::Invalid => "Invalid argument",
            DeviceStatus::Eof => "End of file reached",
            DeviceStatus::Jammed => "Document feeder jammed",
            DeviceStatus::NoDocuments => "Document feeder out of documents",
            DeviceStatus::CoverOpen => "Scanner cover is open",
            DeviceStatus::IoError => "Error during device I/O",
            DeviceStatus::NoMemory => "Out of memory",
            DeviceStatus::AccessDenied => "Access to resource has been denied",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
