use super::{DataSource, Device, SessionConfig};
use crate::error::LogicError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of the devices opened by one part of a program.
///
/// A device name can be opened once per context. The name is released when the [`Device`]
/// is dropped.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    opened: Arc<Mutex<HashSet<String>>>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_device<D: DataSource>(
        &self,
        name: impl Into<String>,
        source: D,
    ) -> Result<Device<D>, LogicError> {
        self.open_device_with_config(name, source, SessionConfig::default())
    }

    pub fn open_device_with_config<D: DataSource>(
        &self,
        name: impl Into<String>,
        source: D,
        config: SessionConfig,
    ) -> Result<Device<D>, LogicError> {
        let name = name.into();
        if !lock(&self.opened).insert(name.clone()) {
            return Err(LogicError::DeviceAlreadyOpen(name));
        }
        let registration = Registration {
            opened: self.opened.clone(),
            name: name.clone(),
        };
        Ok(Device::new(name, source, config, registration))
    }

    pub fn is_open(&self, name: &str) -> bool {
        lock(&self.opened).contains(name)
    }
}

fn lock(opened: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    opened.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps a device name registered in its [`ScanContext`].
#[derive(Debug)]
pub(crate) struct Registration {
    opened: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.opened).remove(&self.name);
    }
}
