mod channel;
mod config;
mod context;
mod interface;
mod memory;
mod session;
mod worker;
pub use channel::{CancelToken, Chunk};
pub use config::*;
pub use context::ScanContext;
pub use interface::*;
pub use memory::*;
pub use session::*;

pub(crate) use channel::AcquisitionChannel;
pub(crate) use context::Registration;
pub(crate) use worker::Worker;
