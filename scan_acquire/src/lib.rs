//! A crate for acquiring raster images from blocking line-scanning devices in Rust.
//! # Example
//! ## Blocking
//! Open a device through a `ScanContext`, then let a `Capture` pull the frame data into an
//! `ImageHolder`. The device runs on a background thread, the capture assembles the raster on
//! the calling thread.
//!
//! ```rust
//! use scan_acquire::{
//!     capture::{Capture, CaptureOutcome},
//!     device::{MemorySource, ScanContext},
//!     raster::ImageHolder,
//! };
//! use std::sync::Arc;
//!
//! let context = ScanContext::new();
//! // Any `DataSource` will do, `MemorySource` replays a built-in test pattern.
//! let device = Arc::new(context.open_device("stub:0", MemorySource::sample())?);
//! let holder = ImageHolder::new();
//! let mut capture = Capture::new(device, holder.clone());
//! assert_eq!(capture.run_blocking(), CaptureOutcome::Finished);
//!
//! let raster = holder.snapshot().unwrap();
//! println!("{}x{} pixels acquired", raster.width(), raster.height());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Asynchronous
//! `Capture::run` returns a future driven by device notifications, usable from any executor.
//! Keep a `CaptureHandle` around to abort the capture from elsewhere.
//!
//! ```rust
//! use scan_acquire::{
//!     capture::{Capture, CaptureOutcome},
//!     device::{MemorySource, ScanContext},
//!     raster::ImageHolder,
//! };
//! use std::sync::Arc;
//!
//! # let _ = tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let context = ScanContext::new();
//! let device = Arc::new(context.open_device("stub:0", MemorySource::sample())?);
//! let capture = Capture::new(device, ImageHolder::new());
//! let handle = capture.handle();
//! let outcome = capture.run().await;
//! assert!(!handle.is_aborted());
//! assert_eq!(outcome, CaptureOutcome::Finished);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! The library logs through the `log` facade and never installs a logger itself.

pub mod build;
pub mod capture;
pub mod device;
pub mod error;
pub mod model;
pub mod raster;
