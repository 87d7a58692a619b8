mod driver;
pub use driver::*;

use crate::build::ImageBuilder;
use crate::device::{CancelMode, Chunk, DataSource, Device, Notifier};
use crate::error::{LogicError, ScanError};
use crate::model::params::ScanParameters;
use crate::raster::{ImageHolder, DEFAULT_GROW_HEIGHT};
use log::debug;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a capture ended. Exactly one outcome is reported per capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaptureOutcome {
    /// The image is complete and its height matches the delivered lines.
    Finished,
    /// A failure, as a message ready to show to a user.
    Failed(String),
    Cancelled,
}

impl fmt::Display for CaptureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureOutcome::Finished => f.write_str("Finished"),
            CaptureOutcome::Failed(message) => f.write_str(message),
            CaptureOutcome::Cancelled => f.write_str("Operation cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    // Initial raster height when the device doesn't report the number of lines.
    pub height_hint: Option<u32>,
    // Lines added at once when the data outgrows the raster.
    pub grow_height: u32,
    pub cancel_mode: CancelMode,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            height_hint: None,
            grow_height: DEFAULT_GROW_HEIGHT,
            cancel_mode: CancelMode::Safe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    AwaitingParameters,
    Reading,
    Done,
}

/// Acquires one image from a device into an [`ImageHolder`].
///
/// After [`Capture::start`] every notification of the device is answered with
/// [`Capture::on_notify`], which processes all progress available so far and eventually
/// returns the outcome. [`Capture::run_blocking`] and [`Capture::run`] do this loop.
pub struct Capture<D: DataSource> {
    device: Arc<Device<D>>,
    holder: ImageHolder,
    config: CaptureConfig,
    builder: Option<ImageBuilder>,
    phase: Phase,
    is_last_frame: bool,
    cancel_requested: Arc<AtomicBool>,
    build_error: Option<LogicError>,
    notifier: Option<Notifier>,
}

impl<D: DataSource> Capture<D> {
    pub fn new(device: Arc<Device<D>>, holder: ImageHolder) -> Self {
        Self::with_config(device, holder, CaptureConfig::default())
    }

    pub fn with_config(device: Arc<Device<D>>, holder: ImageHolder, config: CaptureConfig) -> Self {
        Self {
            device,
            holder,
            config,
            builder: None,
            phase: Phase::NotStarted,
            is_last_frame: false,
            cancel_requested: Arc::new(AtomicBool::new(false)),
            build_error: None,
            notifier: None,
        }
    }

    pub fn device(&self) -> &Arc<Device<D>> {
        &self.device
    }

    pub fn holder(&self) -> &ImageHolder {
        &self.holder
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// A handle aborting this capture from another thread.
    pub fn handle(&self) -> CaptureHandle<D> {
        CaptureHandle {
            device: self.device.clone(),
            cancel_requested: self.cancel_requested.clone(),
            mode: self.config.cancel_mode,
        }
    }

    /// Starts the first scanning session.
    ///
    /// `None` drives the device synchronously, so that the next [`Capture::on_notify`] runs
    /// the whole capture. Returns the outcome right away when the device can't be started.
    pub fn start(&mut self, notifier: Option<Notifier>) -> Option<CaptureOutcome> {
        self.holder.set_grow_height(self.config.grow_height);
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.builder = None;
        self.build_error = None;
        self.notifier = notifier;
        self.start_session()
    }

    /// Processes everything the device has delivered since the previous call.
    pub fn on_notify(&mut self) -> Option<CaptureOutcome> {
        loop {
            match self.phase {
                Phase::NotStarted | Phase::Done => return None,
                Phase::AwaitingParameters => match self.device.parameters() {
                    Err(err) => {
                        return Some(self.fail("Can't get actual image scanning parameters", err))
                    }
                    Ok(None) => return None,
                    Ok(Some(params)) => {
                        self.accept_frame(&params);
                        self.phase = Phase::Reading;
                    }
                },
                Phase::Reading => match self.device.next_chunk() {
                    Err(err) => {
                        return Some(self.fail("Can't get another captured image data", err))
                    }
                    Ok(None) => return None,
                    Ok(Some(Chunk::Data(data))) => self.accept_data(&data),
                    Ok(Some(Chunk::End)) => {
                        if let Some(outcome) = self.end_of_stream() {
                            return Some(outcome);
                        }
                    }
                },
            }
        }
    }

    /// Requests cancellation. The outcome still arrives through [`Capture::on_notify`] once
    /// the device has stopped.
    pub fn abort(&self) {
        self.handle().abort();
    }

    fn start_session(&mut self) -> Option<CaptureOutcome> {
        self.phase = Phase::AwaitingParameters;
        if let Err(err) = self.device.start_scanning(self.notifier.clone()) {
            let context = format!("Can't start scanning on device \"{}\"", self.device.name());
            return Some(self.fail(&context, err));
        }
        None
    }

    fn accept_frame(&mut self, params: &ScanParameters) {
        self.is_last_frame = params.last_frame;
        let result = if let Some(builder) = &mut self.builder {
            builder.new_frame(params)
        } else {
            ImageBuilder::new(params, self.holder.clone(), self.config.height_hint)
                .map(|builder| self.builder = Some(builder))
        };
        if let Err(err) = result {
            self.defer_build_error(err);
        }
    }

    fn accept_data(&mut self, data: &[u8]) {
        if self.cancel_requested.load(Ordering::SeqCst) || self.build_error.is_some() {
            return;
        }
        let Some(builder) = &mut self.builder else {
            return;
        };
        if let Err(err) = builder.feed(data) {
            self.defer_build_error(err);
        }
    }

    fn defer_build_error(&mut self, err: LogicError) {
        debug!("image building failed, draining the session: {}", err);
        self.build_error = Some(err);
        self.device.cancel(self.config.cancel_mode);
    }

    fn end_of_stream(&mut self) -> Option<CaptureOutcome> {
        if self.cancel_requested.load(Ordering::SeqCst) {
            return Some(self.finish(CaptureOutcome::Cancelled));
        }
        self.device.cancel(self.config.cancel_mode);
        if let Some(err) = self.build_error.take() {
            let message = format!("Can't accept new image frame:\n{err}");
            return Some(self.finish(CaptureOutcome::Failed(message)));
        }
        if !self.is_last_frame {
            return self.start_session();
        }
        // the raster may have grown past the delivered lines
        if let Some(height) = self.builder.as_ref().map(ImageBuilder::final_height) {
            let resized = self.holder.modifier().set_height(height);
            if let Err(err) = resized {
                let message = format!("Can't accept new image frame:\n{err}");
                return Some(self.finish(CaptureOutcome::Failed(message)));
            }
        }
        Some(self.finish(CaptureOutcome::Finished))
    }

    fn fail(&mut self, context: &str, err: ScanError) -> CaptureOutcome {
        self.device.cancel(self.config.cancel_mode);
        let reason = match err {
            ScanError::Unknown(message) if message.is_empty() => "unknown error".to_owned(),
            err => err.to_string(),
        };
        self.finish(CaptureOutcome::Failed(format!("{context}:\n{reason}")))
    }

    fn finish(&mut self, outcome: CaptureOutcome) -> CaptureOutcome {
        debug!("capture on device \"{}\" ended: {:?}", self.device.name(), outcome);
        self.phase = Phase::Done;
        outcome
    }
}

/// Aborts a running [`Capture`] from any thread.
pub struct CaptureHandle<D: DataSource> {
    device: Arc<Device<D>>,
    cancel_requested: Arc<AtomicBool>,
    mode: CancelMode,
}

impl<D: DataSource> Clone for CaptureHandle<D> {
    fn clone(&self) -> Self {
        Self {
            device: self.device.clone(),
            cancel_requested: self.cancel_requested.clone(),
            mode: self.mode,
        }
    }
}

impl<D: DataSource> CaptureHandle<D> {
    pub fn abort(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.device.cancel(self.mode);
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}
