use super::{AcquisitionChannel, Chunk, DataSource, Notifier, Registration, SessionConfig, Worker};
use crate::error::{LogicError, ScanError};
use crate::model::params::ScanParameters;
use log::{info, warn};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Initializing,
    Starting,
    Scanning,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanState::Idle => "idle",
            ScanState::Initializing => "initializing",
            ScanState::Starting => "starting",
            ScanState::Scanning => "scanning",
        })
    }
}

/// How a cancellation request reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CancelMode {
    /// Only raise the cancellation token, the worker cancels the device between reads.
    #[default]
    Safe,
    /// Additionally cancel the device right away from the calling thread. Some backends can't
    /// cope with a cancel racing a read in progress.
    Direct,
}

struct Session {
    channel: Arc<AcquisitionChannel>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    fn join(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            self.worker = Some(worker);
            return;
        }
        if worker.join().is_err() {
            warn!("background scanning thread ended abnormally");
        }
    }
}

/// An opened scanning device.
///
/// Each [`Device::start_scanning`] runs one session on a dedicated thread, the consumer pulls
/// the results through [`Device::parameters`] and [`Device::next_chunk`].
pub struct Device<D: DataSource> {
    name: String,
    source: Arc<D>,
    config: SessionConfig,
    session: Mutex<Option<Session>>,
    _registration: Registration,
}

impl<D: DataSource> Device<D> {
    pub(crate) fn new(
        name: String,
        source: D,
        config: SessionConfig,
        registration: Registration,
    ) -> Self {
        Self {
            name,
            source: Arc::new(source),
            config,
            session: Mutex::new(None),
            _registration: registration,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        self.channel()
            .map_or(ScanState::Idle, |channel| channel.scan_state())
    }

    /// Starts a new scanning session and returns without waiting for the device.
    ///
    /// Without a notifier the getters block until the requested data is there. With one they
    /// never block and the notifier is invoked from the worker thread after every change.
    pub fn start_scanning(&self, notifier: Option<Notifier>) -> Result<(), ScanError> {
        let mut session = self.lock();
        if let Some(current) = session.as_mut() {
            let state = current.channel.scan_state();
            if state != ScanState::Idle {
                return Err(LogicError::AlreadyScanning {
                    device: self.name.clone(),
                    state,
                }
                .into());
            }
            current.join();
        }

        info!("start scanning on device \"{}\"", self.name);

        let channel = Arc::new(AcquisitionChannel::new(
            self.name.clone(),
            notifier,
            self.config.max_queued_chunks,
        ));
        let worker = Worker {
            source: self.source.clone(),
            channel: channel.clone(),
            read_chunk_size: self.config.read_chunk_size.max(1),
        };
        let handle = thread::Builder::new()
            .name(format!("scan-{}", self.name))
            .spawn(move || worker.run())
            .map_err(|err| ScanError::Unknown(format!("unable to spawn scanning thread: {err}")))?;
        *session = Some(Session {
            channel,
            worker: Some(handle),
        });
        Ok(())
    }

    /// Parameters of the frame being acquired, or the error the session ran into.
    pub fn parameters(&self) -> Result<Option<ScanParameters>, ScanError> {
        let channel = self.running_channel()?;
        let result = channel.parameters();
        if result.is_err() {
            self.join(&channel);
        }
        result
    }

    /// Next chunk of frame data. The worker is joined once [`Chunk::End`] is handed out.
    pub fn next_chunk(&self) -> Result<Option<Chunk>, ScanError> {
        let channel = self.running_channel()?;
        let result = channel.pop();
        let session_over = match &result {
            Ok(Some(chunk)) => chunk.is_end(),
            Ok(None) => false,
            // asked too early, the worker is still running
            Err(ScanError::Logic(LogicError::DataBeforeParameters { .. })) => false,
            Err(_) => true,
        };
        if session_over {
            self.join(&channel);
        }
        result
    }

    pub fn cancel(&self, mode: CancelMode) {
        let Some(channel) = self.channel() else {
            return;
        };
        let state = channel.scan_state();
        if state == ScanState::Idle {
            return;
        }
        info!(
            "cancel scanning on device \"{}\" at state {}",
            self.name, state
        );
        channel.request_cancel();
        if mode == CancelMode::Direct && state == ScanState::Scanning {
            self.source.cancel();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn channel(&self) -> Option<Arc<AcquisitionChannel>> {
        self.lock().as_ref().map(|session| session.channel.clone())
    }

    fn running_channel(&self) -> Result<Arc<AcquisitionChannel>, ScanError> {
        self.channel().ok_or_else(|| {
            LogicError::NotScanning {
                device: self.name.clone(),
            }
            .into()
        })
    }

    fn join(&self, channel: &Arc<AcquisitionChannel>) {
        let mut session = self.lock();
        if let Some(current) = session.as_mut() {
            if Arc::ptr_eq(&current.channel, channel) {
                current.join();
            }
        }
    }
}

impl<D: DataSource> Drop for Device<D> {
    fn drop(&mut self) {
        self.cancel(CancelMode::Safe);
        if let Some(session) = self.lock().as_mut() {
            session.join();
        }
    }
}

impl<D: DataSource> fmt::Debug for Device<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
