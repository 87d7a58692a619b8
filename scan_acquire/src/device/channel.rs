use super::{Notifier, ScanState};
use crate::error::{LogicError, ScanError};
use crate::model::params::ScanParameters;
use log::warn;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// A unit of data delivered from the device to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Chunk {
    /// Bytes of the current frame, never empty.
    Data(Vec<u8>),
    /// End of the session's stream, the last chunk of every session.
    End,
}

impl Chunk {
    pub fn is_end(&self) -> bool {
        matches!(self, Chunk::End)
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Chunk::Data(bytes) => bytes,
            Chunk::End => &[],
        }
    }
}

/// Cooperative cancellation flag shared between a session and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct ChannelState {
    scan_state: ScanState,
    params: Option<ScanParameters>,
    params_taken: bool,
    queue: VecDeque<Chunk>,
    // single slot, a newer error replaces a pending one
    error: Option<ScanError>,
    ended: bool,
}

/// Hand-off between the worker of one session and its consumer.
///
/// State, parameters, the pending error and the chunk queue share one mutex. Synchronous
/// consumers wait on the condition variable, asynchronous ones are told about every change
/// through the notifier and pull afterwards.
pub(crate) struct AcquisitionChannel {
    device: String,
    state: Mutex<ChannelState>,
    changed: Condvar,
    notifier: Option<Notifier>,
    capacity: Option<usize>,
    cancel: CancelToken,
}

impl AcquisitionChannel {
    pub(crate) fn new(device: String, notifier: Option<Notifier>, capacity: Option<usize>) -> Self {
        Self {
            device,
            state: Mutex::new(ChannelState {
                scan_state: ScanState::Initializing,
                params: None,
                params_taken: false,
                queue: VecDeque::new(),
                error: None,
                ended: false,
            }),
            changed: Condvar::new(),
            notifier,
            capacity,
            cancel: CancelToken::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, ChannelState>) -> MutexGuard<'a, ChannelState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.changed.notify_all();
        if let Some(notifier) = &self.notifier {
            notifier();
        }
    }

    pub(crate) fn is_synchronous(&self) -> bool {
        self.notifier.is_none()
    }

    pub(crate) fn scan_state(&self) -> ScanState {
        self.lock().scan_state
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.cancel();
        // taking the lock orders the store before a full queue's check and wait
        drop(self.lock());
        self.changed.notify_all();
    }

    pub(crate) fn is_last_frame(&self) -> bool {
        self.lock()
            .params
            .as_ref()
            .is_some_and(|params| params.last_frame)
    }

    pub(crate) fn set_state(&self, scan_state: ScanState) {
        self.lock().scan_state = scan_state;
        self.notify();
    }

    pub(crate) fn begin_scanning(&self, params: ScanParameters) {
        {
            let mut state = self.lock();
            state.params = Some(params);
            state.scan_state = ScanState::Scanning;
        }
        self.notify();
    }

    /// Queues a non-empty data chunk, waiting for space when the channel is full.
    pub(crate) fn push(&self, data: Vec<u8>) {
        debug_assert!(!data.is_empty());
        {
            let mut state = self.lock();
            if let Some(capacity) = self.capacity {
                while state.queue.len() >= capacity && !self.cancel.is_cancelled() {
                    state = self.wait(state);
                }
            }
            state.queue.push_back(Chunk::Data(data));
        }
        self.notify();
    }

    pub(crate) fn fail(&self, error: ScanError) {
        {
            let mut state = self.lock();
            if let Some(previous) = state.error.replace(error) {
                warn!(
                    "pending scanning error on device \"{}\" is replaced: {}",
                    self.device, previous
                );
            }
        }
        self.notify();
    }

    /// Queues the terminal chunk and returns to idle, in one step.
    pub(crate) fn finish(&self) {
        {
            let mut state = self.lock();
            state.queue.push_back(Chunk::End);
            state.ended = true;
            state.scan_state = ScanState::Idle;
        }
        self.notify();
    }

    /// Takes the parameters of the frame once the device reported them.
    ///
    /// Returns `Ok(None)` in asynchronous mode while the device is still starting.
    pub(crate) fn parameters(&self) -> Result<Option<ScanParameters>, ScanError> {
        let mut state = self.lock();
        loop {
            if let Some(error) = state.error.take() {
                return Err(error);
            }
            match state.scan_state {
                ScanState::Scanning | ScanState::Idle => {
                    let params = state.params.clone().ok_or_else(|| LogicError::NotScanning {
                        device: self.device.clone(),
                    })?;
                    state.params_taken = true;
                    return Ok(Some(params));
                }
                ScanState::Initializing | ScanState::Starting => {
                    if !self.is_synchronous() {
                        return Ok(None);
                    }
                    state = self.wait(state);
                }
            }
        }
    }

    /// Pops the oldest chunk.
    ///
    /// Returns `Ok(None)` in asynchronous mode when nothing is queued yet.
    pub(crate) fn pop(&self) -> Result<Option<Chunk>, ScanError> {
        let mut state = self.lock();
        loop {
            if let Some(error) = state.error.take() {
                return Err(error);
            }
            if !state.params_taken {
                return Err(LogicError::DataBeforeParameters {
                    device: self.device.clone(),
                }
                .into());
            }
            if let Some(chunk) = state.queue.pop_front() {
                drop(state);
                self.changed.notify_all();
                return Ok(Some(chunk));
            }
            if state.ended {
                return Err(LogicError::NotScanning {
                    device: self.device.clone(),
                }
                .into());
            }
            if !self.is_synchronous() {
                return Ok(None);
            }
            state = self.wait(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::model::params::FrameFormat;
    use crate::model::status::DeviceStatus;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    fn params() -> ScanParameters {
        ScanParameters {
            format: FrameFormat::Gray,
            last_frame: true,
            bytes_per_line: 1,
            pixels_per_line: 8,
            lines: Some(2),
            depth: 1,
        }
    }

    fn counting_channel(capacity: Option<usize>) -> (AcquisitionChannel, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let notifier: Notifier = {
            let count = count.clone();
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (
            AcquisitionChannel::new("test".to_owned(), Some(notifier), capacity),
            count,
        )
    }

    #[test]
    fn asynchronous_getters_do_not_block() {
        let (channel, notifications) = counting_channel(None);
        assert_eq!(channel.parameters().unwrap(), None);
        channel.set_state(ScanState::Starting);
        assert_eq!(channel.parameters().unwrap(), None);
        channel.begin_scanning(params());
        assert_eq!(channel.parameters().unwrap(), Some(params()));
        assert_eq!(channel.pop().unwrap(), None);
        channel.push(vec![1, 2]);
        channel.finish();
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![1, 2])));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::End));
        assert!(channel.pop().is_err());
        assert_eq!(notifications.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn data_before_parameters_is_a_logic_error() {
        let (channel, _) = counting_channel(None);
        assert!(matches!(
            channel.pop(),
            Err(ScanError::Logic(LogicError::DataBeforeParameters { .. }))
        ));
    }

    #[test]
    fn pending_error_comes_first_and_is_replaced() {
        let (channel, _) = counting_channel(None);
        channel.begin_scanning(params());
        channel.parameters().unwrap();
        channel.push(vec![1]);
        channel.fail(ScanError::Unknown("first".to_owned()));
        channel.fail(DeviceError::new("unable to read", DeviceStatus::IoError).into());
        channel.finish();
        assert!(matches!(channel.pop(), Err(ScanError::Device(_))));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![1])));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::End));
    }

    #[test]
    fn synchronous_pop_waits_for_producer() {
        let channel = Arc::new(AcquisitionChannel::new("test".to_owned(), None, None));
        let producer = {
            let channel = channel.clone();
            thread::spawn(move || {
                channel.begin_scanning(params());
                thread::sleep(Duration::from_millis(20));
                channel.push(vec![9]);
                channel.finish();
            })
        };
        assert_eq!(channel.parameters().unwrap(), Some(params()));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![9])));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::End));
        producer.join().unwrap();
    }

    #[test]
    fn bounded_push_waits_for_consumer_or_cancel() {
        let (channel, _) = counting_channel(Some(1));
        let channel = Arc::new(channel);
        channel.begin_scanning(params());
        channel.parameters().unwrap();
        channel.push(vec![1]);
        let producer = {
            let channel = channel.clone();
            thread::spawn(move || {
                channel.push(vec![2]);
                channel.push(vec![3]);
            })
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![1])));
        thread::sleep(Duration::from_millis(20));
        channel.request_cancel();
        producer.join().unwrap();
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![2])));
        assert_eq!(channel.pop().unwrap(), Some(Chunk::Data(vec![3])));
    }
}
