use super::{Capture, CaptureOutcome};
use crate::device::{DataSource, Notifier};
use crate::error::ScanError;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::ready;
use futures::task::{Context, Poll};
use futures::{Future, Stream};
use pin_project::pin_project;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

const NOTIFICATIONS_CLOSED: &str = "notification channel closed";

impl<D: DataSource> Capture<D> {
    /// Runs the capture on the calling thread until it ends.
    pub fn run_blocking(&mut self) -> CaptureOutcome {
        let (sender, receiver) = std::sync::mpsc::channel::<()>();
        let sender = Mutex::new(sender);
        let notifier: Notifier = Arc::new(move || {
            // the receiver is gone once the capture has returned
            let _ = sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .send(());
        });
        if let Some(outcome) = self.start(Some(notifier)) {
            return outcome;
        }
        loop {
            if let Some(outcome) = self.on_notify() {
                return outcome;
            }
            if receiver.recv().is_err() {
                return self.fail(
                    "Can't get another captured image data",
                    ScanError::Unknown(NOTIFICATIONS_CLOSED.to_owned()),
                );
            }
        }
    }

    /// Turns the capture into a future resolving to its outcome.
    ///
    /// The scanning session is started on the first poll. Polling never waits for data, but
    /// the poll that sees the end of a session joins its worker, which may wait for the
    /// device to finish cancelling.
    pub fn run(self) -> CaptureFuture<D> {
        let (sender, receiver) = mpsc::unbounded();
        CaptureFuture {
            capture: self,
            receiver,
            sender: Some(sender),
        }
    }
}

#[pin_project]
pub struct CaptureFuture<D: DataSource> {
    capture: Capture<D>,
    #[pin]
    receiver: UnboundedReceiver<()>,
    // taken when the session is started
    sender: Option<UnboundedSender<()>>,
}

impl<D: DataSource> CaptureFuture<D> {
    pub fn capture(&self) -> &Capture<D> {
        &self.capture
    }
}

impl<D: DataSource> Future for CaptureFuture<D> {
    type Output = CaptureOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        if let Some(sender) = this.sender.take() {
            let notifier: Notifier = Arc::new(move || {
                let _ = sender.unbounded_send(());
            });
            if let Some(outcome) = this.capture.start(Some(notifier)) {
                return Poll::Ready(outcome);
            }
        }
        loop {
            if let Some(outcome) = this.capture.on_notify() {
                return Poll::Ready(outcome);
            }
            if ready!(this.receiver.as_mut().poll_next(cx)).is_none() {
                return Poll::Ready(this.capture.fail(
                    "Can't get another captured image data",
                    ScanError::Unknown(NOTIFICATIONS_CLOSED.to_owned()),
                ));
            }
        }
    }
}
