use super::{AcquisitionChannel, DataSource, ReadStatus, ScanState};
use crate::error::ScanError;
use log::debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Completed,
    Cancelled,
    Failed,
}

/// Body of the background thread of one scanning session.
pub(crate) struct Worker<D> {
    pub(crate) source: Arc<D>,
    pub(crate) channel: Arc<AcquisitionChannel>,
    pub(crate) read_chunk_size: usize,
}

impl<D: DataSource> Worker<D> {
    pub(crate) fn run(self) {
        debug!("background thread for scanning started");

        let exit = match panic::catch_unwind(AssertUnwindSafe(|| self.acquire())) {
            Ok(Ok(exit)) => exit,
            Ok(Err(ScanError::Device(err))) if err.is_cancelled() => {
                debug!(
                    "scanning cycle interrupted by an error {{{}}} with code {}",
                    err.context, err.status as u32
                );
                Exit::Cancelled
            }
            Ok(Err(err)) => {
                debug!("scanning cycle interrupted by an error {{{}}}", err);
                self.channel.fail(err);
                Exit::Failed
            }
            Err(payload) => {
                debug!("scanning cycle interrupted by some panic");
                self.channel.fail(ScanError::from_panic(payload));
                Exit::Failed
            }
        };

        if self.channel.scan_state() == ScanState::Scanning
            && exit != Exit::Cancelled
            && self.channel.is_last_frame()
        {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.source.cancel())) {
                self.channel.fail(ScanError::from_panic(payload));
            }
        }

        self.channel.finish();
        debug!("background scanning finished");
    }

    fn acquire(&self) -> Result<Exit, ScanError> {
        self.channel.set_state(ScanState::Starting);
        self.source.start()?;
        let params = self.source.parameters()?;
        debug!(
            "parameters got (last_frame={}), going to extract data",
            if params.last_frame { "TRUE" } else { "FALSE" }
        );
        self.channel.begin_scanning(params);

        let token = self.channel.cancel_token().clone();
        let mut total = 0usize;
        loop {
            let stop = token.is_cancelled();
            debug!(
                "check whether to stop -> {}",
                if stop { "[true]" } else { "[false]" }
            );
            if stop {
                self.source.cancel();
                debug!("scanning cycle interrupted by cancel flag request");
                return Ok(Exit::Cancelled);
            }

            let mut buf = vec![0; self.read_chunk_size];
            debug!("going to read up to {} bytes at offset {}", buf.len(), total);
            let read = match self.source.read(&mut buf)? {
                ReadStatus::Data(len) => len.min(buf.len()),
                ReadStatus::Eof => {
                    debug!("have read 0 bytes at offset {}", total);
                    return Ok(Exit::Completed);
                }
            };
            debug!("have read {} bytes at offset {}", read, total);
            if read > 0 {
                buf.truncate(read);
                self.channel.push(buf);
            }
            total += read;
        }
    }
}
