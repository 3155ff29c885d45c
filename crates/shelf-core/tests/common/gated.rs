//! Test executor whose transfers are driven step by step from the test body.

use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use shelf_core::control::AbortToken;
use shelf_core::executor::{ProgressSink, TransferError, TransferExecutor, TransferRequest};

/// One instruction for a gated transfer.
#[derive(Debug)]
pub enum Step {
    Progress { written: u64, total: Option<u64> },
    Succeed(u64),
    Fail(String),
}

/// Each URL gets a gate (channel) before it is enqueued; its transfer blocks
/// until the test sends `Succeed`/`Fail`, or the task is aborted.
/// Dropping the sender resolves the transfer as aborted.
#[derive(Default)]
pub struct GatedExecutor {
    gates: Mutex<HashMap<String, Receiver<Step>>>,
}

impl GatedExecutor {
    pub fn gate(&self, url: &str) -> Sender<Step> {
        let (tx, rx) = mpsc::channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        tx
    }
}

impl TransferExecutor for GatedExecutor {
    fn transfer(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        abort: &AbortToken,
    ) -> Result<u64, TransferError> {
        let rx = self
            .gates
            .lock()
            .unwrap()
            .remove(&request.url)
            .ok_or_else(|| TransferError::InvalidUrl(format!("no gate for {}", request.url)))?;
        loop {
            if abort.is_aborted() {
                return Err(TransferError::Aborted);
            }
            match rx.recv_timeout(Duration::from_millis(5)) {
                Ok(Step::Progress { written, total }) => progress.report(written, total),
                Ok(Step::Succeed(bytes)) => return Ok(bytes),
                Ok(Step::Fail(msg)) => {
                    return Err(TransferError::Storage(io::Error::new(io::ErrorKind::Other, msg)))
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(TransferError::Aborted),
            }
        }
    }
}
