//! Transfer executors: the pluggable byte-moving half of a download.
//!
//! The dispatcher runs `TransferExecutor::transfer` on the blocking pool for
//! each admitted task, passing a progress sink and the task's abort token.
//! The call returns exactly once: the byte count on success, or the cause of
//! failure. The abort token is the cancellable handle for the transfer.

mod http;
mod error;

pub use self::http::{CurlExecutor, CurlOptions};
pub use self::error::TransferError;

use std::path::PathBuf;

use crate::control::AbortToken;
use crate::task::{TaskId, TaskRecord};

/// What to transfer. Built from the task record at admission time.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub task_id: TaskId,
    pub url: String,
    pub destination: PathBuf,
}

impl From<&TaskRecord> for TransferRequest {
    fn from(task: &TaskRecord) -> Self {
        Self {
            task_id: task.id,
            url: task.url.clone(),
            destination: task.destination.clone(),
        }
    }
}

/// Receives byte counts while a transfer runs. `total_bytes` is `None` when
/// the size is unknown.
pub trait ProgressSink: Send + Sync {
    fn report(&self, bytes_written: u64, total_bytes: Option<u64>);
}

/// Performs one transfer from `request.url` to `request.destination`.
///
/// Runs on a blocking thread. Implementations must poll `abort` as bytes arrive
/// and return `TransferError::Aborted` once they observe it; any partially
/// written output must be cleaned up before returning an error.
pub trait TransferExecutor: Send + Sync + 'static {
    fn transfer(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        abort: &AbortToken,
    ) -> Result<u64, TransferError>;
}
