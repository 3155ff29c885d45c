//! Transfer failure causes.

use thiserror::Error;

/// Why a transfer did not complete. Recorded on the task as a string; never
/// propagated to the coordinator's caller.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Unsupported or unparseable source URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Curl reported an error (connection refused, DNS, TLS, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Fewer bytes arrived than the server announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Creating, writing or renaming the destination failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Stopped because the task was cancelled.
    #[error("transfer aborted")]
    Aborted,
    /// The executor panicked or its thread was lost.
    #[error("transfer worker crashed: {0}")]
    Crashed(String),
}
