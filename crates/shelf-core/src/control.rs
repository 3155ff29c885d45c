//! Cancellation: per-transfer abort tokens and the set of running transfers.
//!
//! Each admitted task gets an abort token that is handed to its transfer. The
//! dispatcher keeps the tokens in `TransferControl`; its size is the number of
//! occupied concurrency slots. Cancelling a task sets the token; the transfer
//! checks it between chunks and stops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::task::TaskId;

/// Shared abort flag between the dispatcher and one in-flight transfer.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the transfer to stop. Idempotent.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cancellable handle for one running transfer.
#[derive(Debug)]
pub struct TransferHandle {
    token: AbortToken,
    started: Instant,
}

impl TransferHandle {
    /// Best-effort abort of the transfer.
    pub fn cancel(&self) {
        self.token.abort();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Running transfers keyed by task id. One entry per occupied slot.
#[derive(Debug, Default)]
pub struct TransferControl {
    active: HashMap<TaskId, TransferHandle>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transfer about to start; returns the token to pass to it.
    pub fn register(&mut self, id: TaskId) -> AbortToken {
        let token = AbortToken::new();
        self.active.insert(
            id,
            TransferHandle {
                token: token.clone(),
                started: Instant::now(),
            },
        );
        token
    }

    /// Free the slot held by `id`. Returns the handle if it was still registered.
    pub fn release(&mut self, id: TaskId) -> Option<TransferHandle> {
        self.active.remove(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.active.contains_key(&id)
    }

    /// Number of occupied slots.
    pub fn active(&self) -> usize {
        self.active.len()
    }
}
