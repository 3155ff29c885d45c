//! RAII guard that frees a concurrency slot when a transfer task ends.

use std::sync::Arc;

use crate::executor::TransferError;
use crate::task::TaskId;

use super::dispatch::Dispatcher;

/// Records the transfer outcome and releases the slot when dropped, then
/// re-runs dispatch. Dropped without an outcome (the runtime shut down and
/// discarded the task) it still releases the slot and fails the task, but
/// admits nothing further.
pub(super) struct SlotGuard {
    dispatcher: Arc<Dispatcher>,
    id: TaskId,
    outcome: Option<Result<u64, TransferError>>,
}

impl SlotGuard {
    pub(super) fn new(dispatcher: Arc<Dispatcher>, id: TaskId) -> Self {
        Self {
            dispatcher,
            id,
            outcome: None,
        }
    }

    pub(super) fn finish(mut self, outcome: Result<u64, TransferError>) {
        self.outcome = Some(outcome);
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        match self.outcome.take() {
            Some(outcome) => {
                self.dispatcher.finish(self.id, outcome);
                self.dispatcher.dispatch();
            }
            None => {
                tracing::debug!(task_id = %self.id, "transfer task dropped by runtime");
                self.dispatcher.abandon(self.id);
            }
        }
    }
}
