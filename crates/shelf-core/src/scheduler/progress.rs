//! Progress sink that writes transfer byte counts into the registry.

use std::sync::Arc;

use crate::executor::ProgressSink;
use crate::task::TaskId;

use super::dispatch::Dispatcher;

pub(super) struct TaskProgress {
    pub(super) dispatcher: Arc<Dispatcher>,
    pub(super) id: TaskId,
}

impl ProgressSink for TaskProgress {
    fn report(&self, bytes_written: u64, total_bytes: Option<u64>) {
        self.dispatcher
            .record_progress(self.id, bytes_written, total_bytes);
    }
}
