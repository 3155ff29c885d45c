//! Ordered, in-memory collection of task records.
//!
//! Ids come from a monotonic counter, so key order in the map is insertion
//! order. The registry is not synchronized itself; the dispatcher keeps it
//! behind its lock so readers never observe a half-applied update.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::record::{TaskId, TaskRecord, TaskStatus};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, TaskRecord>,
    last_id: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new `pending` record at the back of the queue and returns its id.
    pub fn create(&mut self, url: impl Into<String>, destination: impl Into<PathBuf>) -> TaskId {
        self.last_id += 1;
        let id = TaskId::from_raw(self.last_id);
        self.tasks
            .insert(id, TaskRecord::new(id, url.into(), destination.into()));
        id
    }

    /// Snapshot of one record.
    pub fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.tasks.get(&id).cloned()
    }

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(|t| t.status)
    }

    /// Snapshots of every record in insertion order.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.tasks.values().cloned().collect()
    }

    /// Earliest-inserted record still `pending`.
    pub fn next_pending(&self) -> Option<TaskId> {
        self.tasks
            .values()
            .find(|t| t.status == TaskStatus::Pending)
            .map(|t| t.id)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Applies a status transition. Only `pending → downloading` and
    /// `downloading → completed | failed` are accepted; returns false otherwise.
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        match status {
            TaskStatus::Downloading => task.start(),
            TaskStatus::Completed => {
                let written = task.bytes_written;
                task.complete(written)
            }
            TaskStatus::Failed => task.fail(String::from("failed")),
            TaskStatus::Pending => false,
        }
    }

    /// Raises a downloading task's progress fraction. Returns true if it changed.
    pub fn set_progress(&mut self, id: TaskId, value: f64) -> bool {
        self.tasks
            .get_mut(&id)
            .is_some_and(|t| t.raise_progress(value))
    }

    /// Applies a byte count reported by the transfer. Returns the updated
    /// `(progress, bytes_written)` if anything changed.
    pub fn record_bytes(
        &mut self,
        id: TaskId,
        bytes_written: u64,
        total_bytes: Option<u64>,
    ) -> Option<(f64, u64)> {
        let task = self.tasks.get_mut(&id)?;
        task.record_bytes(bytes_written, total_bytes)
            .then_some((task.progress, task.bytes_written))
    }

    /// Marks a downloading task completed with `bytes_written` bytes on disk.
    pub fn mark_completed(&mut self, id: TaskId, bytes_written: u64) -> bool {
        self.tasks
            .get_mut(&id)
            .is_some_and(|t| t.complete(bytes_written))
    }

    /// Marks a downloading task failed with a human-readable cause.
    pub fn mark_failed(&mut self, id: TaskId, error: impl Into<String>) -> bool {
        self.tasks
            .get_mut(&id)
            .is_some_and(|t| t.fail(error.into()))
    }

    /// Removes a terminal record. Pending or downloading records stay put.
    pub fn remove(&mut self, id: TaskId) -> Option<TaskRecord> {
        if !self.tasks.get(&id)?.is_terminal() {
            return None;
        }
        self.tasks.remove(&id)
    }

    /// Removes every terminal record; returns how many were dropped.
    pub fn purge_terminal(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, t| !t.is_terminal());
        before - self.tasks.len()
    }
}
