//! Notifications emitted as tasks move through their lifecycle.

use super::record::TaskId;

/// What happened to a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEventKind {
    /// Accepted and waiting for a slot.
    Queued,
    /// Admitted by the dispatcher; the transfer is starting.
    Started,
    /// More bytes arrived. `progress` stays 0.0 when the size is unknown.
    Progress { progress: f64, bytes_written: u64 },
    Completed,
    Failed { error: String },
    /// Cancelled while downloading (the task is now `failed`).
    Cancelled,
}

/// One lifecycle notification. Events for a single task arrive in state-machine order.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEvent {
    pub id: TaskId,
    pub kind: TaskEventKind,
}

impl TaskEvent {
    pub fn new(id: TaskId, kind: TaskEventKind) -> Self {
        Self { id, kind }
    }

    /// True for events after which the task never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            TaskEventKind::Completed | TaskEventKind::Failed { .. } | TaskEventKind::Cancelled
        )
    }
}
