//! The task record and its state machine.

use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque task identifier, allocated from a monotonic counter. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        TaskId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(TaskId)
    }
}

/// Lifecycle state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested transfer. The registry holds the canonical copy; callers only
/// ever see clones of it.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub url: String,
    pub destination: PathBuf,
    /// Fraction complete in [0.0, 1.0]. Only meaningful while downloading; 1.0 once completed.
    pub progress: f64,
    pub status: TaskStatus,
    pub bytes_written: u64,
    /// Expected size, if the transport announced one.
    pub total_bytes: Option<u64>,
    /// Cause of failure; set only when `status` is `Failed`.
    pub error: Option<String>,
    /// Creation time as Unix seconds.
    pub created_at: i64,
}

impl TaskRecord {
    pub(crate) fn new(id: TaskId, url: String, destination: PathBuf) -> Self {
        Self {
            id,
            url,
            destination,
            progress: 0.0,
            status: TaskStatus::Pending,
            bytes_written: 0,
            total_bytes: None,
            error: None,
            created_at: unix_timestamp(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True while downloading without a known size: `progress` cannot advance,
    /// only `bytes_written` does.
    pub fn is_indeterminate(&self) -> bool {
        self.status == TaskStatus::Downloading && self.total_bytes.is_none()
    }

    /// Pending → Downloading. Returns false for any other starting state.
    pub(crate) fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Downloading;
        true
    }

    /// Downloading → Completed with progress pinned to 1.0.
    pub(crate) fn complete(&mut self, bytes_written: u64) -> bool {
        if self.status != TaskStatus::Downloading {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.bytes_written = self.bytes_written.max(bytes_written);
        if self.total_bytes.is_none() {
            self.total_bytes = Some(self.bytes_written);
        }
        self.progress = 1.0;
        true
    }

    /// Downloading → Failed, recording the cause.
    pub(crate) fn fail(&mut self, error: String) -> bool {
        if self.status != TaskStatus::Downloading {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        true
    }

    /// Raises progress to `value` (clamped to [0, 1]). Never lowers it and
    /// ignores updates unless downloading. Returns true if progress changed.
    pub(crate) fn raise_progress(&mut self, value: f64) -> bool {
        if self.status != TaskStatus::Downloading || value.is_nan() {
            return false;
        }
        let value = value.clamp(0.0, 1.0);
        if value <= self.progress {
            return false;
        }
        self.progress = value;
        true
    }

    /// Applies a byte count from the transfer. A total of 0 is treated as unknown.
    /// Returns true if anything observable changed.
    pub(crate) fn record_bytes(&mut self, bytes_written: u64, total_bytes: Option<u64>) -> bool {
        if self.status != TaskStatus::Downloading {
            return false;
        }
        let mut changed = false;
        if let Some(total) = total_bytes.filter(|t| *t > 0) {
            if self.total_bytes != Some(total) {
                self.total_bytes = Some(total);
                changed = true;
            }
        }
        if bytes_written > self.bytes_written {
            self.bytes_written = bytes_written;
            changed = true;
        }
        if let Some(total) = self.total_bytes {
            changed |= self.raise_progress(self.bytes_written as f64 / total as f64);
        }
        changed
    }
}

/// Current time as Unix seconds.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
