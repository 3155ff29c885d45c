//! Task records and the registry that owns them.
//!
//! A task is one requested transfer (URL → destination path). The registry is
//! the single owner of every record; everything else reads snapshots.

mod event;
mod record;
mod registry;

pub use event::{TaskEvent, TaskEventKind};
pub use record::{TaskId, TaskRecord, TaskStatus};
pub use registry::TaskRegistry;
