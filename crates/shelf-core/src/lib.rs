//! Download coordinator for a personal e-book library.
//!
//! Accepts download requests, runs a bounded number of them at once, tracks
//! per-task progress and terminal status, and supports cancellation.

pub mod config;
pub mod control;
pub mod coordinator;
pub mod executor;
pub mod library;
pub mod logging;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod url_model;

pub use coordinator::{CoordinatorError, CoordinatorOptions, DownloadCoordinator};
pub use task::{TaskEvent, TaskEventKind, TaskId, TaskRecord, TaskStatus};
