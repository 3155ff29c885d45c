//! Handoff of finished downloads to the library store.
//!
//! The store itself lives outside this crate; callers implement
//! `LibraryStore` and pass it entries built from completed task snapshots.
//! The coordinator never talks to the store.

use std::path::PathBuf;

use crate::task::{TaskRecord, TaskStatus};

/// A new book record as handed to the library store.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub title: String,
    pub author: Option<String>,
    pub file_path: PathBuf,
    pub current_page: u32,
    pub reading_progress: f64,
    pub is_finished: bool,
}

impl LibraryEntry {
    /// Builds an unread entry for a completed download. None for any other status.
    pub fn from_completed(task: &TaskRecord) -> Option<Self> {
        if task.status != TaskStatus::Completed {
            return None;
        }
        Some(Self {
            title: title_from_path(&task.destination),
            author: None,
            file_path: task.destination.clone(),
            current_page: 0,
            reading_progress: 0.0,
            is_finished: false,
        })
    }
}

/// Persistence collaborator that records a downloaded book and returns its id.
pub trait LibraryStore {
    fn create_library_entry(&self, entry: &LibraryEntry) -> anyhow::Result<String>;
}

/// File stem with `_` and `-` turned into spaces, e.g. `war_and_peace.pdf` → `war and peace`.
fn title_from_path(path: &std::path::Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = stem
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}
