//! `shelf fetch` – download URLs through the coordinator and wait for them.

use anyhow::{bail, Result};
use shelf_core::config::ShelfConfig;
use shelf_core::library::LibraryEntry;
use shelf_core::url_model;
use shelf_core::{DownloadCoordinator, TaskEvent, TaskEventKind, TaskRecord, TaskStatus};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_fetch(cfg: &ShelfConfig, urls: &[String], dest_dir: &Path) -> Result<()> {
    let coordinator = DownloadCoordinator::from_config(cfg)?;
    let printer = tokio::spawn(print_progress(coordinator.subscribe()));

    let mut taken = HashSet::new();
    for url in urls {
        let destination = unique_destination(dest_dir, url, &mut taken);
        let id = coordinator.add_download(url.as_str(), destination);
        tracing::debug!(task_id = %id, url = %url, "queued from command line");
    }

    let admissions = coordinator.subscribe();
    tokio::select! {
        _ = coordinator.wait_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted, cancelling downloads");
            cancel_all(&coordinator, admissions).await;
        }
    }
    // Cancelled transfers remove their partial files before the process exits.
    coordinator.wait_transfers_finished().await;
    printer.abort();

    let tasks = coordinator.get_all_tasks();
    print_summary(&tasks);
    let failed = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Completed)
        .count();
    if failed > 0 {
        bail!("{} of {} download(s) failed", failed, tasks.len());
    }
    Ok(())
}

/// Cancels downloading tasks until the queue is idle. Each cancel admits a
/// pending task; its `Started` event wakes the next pass.
async fn cancel_all(coordinator: &DownloadCoordinator, mut events: broadcast::Receiver<TaskEvent>) {
    loop {
        for task in coordinator.get_all_tasks() {
            if task.status == TaskStatus::Downloading {
                coordinator.cancel_download(task.id);
            }
        }
        if coordinator.is_idle() {
            return;
        }
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return,
        }
    }
}

/// `dest_dir/<name>` from the URL, with `-2`, `-3`... added on collisions.
fn unique_destination(dest_dir: &Path, url: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let name = url_model::derive_filename(url);
    let mut candidate = dest_dir.join(&name);
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        let path = Path::new(&name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("download");
        candidate = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => dest_dir.join(format!("{stem}-{n}.{ext}")),
            None => dest_dir.join(format!("{stem}-{n}")),
        };
        n += 1;
    }
    candidate
}

async fn print_progress(mut events: broadcast::Receiver<TaskEvent>) {
    let mut last_print: HashMap<_, Instant> = HashMap::new();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress printer lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let id = event.id;
        match event.kind {
            TaskEventKind::Queued => {}
            TaskEventKind::Started => println!("[{id}] started"),
            TaskEventKind::Progress {
                progress,
                bytes_written,
            } => {
                let now = Instant::now();
                let due = last_print.get(&id).map_or(true, |t| {
                    now.duration_since(*t).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                });
                if due {
                    let done_mib = bytes_written as f64 / 1_048_576.0;
                    if progress > 0.0 {
                        println!("[{id}] {:.1} MiB ({:.1}%)", done_mib, progress * 100.0);
                    } else {
                        println!("[{id}] {:.1} MiB", done_mib);
                    }
                    last_print.insert(id, now);
                }
            }
            TaskEventKind::Completed => println!("[{id}] done"),
            TaskEventKind::Failed { error } => println!("[{id}] failed: {error}"),
            TaskEventKind::Cancelled => println!("[{id}] cancelled"),
        }
    }
}

fn print_summary(tasks: &[TaskRecord]) {
    println!(
        "{:<6} {:<12} {:<8} {:<10} {}",
        "ID", "STATUS", "PROGRESS", "SIZE", "RESULT"
    );
    for t in tasks {
        let size_str = t
            .total_bytes
            .map(|s| format!("{s}"))
            .unwrap_or_else(|| "-".to_string());
        let result = match LibraryEntry::from_completed(t) {
            Some(entry) => format!("{} -> {}", entry.title, entry.file_path.display()),
            None => t.error.clone().unwrap_or_else(|| t.url.clone()),
        };
        println!(
            "{:<6} {:<12} {:<8} {:<10} {}",
            t.id.to_string(),
            t.status.as_str(),
            format!("{:.0}%", t.progress * 100.0),
            size_str,
            result
        );
    }
}
