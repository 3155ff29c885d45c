//! Public entry point: enqueue, query and cancel downloads.
//!
//! `DownloadCoordinator` is a cheap, clonable handle over one dispatcher.
//! Every operation returns immediately; outcomes are observed through
//! `get_task` / `get_all_tasks` or the event channel from `subscribe`.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{ConfigError, ShelfConfig, DEFAULT_MAX_CONCURRENT};
use crate::executor::{CurlExecutor, CurlOptions, TransferExecutor};
use crate::scheduler::Dispatcher;
use crate::task::{TaskEvent, TaskId, TaskRecord};

/// Library-level coordinator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Concurrency ceiling; must be at least 1.
    pub max_concurrent: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl From<&ShelfConfig> for CoordinatorOptions {
    fn from(cfg: &ShelfConfig) -> Self {
        Self {
            max_concurrent: cfg.max_concurrent,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Transfers are spawned on tokio; construct the coordinator inside a runtime.
    #[error("download coordinator must be created inside a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    dispatcher: Arc<Dispatcher>,
}

impl DownloadCoordinator {
    /// Creates a coordinator on the current tokio runtime using `executor` for transfers.
    pub fn new(
        options: CoordinatorOptions,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<Self, CoordinatorError> {
        if options.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency.into());
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CoordinatorError::NoRuntime)?;
        Ok(Self {
            dispatcher: Dispatcher::new(executor, options.max_concurrent, runtime),
        })
    }

    /// Coordinator backed by the curl executor, configured from `cfg`.
    pub fn from_config(cfg: &ShelfConfig) -> Result<Self, CoordinatorError> {
        cfg.validate()?;
        let executor = CurlExecutor::new(CurlOptions::from(cfg));
        Self::new(CoordinatorOptions::from(cfg), Arc::new(executor))
    }

    /// Queues a download and returns its id. Starts it right away if a slot is free.
    pub fn add_download(&self, url: impl Into<String>, destination: impl Into<PathBuf>) -> TaskId {
        self.dispatcher.enqueue(url.into(), destination.into())
    }

    pub fn get_task(&self, id: TaskId) -> Option<TaskRecord> {
        self.dispatcher.get(id)
    }

    /// Snapshots of every known task in the order they were added.
    pub fn get_all_tasks(&self) -> Vec<TaskRecord> {
        self.dispatcher.list()
    }

    /// Cancels a downloading task; the task becomes `failed` immediately and
    /// its slot goes to the next pending task. A no-op for pending, completed,
    /// failed or unknown tasks. Returns true if the task was cancelled.
    pub fn cancel_download(&self, id: TaskId) -> bool {
        self.dispatcher.cancel(id)
    }

    /// Drops a completed or failed task from the registry.
    pub fn remove_task(&self, id: TaskId) -> Option<TaskRecord> {
        self.dispatcher.remove(id)
    }

    /// Drops every completed or failed task; returns how many were removed.
    pub fn purge_finished(&self) -> usize {
        self.dispatcher.purge_finished()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.dispatcher.subscribe()
    }

    pub fn is_idle(&self) -> bool {
        self.dispatcher.is_idle()
    }

    /// Waits until no task is pending or downloading.
    pub async fn wait_idle(&self) {
        self.dispatcher.wait_idle().await
    }

    /// Like `wait_idle`, but also waits for cancelled transfers to return and
    /// remove their partial files. Await this before exiting the process.
    pub async fn wait_transfers_finished(&self) {
        self.dispatcher.wait_transfers_finished().await
    }

    pub fn max_concurrent(&self) -> usize {
        self.dispatcher.max_concurrent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_two() {
        assert_eq!(CoordinatorOptions::default().max_concurrent, 2);
        let cfg = ShelfConfig {
            max_concurrent: 5,
            ..ShelfConfig::default()
        };
        assert_eq!(CoordinatorOptions::from(&cfg).max_concurrent, 5);
    }

    #[test]
    fn new_outside_runtime_fails() {
        let res = DownloadCoordinator::new(
            CoordinatorOptions::default(),
            Arc::new(CurlExecutor::default()),
        );
        assert!(matches!(res, Err(CoordinatorError::NoRuntime)));
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let res = DownloadCoordinator::new(
            CoordinatorOptions { max_concurrent: 0 },
            Arc::new(CurlExecutor::default()),
        );
        assert!(matches!(
            res,
            Err(CoordinatorError::Config(ConfigError::ZeroConcurrency))
        ));
    }

    #[tokio::test]
    async fn empty_coordinator_is_idle() {
        let coordinator = DownloadCoordinator::from_config(&ShelfConfig::default()).unwrap();
        assert_eq!(coordinator.max_concurrent(), 2);
        assert!(coordinator.is_idle());
        assert!(coordinator.get_all_tasks().is_empty());
        coordinator.wait_idle().await;
    }
}
