//! Dispatcher: the admission loop and every task state transition.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};

use crate::control::{AbortToken, TransferControl};
use crate::executor::{TransferError, TransferExecutor, TransferRequest};
use crate::task::{TaskEvent, TaskEventKind, TaskId, TaskRecord, TaskRegistry, TaskStatus};

use super::guard::SlotGuard;
use super::progress::TaskProgress;

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Error recorded on a task cancelled while downloading.
pub(crate) const CANCELLED_ERROR: &str = "cancelled by user";

/// State guarded by the dispatcher lock. `control.active()` always equals the
/// number of `downloading` records. `running` counts executor calls that have
/// not returned yet; a cancelled transfer leaves `control` at once but stays
/// in `running` until its thread is done cleaning up.
struct Shared {
    registry: TaskRegistry,
    control: TransferControl,
    running: usize,
}

/// Owns the registry and enforces the concurrency ceiling.
pub struct Dispatcher {
    state: Mutex<Shared>,
    executor: Arc<dyn TransferExecutor>,
    max_concurrent: usize,
    runtime: Handle,
    events: broadcast::Sender<TaskEvent>,
    idle: Notify,
}

impl Dispatcher {
    /// Transfers are spawned onto `runtime`; `max_concurrent` is clamped to at least 1.
    pub fn new(
        executor: Arc<dyn TransferExecutor>,
        max_concurrent: usize,
        runtime: Handle,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            state: Mutex::new(Shared {
                registry: TaskRegistry::new(),
                control: TransferControl::new(),
                running: 0,
            }),
            executor,
            max_concurrent: max_concurrent.max(1),
            runtime,
            events,
            idle: Notify::new(),
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called with the lock held so subscribers see events in state order.
    fn emit(&self, id: TaskId, kind: TaskEventKind) {
        let _ = self.events.send(TaskEvent::new(id, kind));
    }

    /// Creates a `pending` task and runs admission. Never waits on the transfer.
    pub fn enqueue(self: &Arc<Self>, url: String, destination: PathBuf) -> TaskId {
        let id = {
            let mut state = self.lock();
            let id = state.registry.create(url, destination);
            self.emit(id, TaskEventKind::Queued);
            id
        };
        tracing::debug!(task_id = %id, "download queued");
        self.dispatch();
        id
    }

    /// Admits the oldest pending tasks until the ceiling is reached or none are
    /// left. Idempotent and safe to call from any thread at any time.
    pub fn dispatch(self: &Arc<Self>) {
        let admitted = self.admit();
        if admitted.is_empty() {
            tracing::trace!("dispatch: nothing to admit");
        }
        for (request, abort) in admitted {
            self.spawn_transfer(request, abort);
        }
        if self.is_idle() {
            self.idle.notify_waiters();
        }
    }

    /// Called when a transfer task is dropped by its runtime. Frees the slot
    /// without admitting anything: the runtime is going away.
    pub(super) fn abandon(&self, id: TaskId) {
        self.finish(
            id,
            Err(TransferError::Crashed("transfer task dropped".into())),
        );
        self.idle.notify_waiters();
    }

    /// The admission critical section: read the running count, pick, mark and
    /// register under one lock.
    fn admit(&self) -> Vec<(TransferRequest, AbortToken)> {
        let mut state = self.lock();
        let mut admitted = Vec::new();
        while state.control.active() < self.max_concurrent {
            let Some(id) = state.registry.next_pending() else {
                break;
            };
            if !state.registry.set_status(id, TaskStatus::Downloading) {
                break;
            }
            let abort = state.control.register(id);
            state.running += 1;
            let Some(task) = state.registry.get(id) else {
                break;
            };
            tracing::info!(task_id = %id, url = %task.url, "download started");
            self.emit(id, TaskEventKind::Started);
            admitted.push((TransferRequest::from(&task), abort));
        }
        admitted
    }

    fn spawn_transfer(self: &Arc<Self>, request: TransferRequest, abort: AbortToken) {
        let guard = SlotGuard::new(Arc::clone(self), request.task_id);
        let executor = Arc::clone(&self.executor);
        let sink = TaskProgress {
            dispatcher: Arc::clone(self),
            id: request.task_id,
        };
        self.runtime.spawn(async move {
            let joined =
                tokio::task::spawn_blocking(move || executor.transfer(&request, &sink, &abort))
                    .await;
            let outcome = joined.unwrap_or_else(|e| Err(TransferError::Crashed(e.to_string())));
            guard.finish(outcome);
        });
    }

    /// Applies a transfer's resolution once the executor has returned. The
    /// slot is released unconditionally; a task that is already terminal
    /// (cancelled) keeps its state.
    pub(super) fn finish(&self, id: TaskId, outcome: Result<u64, TransferError>) {
        let mut state = self.lock();
        state.running = state.running.saturating_sub(1);
        let handle = state.control.release(id);
        if let Some(h) = handle.as_ref().filter(|_| outcome.is_err()) {
            h.cancel();
        }
        let elapsed_ms = handle.map(|h| h.elapsed().as_millis() as u64);
        match outcome {
            Ok(bytes) => {
                if state.registry.mark_completed(id, bytes) {
                    tracing::info!(task_id = %id, bytes, elapsed_ms = ?elapsed_ms, "download completed");
                    self.emit(id, TaskEventKind::Completed);
                } else {
                    tracing::debug!(task_id = %id, "transfer finished after task became terminal");
                }
            }
            Err(e) => {
                let error = e.to_string();
                if state.registry.mark_failed(id, error.clone()) {
                    tracing::warn!(task_id = %id, elapsed_ms = ?elapsed_ms, "download failed: {}", error);
                    self.emit(id, TaskEventKind::Failed { error });
                } else if matches!(e, TransferError::Aborted) {
                    tracing::debug!(task_id = %id, "abort acknowledged by transfer");
                } else {
                    tracing::debug!(task_id = %id, "transfer error after task became terminal: {}", error);
                }
            }
        }
    }

    pub(super) fn record_progress(&self, id: TaskId, bytes_written: u64, total_bytes: Option<u64>) {
        let mut state = self.lock();
        if let Some((progress, bytes_written)) =
            state.registry.record_bytes(id, bytes_written, total_bytes)
        {
            self.emit(
                id,
                TaskEventKind::Progress {
                    progress,
                    bytes_written,
                },
            );
        }
    }

    /// Cancels a downloading task: marks it failed, aborts the transfer and
    /// frees its slot. Any other state is left untouched. Returns true if the
    /// task was cancelled.
    pub fn cancel(self: &Arc<Self>, id: TaskId) -> bool {
        let cancelled = {
            let mut state = self.lock();
            if state.registry.status(id) == Some(TaskStatus::Downloading) {
                state.registry.mark_failed(id, CANCELLED_ERROR);
                if let Some(handle) = state.control.release(id) {
                    handle.cancel();
                }
                self.emit(id, TaskEventKind::Cancelled);
                true
            } else {
                false
            }
        };
        if cancelled {
            tracing::info!(task_id = %id, "download cancelled");
            self.dispatch();
        } else {
            tracing::debug!(task_id = %id, "cancel ignored: task is not downloading");
        }
        cancelled
    }

    pub fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.lock().registry.get(id)
    }

    pub fn list(&self) -> Vec<TaskRecord> {
        self.lock().registry.list()
    }

    /// Removes a terminal task from the registry.
    pub fn remove(&self, id: TaskId) -> Option<TaskRecord> {
        self.lock().registry.remove(id)
    }

    /// Removes every terminal task; returns how many were dropped.
    pub fn purge_finished(&self) -> usize {
        self.lock().registry.purge_terminal()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// No task is pending or downloading.
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.control.active() == 0 && state.registry.next_pending().is_none()
    }

    /// No task is pending or downloading and every executor call has returned.
    pub fn is_settled(&self) -> bool {
        let state = self.lock();
        state.running == 0
            && state.control.active() == 0
            && state.registry.next_pending().is_none()
    }

    /// Resolves once no task is pending or downloading.
    pub async fn wait_idle(&self) {
        self.wait_until(Self::is_idle).await
    }

    /// Resolves once the queue is idle and cancelled transfers have also
    /// finished cleaning up after themselves.
    pub async fn wait_transfers_finished(&self) {
        self.wait_until(Self::is_settled).await
    }

    async fn wait_until(&self, done: fn(&Self) -> bool) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if done(self) {
                return;
            }
            notified.await;
        }
    }
}
