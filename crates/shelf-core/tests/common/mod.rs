#![allow(dead_code)]

pub mod gated;
pub mod http_server;

use std::time::Duration;

use shelf_core::TaskEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Waits (up to 10s) for the first event matching `pred`, skipping the rest.
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<TaskEvent>, mut pred: F) -> TaskEvent
where
    F: FnMut(&TaskEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(ev) if pred(&ev) => return ev,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for task event")
}
