//! Admission control for downloads.
//!
//! The dispatcher owns the task registry and the set of running transfers
//! behind one lock. Admission ("count running → pick the oldest pending task →
//! mark it downloading → register its slot") happens inside a single critical
//! section, so concurrent triggers can never over-admit. Transfers run on the
//! blocking pool; when one resolves, its slot is released and dispatch runs
//! again, draining the backlog without a poller.

mod dispatch;
mod guard;
mod progress;

pub use dispatch::Dispatcher;
