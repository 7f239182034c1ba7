//! # LogWriter: events as `tracing` records
//!
//! A minimal subscriber that turns every [`Event`] into a `tracing` record under the
//! `taskbatch::events` target. Task failures and subscriber trouble log at `WARN`,
//! cancellations at `INFO`, everything else at `DEBUG`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG taskbatch::events: batch started total=4
//! DEBUG taskbatch::events: task starting task="page-2" index=0
//!  WARN taskbatch::events: task failed task="page-3" index=1 reason="connection reset"
//!  INFO taskbatch::events: batch cancelled total=4 reason="task #1 failed: connection reset"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::BatchStarted => {
                tracing::debug!(target: "taskbatch::events", seq = e.seq, total = ?e.total, "batch started");
            }
            EventKind::BatchCompleted => {
                tracing::debug!(target: "taskbatch::events", seq = e.seq, total = ?e.total, reason, "batch completed");
            }
            EventKind::BatchCancelled => {
                tracing::info!(target: "taskbatch::events", seq = e.seq, total = ?e.total, reason, "batch cancelled");
            }
            EventKind::TaskStarting => {
                tracing::debug!(target: "taskbatch::events", seq = e.seq, task, index = ?e.index, "task starting");
            }
            EventKind::TaskCompleted => {
                tracing::debug!(target: "taskbatch::events", seq = e.seq, task, index = ?e.index, "task completed");
            }
            EventKind::TaskFailed => {
                tracing::warn!(target: "taskbatch::events", seq = e.seq, task, index = ?e.index, reason, "task failed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "taskbatch::events", subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "taskbatch::events", subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
