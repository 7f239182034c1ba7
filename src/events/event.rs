//! # Runtime events emitted by task batches.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Batch events**: a batch started, completed or was cancelled
//! - **Task events**: one task started, completed or failed
//! - **Subscriber events**: delivery problems inside [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries metadata such as timestamps, task name and index,
//! batch size and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskbatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("fetch-page-3")
//!     .with_index(2)
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("fetch-page-3"));
//! assert_eq!(ev.index, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Batch events ===
    /// Batch submitted its tasks for execution.
    ///
    /// Sets:
    /// - `total`: number of tasks in the batch
    BatchStarted,

    /// Every task finished; the batch was not cancelled.
    ///
    /// Sets:
    /// - `total`: number of tasks in the batch
    /// - `reason`: aggregate error summary, if any task failed
    BatchCompleted,

    /// Batch cancelled by fail-fast, the caller's token or the batch timeout.
    ///
    /// Sets:
    /// - `total`: number of tasks in the batch
    /// - `reason`: cancellation reason
    BatchCancelled,

    // === Task events ===
    /// Task acquired its concurrency slot and is about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    TaskStarting,

    /// Task returned successfully (with or without a payload).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    TaskCompleted,

    /// Task returned an error.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    /// - `reason`: error message
    TaskFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Submission index of the task, if applicable.
    pub index: Option<usize>,
    /// Number of tasks in the batch, for batch events.
    pub total: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            index: None,
            total: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task submission index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches the batch size.
    #[inline]
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_task_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskStarting | EventKind::TaskCompleted | EventKind::TaskFailed
        )
    }
}
