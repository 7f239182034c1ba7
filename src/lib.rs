//! # taskbatch
//!
//! **taskbatch** runs a batch of independent async tasks with bounded concurrency and
//! collects their results in submission order (fan-out/fan-in). Two pagination helpers
//! are built on top of it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Task #0   │   │    Task #1   │   │    Task #N   │
//!     │ (TaskFn/impl)│   │ (TaskFn/impl)│   │ (TaskFn/impl)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskRunner (builder)                                             │
//! │  - fail_fast / set_concurrent / with_context / with_timeout       │
//! └─────────────────────────────┬─────────────────────────────────────┘
//!                               ▼ start()
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Batch                                                            │
//! │  - driver: semaphore-gated submission, index-ordered collection   │
//! │  - watcher: caller token / deadline ──► CancelLatch               │
//! │  - task wrappers: fail-fast errors ──► CancelLatch                │
//! └─────────────────────────────┬─────────────────────────────────────┘
//!                               ▼ wait()
//!                 Outcome { results (index order), error }
//!                               │
//!                               ▼
//!          page_request / fetch_all_pages (page 1, then 2..N concurrently)
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskRunner::new() ──► add()/add_fn()... ──► start() ──► Batch::wait()
//!
//! wait() resolves on the first of:
//!   ├─► all tasks finished  ─► results in submission order
//!   │                          + RunError::Aggregate if any task failed (no fail-fast)
//!   ├─► fail-fast error     ─► RunError::Failed { index, source }
//!   ├─► caller token        ─► RunError::Canceled
//!   └─► timeout elapsed     ─► RunError::DeadlineExceeded { timeout }
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types                                   |
//! |-------------------|----------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Define tasks as closures or trait impls.                       | [`Task`], [`TaskFn`], [`TaskBox`]           |
//! | **Execution**     | Bounded fan-out, ordered fan-in, fail-fast, cancellation.      | [`TaskRunner`], [`Batch`], [`Outcome`]      |
//! | **Pagination**    | Probe page 1, fetch the rest concurrently, merge in order.     | [`page_request`], [`fetch_all_pages`]       |
//! | **Errors**        | Typed errors for tasks, batches and pagination.                | [`TaskError`], [`RunError`], [`PageError`]  |
//! | **Events**        | Hook into batch/task lifecycle (logging, metrics).             | [`Bus`], [`Subscribe`], [`LogWriter`]       |
//! | **Configuration** | Batch settings with sentinel values.                           | [`RunnerConfig`]                            |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskbatch::{RunError, TaskError, TaskRunner};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ctx = CancellationToken::new();
//!
//!     let outcome = TaskRunner::<String>::new()
//!         .add_fn(|_ctx| async { Ok(Some("alpha".to_string())) })
//!         .add_fn(|_ctx| async { Err(TaskError::fail("beta is down")) })
//!         .add_fn(|_ctx| async { Ok(Some("gamma".to_string())) })
//!         .set_concurrent(2)
//!         .with_context(ctx)
//!         .with_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//!
//!     // Without fail-fast, successes come back next to the aggregated failures.
//!     assert_eq!(outcome.results, vec!["alpha".to_string(), "gamma".to_string()]);
//!     match outcome.error {
//!         Some(RunError::Aggregate(agg)) => assert_eq!(agg.indices(), vec![1]),
//!         other => panic!("unexpected: {other:?}"),
//!     }
//! }
//! ```
mod core;
mod error;
mod events;
mod pagination;
mod subscribers;
mod tasks;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use crate::core::{Batch, Outcome, RunnerConfig, TaskRunner};
pub use error::{AggregateError, PageError, RunError, TaskError};
pub use events::{Bus, DEFAULT_BUS_CAPACITY, Event, EventKind};
pub use pagination::{Page, PageInfo, PageSource, fetch_all_pages, page_request};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskBox, TaskFn};
