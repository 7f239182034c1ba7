//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a single-use unit of work that produces an
//! optional result or an error. The common handle type is [`TaskBox`], a boxed trait
//! object the runner stores in submission order.
//!
//! A task receives the batch [`CancellationToken`]. The runner never aborts a task;
//! checking the token is the only way a task stops early once the batch is cancelled.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// Future returned by [`Task::spawn`].
///
/// `Ok(None)` means "finished without a payload": such results are filtered out of
/// the batch output.
pub type BoxTaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<Option<T>, E>> + Send + 'static>>;

/// Boxed task handle stored by the runner.
pub type TaskBox<T, E> = Box<dyn Task<T, E>>;

/// # Single-use, cancelable unit of work.
///
/// `spawn` consumes the task, so every task runs at most once.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskbatch::{BoxTaskFuture, Task, TaskError};
///
/// struct Double(u32);
///
/// impl Task<u32, TaskError> for Double {
///     fn name(&self) -> &str { "double" }
///
///     fn spawn(self: Box<Self>, _ctx: CancellationToken) -> BoxTaskFuture<u32, TaskError> {
///         Box::pin(async move { Ok(Some(self.0 * 2)) })
///     }
/// }
/// ```
pub trait Task<T, E>: Send + 'static {
    /// Returns a human-readable task name used in events and logs.
    fn name(&self) -> &str;

    /// Creates the future that runs the task.
    ///
    /// `ctx` is cancelled when the batch is cancelled (fail-fast or caller cancellation).
    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture<T, E>;
}
