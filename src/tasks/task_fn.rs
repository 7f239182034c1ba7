//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`. The closure runs
//! once; shared state, if any, goes in an explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskbatch::{TaskBox, TaskError, TaskFn};
//!
//! let t: TaskBox<u32, TaskError> = TaskFn::boxed("answer", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(Some(42))
//! });
//!
//! assert_eq!(t.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::tasks::task::{BoxTaskFuture, Task, TaskBox};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::boxed`] when you immediately need a [`TaskBox`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a boxed handle.
    pub fn boxed<T, E, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> TaskBox<T, E>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
    {
        Box::new(Self::new(name, f))
    }
}

impl<T, E, F, Fut> Task<T, E> for TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static, // FnOnce: a task runs once
    Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture<T, E> {
        Box::pin((self.f)(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    #[tokio::test]
    async fn test_spawn_runs_closure_with_token() {
        let token = CancellationToken::new();
        token.cancel();

        let t: TaskBox<&'static str, TaskError> =
            TaskFn::boxed("probe", |ctx: CancellationToken| async move {
                if ctx.is_cancelled() {
                    Ok(Some("saw-cancel"))
                } else {
                    Ok(None)
                }
            });

        assert_eq!(t.name(), "probe");
        assert_eq!(t.spawn(token).await, Ok(Some("saw-cancel")));
    }
}
