//! # Task abstractions.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for single-use, cancelable units of work
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskBox`] - boxed task handle (`Box<dyn Task<T, E>>`)
//! - [`BoxTaskFuture`] - the future a task produces

mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskBox};
pub use task_fn::TaskFn;
