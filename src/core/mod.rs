//! Runtime core: batch execution and cancellation.
//!
//! This module contains the task engine. The public API from this module is
//! [`TaskRunner`] (builder), [`Batch`] (running handle), [`Outcome`] (result set)
//! and [`RunnerConfig`].
//!
//! Internal modules:
//! - [`runner`]: builder, submission loop, per-task wrapper and result assembly;
//! - [`latch`]: single-fire cancellation latch shared by fail-fast and caller cancellation;
//! - [`outcome`]: ordered results plus terminal error;
//! - [`config`]: batch configuration with sentinel values.

mod config;
mod latch;
mod outcome;
mod runner;

pub use config::RunnerConfig;
pub use outcome::Outcome;
pub use runner::{Batch, TaskRunner};
