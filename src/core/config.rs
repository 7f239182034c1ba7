//! # Batch configuration.
//!
//! Provides [`RunnerConfig`], the knobs of one [`TaskRunner`](crate::TaskRunner) batch.
//!
//! Config is used in two ways:
//! 1. **Bulk setup**: `TaskRunner::new().with_config(cfg)`
//! 2. **Builder calls**: `fail_fast()`, `set_concurrent(n)`, `with_timeout(d)` edit the same fields
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `timeout = 0s` → no batch deadline

use std::time::Duration;

/// Configuration for a single batch.
///
/// ## Field semantics
/// - `fail_fast`: first task error cancels the batch and becomes the terminal error
/// - `max_concurrent`: task concurrency limit (`0` = unlimited)
/// - `timeout`: batch deadline measured from `start()` (`0s` = none)
///
/// ## Notes
/// Unlimited concurrency spawns one tokio task per submitted task at once.
/// That is fine for small and medium batches; very large batches should set a cap
/// to bound memory and downstream load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Cancel the batch on the first task error.
    ///
    /// When disabled, every error is collected into an
    /// [`AggregateError`](crate::AggregateError) and successful results are still returned.
    pub fail_fast: bool,

    /// Maximum number of tasks running at the same time.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` tasks run simultaneously
    pub max_concurrent: usize,

    /// Batch deadline, measured from the moment the batch starts.
    ///
    /// - `Duration::ZERO` = no deadline
    /// - `> 0` = the batch is cancelled with `RunError::DeadlineExceeded` once it elapses
    pub timeout: Duration,
}

impl RunnerConfig {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent tasks
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the batch deadline as an `Option`.
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `fail_fast = false` (collect every error)
    /// - `max_concurrent = 0` (unlimited)
    /// - `timeout = 0s` (no deadline)
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_concurrent: 0,
            timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unbounded() {
        let cfg = RunnerConfig::default();
        assert!(!cfg.fail_fast);
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.deadline(), None);
    }

    #[test]
    fn test_sentinels() {
        let cfg = RunnerConfig {
            fail_fast: true,
            max_concurrent: 3,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(cfg.concurrency_limit(), Some(3));
        assert_eq!(cfg.deadline(), Some(Duration::from_millis(250)));
    }
}
