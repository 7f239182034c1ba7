//! Error types used by the taskbatch runtime, tasks and page fetchers.
//!
//! This module defines:
//!
//! - [`TaskError`]: a ready-made error type for individual tasks.
//! - [`RunError`]: the terminal error of one batch (fail-fast, aggregate, cancellation).
//! - [`AggregateError`]: every failure of a non-fail-fast batch, in task index order.
//! - [`PageError`]: errors returned by the pagination helpers.
//!
//! All enums provide `as_label` (stable snake_case strings for logs/metrics).

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by task execution.
///
/// The default error type of [`TaskRunner`](crate::TaskRunner). Any type implementing
/// `std::error::Error` can be used instead; the engine never inspects it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task gave up after its own timeout.
    ///
    /// The engine has no per-task timeout; tasks wrapping their work in
    /// `tokio::time::timeout` report it with this variant.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task observed batch cancellation and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskbatch::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.to_string(), "execution failed: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// # Terminal error of a batch.
///
/// Exactly one of these (or none) is reported by [`Batch::wait`](crate::Batch::wait):
///
/// - [`RunError::Failed`]: fail-fast mode, the task that won the cancellation race.
/// - [`RunError::Aggregate`]: default mode, every failed task (results still returned).
/// - [`RunError::Canceled`]: the caller's token was cancelled.
/// - [`RunError::DeadlineExceeded`]: the batch timeout elapsed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError<E> {
    /// A task failed while fail-fast was enabled.
    #[error("task #{index} failed: {source}")]
    Failed {
        /// Submission index of the failed task.
        index: usize,
        /// The task's error.
        #[source]
        source: E,
    },

    /// One or more tasks failed while fail-fast was disabled.
    #[error(transparent)]
    Aggregate(AggregateError<E>),

    /// The caller's cancellation token fired before the batch finished.
    #[error("batch cancelled")]
    Canceled,

    /// The batch timeout elapsed before every task finished.
    #[error("batch deadline exceeded after {timeout:?}")]
    DeadlineExceeded {
        /// The configured batch timeout.
        timeout: Duration,
    },
}

impl<E> RunError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskbatch::{RunError, TaskError};
    ///
    /// let err: RunError<TaskError> = RunError::Canceled;
    /// assert_eq!(err.as_label(), "batch_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Failed { .. } => "batch_task_failed",
            RunError::Aggregate(_) => "batch_aggregate",
            RunError::Canceled => "batch_canceled",
            RunError::DeadlineExceeded { .. } => "batch_deadline_exceeded",
        }
    }

    /// Returns `true` when the batch was stopped by the caller (token or timeout)
    /// rather than by a task failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RunError::Canceled | RunError::DeadlineExceeded { .. })
    }

    /// Iterates over the task errors carried by this value, with their indices.
    ///
    /// Empty for cancellation errors.
    pub fn task_errors(&self) -> Box<dyn Iterator<Item = (usize, &E)> + '_> {
        match self {
            RunError::Failed { index, source } => Box::new(std::iter::once((*index, source))),
            RunError::Aggregate(agg) => Box::new(agg.iter()),
            RunError::Canceled | RunError::DeadlineExceeded { .. } => Box::new(std::iter::empty()),
        }
    }
}

/// Every failure of a batch run without fail-fast, in task index order.
#[derive(Debug)]
pub struct AggregateError<E> {
    errors: Vec<(usize, E)>,
}

impl<E> AggregateError<E> {
    /// Builds an aggregate from `(index, error)` pairs.
    ///
    /// Pairs are sorted by index so the aggregate always follows submission order.
    pub fn new(mut errors: Vec<(usize, E)>) -> Self {
        errors.sort_by_key(|(index, _)| *index);
        Self { errors }
    }

    /// Number of failed tasks.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if no task failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over `(index, error)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &E)> {
        self.errors.iter().map(|(index, err)| (*index, err))
    }

    /// Submission indices of the failed tasks.
    pub fn indices(&self) -> Vec<usize> {
        self.errors.iter().map(|(index, _)| *index).collect()
    }

    /// The lowest-index failure.
    pub fn first(&self) -> Option<(usize, &E)> {
        self.iter().next()
    }

    /// Consumes the aggregate, returning the errors in index order.
    pub fn into_errors(self) -> Vec<E> {
        self.errors.into_iter().map(|(_, err)| err).collect()
    }

    /// Consumes the aggregate, returning `(index, error)` pairs in index order.
    pub fn into_inner(self) -> Vec<(usize, E)> {
        self.errors
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} task(s) failed", self.errors.len())?;
        for (i, (index, err)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}#{index}: {err}")?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for AggregateError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|(_, err)| err as &(dyn std::error::Error + 'static))
    }
}

/// # Errors produced by the pagination helpers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PageError<E> {
    /// `page_size` was zero; page counts cannot be derived.
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// The first (probe) page could not be fetched or inspected.
    #[error("failed to fetch page 1: {source}")]
    FirstPage {
        /// The fetcher's error.
        #[source]
        source: E,
    },

    /// A page after the first failed.
    #[error("failed to fetch page {page}: {source}")]
    Page {
        /// 1-based page number.
        page: usize,
        /// The fetcher's error.
        #[source]
        source: E,
    },

    /// The concurrent part was cancelled by the caller's token or timeout.
    #[error("page fetch interrupted: {0}")]
    Interrupted(#[source] RunError<E>),
}

impl<E> PageError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PageError::InvalidPageSize => "page_invalid_size",
            PageError::FirstPage { .. } => "page_first_failed",
            PageError::Page { .. } => "page_failed",
            PageError::Interrupted(_) => "page_interrupted",
        }
    }

    /// 1-based number of the page that failed, if a page failed.
    pub fn page(&self) -> Option<usize> {
        match self {
            PageError::FirstPage { .. } => Some(1),
            PageError::Page { page, .. } => Some(*page),
            PageError::InvalidPageSize | PageError::Interrupted(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_is_sorted_by_index() {
        let agg = AggregateError::new(vec![
            (3, TaskError::fail("c")),
            (0, TaskError::fail("a")),
            (1, TaskError::fail("b")),
        ]);
        assert_eq!(agg.indices(), vec![0, 1, 3]);
        assert_eq!(agg.first().map(|(i, _)| i), Some(0));
        assert_eq!(
            agg.to_string(),
            "3 task(s) failed: #0: execution failed: a; #1: execution failed: b; #3: execution failed: c"
        );
    }

    #[test]
    fn test_aggregate_source_is_first_error() {
        use std::error::Error as _;

        let agg = AggregateError::new(vec![(2, TaskError::fail("x")), (1, TaskError::Canceled)]);
        let source = agg.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("context cancelled"));
    }

    #[test]
    fn test_run_error_task_errors() {
        let failed: RunError<TaskError> = RunError::Failed {
            index: 4,
            source: TaskError::fail("boom"),
        };
        let collected: Vec<usize> = failed.task_errors().map(|(i, _)| i).collect();
        assert_eq!(collected, vec![4]);
        assert!(!failed.is_cancellation());

        let deadline: RunError<TaskError> = RunError::DeadlineExceeded {
            timeout: Duration::from_millis(50),
        };
        assert_eq!(deadline.task_errors().count(), 0);
        assert!(deadline.is_cancellation());
        assert_eq!(deadline.as_label(), "batch_deadline_exceeded");
    }

    #[test]
    fn test_page_error_page_number() {
        let err: PageError<TaskError> = PageError::Page {
            page: 3,
            source: TaskError::fail("nope"),
        };
        assert_eq!(err.page(), Some(3));
        assert_eq!(err.to_string(), "failed to fetch page 3: execution failed: nope");
        assert_eq!(PageError::<TaskError>::InvalidPageSize.page(), None);
    }
}
