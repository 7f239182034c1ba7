use crate::core::latch::Cancel;
use crate::error::RunError;

/// Result set of one finished batch.
///
/// - `results`: every non-empty task result, in submission order
/// - `error`: the terminal error, if any
///
/// A batch run without fail-fast can carry both: the successful results **and** an
/// [`RunError::Aggregate`] listing the failures. Cancellation (fail-fast, caller token,
/// timeout) always comes with empty `results`.
#[derive(Debug)]
pub struct Outcome<T, E> {
    /// Non-empty results in task submission order.
    pub results: Vec<T>,
    /// Terminal error of the batch.
    pub error: Option<RunError<E>>,
}

impl<T, E> Outcome<T, E> {
    pub(crate) fn empty() -> Self {
        Self {
            results: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn cancelled(error: RunError<E>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns `true` if the batch finished without any error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Splits the outcome into `(results, error)`.
    pub fn into_parts(self) -> (Vec<T>, Option<RunError<E>>) {
        (self.results, self.error)
    }

    /// Converts into a `Result`, dropping partial results when an error is present.
    pub fn into_result(self) -> Result<Vec<T>, RunError<E>> {
        match self.error {
            None => Ok(self.results),
            Some(err) => Err(err),
        }
    }
}

impl<E> From<Cancel<E>> for RunError<E> {
    fn from(reason: Cancel<E>) -> Self {
        match reason {
            Cancel::Failed { index, source } => RunError::Failed { index, source },
            Cancel::Context => RunError::Canceled,
            Cancel::Deadline { timeout } => RunError::DeadlineExceeded { timeout },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregateError, TaskError};
    use std::time::Duration;

    #[test]
    fn test_success_converts_to_ok() {
        let outcome: Outcome<u32, TaskError> = Outcome {
            results: vec![1, 2],
            error: None,
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.into_result().expect("ok"), vec![1, 2]);
    }

    #[test]
    fn test_partial_results_survive_into_parts_only() {
        let make = || Outcome {
            results: vec!["a"],
            error: Some(RunError::Aggregate(AggregateError::new(vec![(
                1,
                TaskError::fail("down"),
            )]))),
        };

        assert!(!make().is_success());

        let (results, error) = make().into_parts();
        assert_eq!(results, vec!["a"]);
        assert!(matches!(error, Some(RunError::Aggregate(ref agg)) if agg.indices() == vec![1]));

        let err = make().into_result().expect_err("aggregate");
        assert_eq!(err.as_label(), "batch_aggregate");
    }

    #[test]
    fn test_empty_and_cancelled() {
        let empty: Outcome<u8, TaskError> = Outcome::empty();
        assert!(empty.is_success());
        assert!(empty.results.is_empty());

        let cancelled: Outcome<u8, TaskError> = Outcome::cancelled(RunError::Canceled);
        let (results, error) = cancelled.into_parts();
        assert!(results.is_empty());
        assert!(matches!(error, Some(RunError::Canceled)));
    }

    #[test]
    fn test_cancel_reason_maps_to_run_error() {
        let err: RunError<TaskError> = Cancel::Failed {
            index: 3,
            source: TaskError::fail("x"),
        }
        .into();
        assert!(matches!(err, RunError::Failed { index: 3, .. }));

        let err: RunError<TaskError> = Cancel::Context.into();
        assert!(matches!(err, RunError::Canceled));

        let err: RunError<TaskError> = Cancel::Deadline {
            timeout: Duration::from_millis(50),
        }
        .into();
        assert!(matches!(
            err,
            RunError::DeadlineExceeded { timeout } if timeout == Duration::from_millis(50)
        ));
    }
}
