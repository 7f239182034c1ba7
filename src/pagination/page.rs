//! # Concurrent page fetching with an explicit page-inspection callback.
//!
//! [`page_request`] fetches page 1 on its own (it also discovers the total), then fans out
//! pages `2..=N` through a fail-fast [`TaskRunner`] and returns every page in page order.
//!
//! ## Flow
//! ```text
//! request_page(1) ──► page_info(page1) ──► len < page_size or total <= len ──► [page1]
//!                                      └─► total_pages = ceil(total / page_size)
//!                                          TaskRunner (fail-fast, ctx, min(total_pages-1, concurrency))
//!                                            ├─► request_page(2)
//!                                            ├─► ...
//!                                            └─► request_page(total_pages)
//!                                          [page1, page2, ..., pageN]
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::TaskRunner;
use crate::error::{PageError, RunError};
use crate::tasks::TaskFn;

/// Size information extracted from a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Total number of items across all pages, as reported by the source.
    pub total: usize,
    /// Number of items on this page.
    pub len: usize,
}

/// A paginated listing endpoint.
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskbatch::{PageInfo, PageSource, TaskError};
///
/// struct Numbers { total: usize }
///
/// #[async_trait]
/// impl PageSource for Numbers {
///     type Page = Vec<usize>;
///     type Error = TaskError;
///
///     async fn request_page(
///         &self,
///         _ctx: CancellationToken,
///         page_size: usize,
///         page_number: usize,
///     ) -> Result<Vec<usize>, TaskError> {
///         let start = (page_number - 1) * page_size;
///         Ok((start..self.total.min(start + page_size)).collect())
///     }
///
///     fn page_info(&self, page: &Vec<usize>) -> Result<PageInfo, TaskError> {
///         Ok(PageInfo { total: self.total, len: page.len() })
///     }
/// }
/// ```
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// One fetched page.
    type Page: Send + 'static;
    /// Error returned by the source.
    type Error: StdError + Send + Sync + 'static;

    /// Fetches page `page_number` (1-based) of `page_size` items.
    async fn request_page(
        &self,
        ctx: CancellationToken,
        page_size: usize,
        page_number: usize,
    ) -> Result<Self::Page, Self::Error>;

    /// Inspects a fetched page.
    fn page_info(&self, page: &Self::Page) -> Result<PageInfo, Self::Error>;
}

/// Number of pages needed for `total` items.
///
/// `page_size` must be non-zero.
pub(crate) fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size)
}

/// Fetches every page of `source`, page 1 first and the rest concurrently.
///
/// - `label` tags every log record of this call.
/// - `concurrency` caps parallel requests (`0` = unbounded); it is clamped to the number
///   of remaining pages.
///
/// Any failing page fails the whole call with that page's error; no partial list is
/// returned.
#[tracing::instrument(name = "pagination.page_request", skip(ctx, source))]
pub async fn page_request<S: PageSource>(
    ctx: &CancellationToken,
    label: &str,
    concurrency: usize,
    page_size: usize,
    source: Arc<S>,
) -> Result<Vec<S::Page>, PageError<S::Error>> {
    if page_size == 0 {
        tracing::warn!(label, "page size must be non-zero");
        return Err(PageError::InvalidPageSize);
    }

    let first = fetch_first(ctx, label, page_size, source.as_ref())
        .await
        .map_err(|err| {
            tracing::warn!(label, page = 1, error = %err, "page fetch failed");
            err
        })?;
    let info = source
        .page_info(&first)
        .map_err(|source| PageError::FirstPage { source })?;

    if info.len < page_size || info.total <= info.len {
        tracing::debug!(label, total = info.total, len = info.len, "single page");
        return Ok(vec![first]);
    }

    let total_pages = page_count(info.total, page_size);
    tracing::debug!(label, total = info.total, total_pages, "fetching remaining pages");

    let mut runner: TaskRunner<S::Page, S::Error> = TaskRunner::new()
        .fail_fast()
        .with_context(ctx.clone())
        .set_max_concurrent(total_pages - 1, concurrency);
    for page_number in 2..=total_pages {
        let source = Arc::clone(&source);
        runner = runner.add_boxed(TaskFn::boxed(
            format!("page-{page_number}"),
            move |ctx: CancellationToken| async move {
                source
                    .request_page(ctx, page_size, page_number)
                    .await
                    .map(Some)
            },
        ));
    }

    let rest = runner.run().await.into_result().map_err(|err| {
        let err = into_page_error(err);
        match err.page() {
            Some(page) => tracing::warn!(label, page, error = %err, "page fetch failed"),
            None => tracing::warn!(label, error = %err, "page fetch interrupted"),
        }
        err
    })?;

    let mut pages = Vec::with_capacity(total_pages);
    pages.push(first);
    pages.extend(rest);
    Ok(pages)
}

async fn fetch_first<S: PageSource>(
    ctx: &CancellationToken,
    label: &str,
    page_size: usize,
    source: &S,
) -> Result<S::Page, PageError<S::Error>> {
    tracing::debug!(label, page_size, "fetching page 1");
    source
        .request_page(ctx.clone(), page_size, 1)
        .await
        .map_err(|source| PageError::FirstPage { source })
}

/// Maps a batch error of a "pages 2..N" runner to the failing page.
///
/// Task index `i` fetched page `i + 2`. For an aggregate the lowest page wins.
pub(crate) fn into_page_error<E>(err: RunError<E>) -> PageError<E> {
    match err {
        RunError::Failed { index, source } => PageError::Page {
            page: index + 2,
            source,
        },
        RunError::Aggregate(agg) => match agg.into_inner().into_iter().next() {
            Some((index, source)) => PageError::Page {
                page: index + 2,
                source,
            },
            None => PageError::Interrupted(RunError::Canceled),
        },
        other => PageError::Interrupted(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::test_support::CapturedLogs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves `1..=total` in pages; optionally fails one page.
    struct Numbers {
        total: usize,
        fail_page: Option<usize>,
        requests: AtomicUsize,
    }

    impl Numbers {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_page: None,
                requests: AtomicUsize::new(0),
            }
        }

        fn failing(total: usize, page: usize) -> Self {
            Self {
                fail_page: Some(page),
                ..Self::new(total)
            }
        }
    }

    #[async_trait]
    impl PageSource for Numbers {
        type Page = Vec<usize>;
        type Error = TaskError;

        async fn request_page(
            &self,
            _ctx: CancellationToken,
            page_size: usize,
            page_number: usize,
        ) -> Result<Vec<usize>, TaskError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            // Later pages answer faster so completion order differs from page order.
            let jitter = 40u64.saturating_sub(page_number as u64);
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            if self.fail_page == Some(page_number) {
                return Err(TaskError::fail(format!("page {page_number} unavailable")));
            }
            let start = (page_number - 1) * page_size;
            let end = self.total.min(start + page_size);
            Ok((start + 1..=end).collect())
        }

        fn page_info(&self, page: &Vec<usize>) -> Result<PageInfo, TaskError> {
            Ok(PageInfo {
                total: self.total,
                len: page.len(),
            })
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(23, 5), 5);
        assert_eq!(page_count(25, 5), 5);
        assert_eq!(page_count(1, 22), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_page_size_and_concurrency_flattens_to_same_sequence() {
        let ctx = CancellationToken::new();
        let expected: Vec<usize> = (1..=23).collect();

        for page_size in 1..=22 {
            for concurrency in 1..=10 {
                let pages = page_request(
                    &ctx,
                    "numbers",
                    concurrency,
                    page_size,
                    Arc::new(Numbers::new(23)),
                )
                .await
                .expect("all pages");

                assert_eq!(pages.len(), page_count(23, page_size));
                let flat: Vec<usize> = pages.into_iter().flatten().collect();
                assert_eq!(flat, expected, "page_size={page_size} concurrency={concurrency}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_page_holding_everything_stops_early() {
        let ctx = CancellationToken::new();
        let source = Arc::new(Numbers::new(23));

        let pages = page_request(&ctx, "numbers", 4, 23, Arc::clone(&source))
            .await
            .expect("one page");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 23);
        assert_eq!(source.requests.load(Ordering::SeqCst), 1);

        let pages = page_request(&ctx, "numbers", 4, 50, Arc::new(Numbers::new(23)))
            .await
            .expect("short page");
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_total_yields_single_empty_page() {
        let ctx = CancellationToken::new();
        let pages = page_request(&ctx, "empty", 3, 5, Arc::new(Numbers::new(0)))
            .await
            .expect("empty listing");
        assert_eq!(pages, vec![Vec::<usize>::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_page_size_is_rejected() {
        let ctx = CancellationToken::new();
        let err = page_request(&ctx, "bad", 3, 0, Arc::new(Numbers::new(10)))
            .await
            .expect_err("page size 0");
        assert!(matches!(err, PageError::InvalidPageSize));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_page_fails_whole_call() {
        let ctx = CancellationToken::new();
        let err = page_request(&ctx, "numbers", 2, 5, Arc::new(Numbers::failing(23, 4)))
            .await
            .expect_err("page 4 fails");

        assert_eq!(err.page(), Some(4));
        match err {
            PageError::Page { source, .. } => {
                assert_eq!(source, TaskError::fail("page 4 unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_first_page() {
        let ctx = CancellationToken::new();
        let err = page_request(&ctx, "numbers", 2, 5, Arc::new(Numbers::failing(23, 1)))
            .await
            .expect_err("page 1 fails");
        assert!(matches!(err, PageError::FirstPage { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_context_interrupts_fan_out() {
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            // After page 1 (39ms) but before the remaining pages land.
            tokio::time::sleep(Duration::from_millis(45)).await;
            trigger.cancel();
        });

        let err = page_request(&ctx, "numbers", 1, 5, Arc::new(Numbers::new(23)))
            .await
            .expect_err("cancelled");
        assert!(matches!(err, PageError::Interrupted(RunError::Canceled)));
    }

    #[test]
    fn test_into_page_error_maps_index_to_page() {
        let err = into_page_error(RunError::Failed {
            index: 0,
            source: TaskError::fail("x"),
        });
        assert_eq!(err.page(), Some(2));

        let err: PageError<TaskError> = into_page_error(RunError::DeadlineExceeded {
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(err, PageError::Interrupted(RunError::DeadlineExceeded { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_record_carries_label_and_page_at_warn() {
        let (logs, _guard) = CapturedLogs::install(tracing::Level::WARN);
        let ctx = CancellationToken::new();

        let err = page_request(&ctx, "orders-listing", 2, 5, Arc::new(Numbers::failing(23, 2)))
            .await
            .expect_err("page 2 fails");
        assert_eq!(err.page(), Some(2));

        let out = logs.contents();
        assert!(out.contains("page fetch failed"), "{out}");
        assert!(out.contains("orders-listing"), "{out}");
        assert!(out.contains("page=2"), "{out}");
        assert!(!out.contains("task #0"), "runner index leaked into log: {out}");
        assert!(!out.contains("fetching remaining pages"), "{out}");
    }
}
