//! # Fetch and flatten every page of a listing.
//!
//! [`fetch_all_pages`] is the element-level sibling of [`page_request`](super::page_request):
//! the fetch callback returns a [`Page`] whose items are a `Vec<T>`, so page lengths and
//! flattening need no inspection callback.
//!
//! Unlike `page_request`, the remaining pages run **without** fail-fast: every page is
//! attempted, and any failure still fails the whole call (lowest failing page reported).

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::page::{into_page_error, page_count};
use crate::core::TaskRunner;
use crate::error::{PageError, RunError};
use crate::tasks::TaskFn;

/// One page of items plus the listing total reported with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub total: usize,
    /// Items of this page.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(total: usize, items: Vec<T>) -> Self {
        Self { total, items }
    }
}

/// Fetches every page through `fetch` and returns all items in page order.
///
/// `fetch(ctx, page_size, page_number)` is called once for page 1, then once per
/// remaining page with at most `concurrency` calls in flight (`0` = unbounded).
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use taskbatch::{Page, TaskError, fetch_all_pages};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let ctx = CancellationToken::new();
///     let items = fetch_all_pages(&ctx, 3, 4, |_ctx, size, number| async move {
///         let start = (number - 1) * size;
///         Ok::<_, TaskError>(Page::new(10, (start..10usize.min(start + size)).collect::<Vec<_>>()))
///     })
///     .await?;
///
///     assert_eq!(items, (0..10).collect::<Vec<_>>());
///     Ok(())
/// }
/// ```
pub async fn fetch_all_pages<T, E, F, Fut>(
    ctx: &CancellationToken,
    concurrency: usize,
    page_size: usize,
    fetch: F,
) -> Result<Vec<T>, PageError<E>>
where
    T: Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: Fn(CancellationToken, usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
{
    if page_size == 0 {
        return Err(PageError::InvalidPageSize);
    }

    let first = fetch(ctx.clone(), page_size, 1)
        .await
        .map_err(|source| PageError::FirstPage { source })?;

    let fetched = first.items.len();
    if fetched >= first.total || fetched < page_size {
        tracing::debug!(total = first.total, len = fetched, "single page");
        return Ok(first.items);
    }

    let total_pages = page_count(first.total, page_size);
    tracing::debug!(total = first.total, total_pages, concurrency, "fetching remaining pages");

    let fetch = Arc::new(fetch);
    let mut runner: TaskRunner<Vec<T>, E> = TaskRunner::new()
        .with_context(ctx.clone())
        .set_max_concurrent(total_pages - 1, concurrency);
    for page_number in 2..=total_pages {
        let fetch = Arc::clone(&fetch);
        runner = runner.add_boxed(TaskFn::boxed(
            format!("page-{page_number}"),
            move |ctx: CancellationToken| async move {
                let page = fetch(ctx, page_size, page_number).await?;
                Ok(Some(page.items))
            },
        ));
    }

    let rest = match runner.run().await.into_result() {
        Ok(rest) => rest,
        Err(err) => {
            if let RunError::Aggregate(agg) = &err {
                for (index, source) in agg.iter().skip(1) {
                    tracing::warn!(page = index + 2, error = %source, "additional page failure");
                }
            }
            let err = into_page_error(err);
            match err.page() {
                Some(page) => tracing::warn!(page, error = %err, "page fetch failed"),
                None => tracing::warn!(error = %err, "page fetch interrupted"),
            }
            return Err(err);
        }
    };

    let mut items = first.items;
    items.reserve(rest.iter().map(Vec::len).sum());
    for page in rest {
        items.extend(page);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn numbers(
        total: usize,
        page_size: usize,
        page_number: usize,
    ) -> Result<Page<usize>, TaskError> {
        let jitter = 30u64.saturating_sub(page_number as u64);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        let start = (page_number - 1) * page_size;
        let end = total.min(start + page_size);
        Ok(Page::new(total, (start + 1..=end).collect()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_page_size_and_concurrency_flattens_to_same_sequence() {
        let ctx = CancellationToken::new();
        let expected: Vec<usize> = (1..=23).collect();

        for page_size in 1..=22 {
            for concurrency in 1..=10 {
                let items = fetch_all_pages(&ctx, concurrency, page_size, |_ctx, size, number| {
                    numbers(23, size, number)
                })
                .await
                .expect("all pages");
                assert_eq!(items, expected, "page_size={page_size} concurrency={concurrency}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page_when_first_holds_total() {
        let ctx = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let items = fetch_all_pages(&ctx, 4, 10, move |_ctx, size, number| {
            counter.fetch_add(1, Ordering::SeqCst);
            numbers(7, size, number)
        })
        .await
        .expect("one page");

        assert_eq!(items, (1..=7).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_total_is_empty() {
        let ctx = CancellationToken::new();
        let items = fetch_all_pages(&ctx, 2, 5, |_ctx, size, number| numbers(0, size, number))
            .await
            .expect("empty listing");
        assert!(items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_failing_page_fails_whole_call() {
        let ctx = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let err = fetch_all_pages(&ctx, 2, 5, move |_ctx, size, number| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if number == 3 || number == 5 {
                    return Err(TaskError::fail(format!("page {number} down")));
                }
                numbers(23, size, number).await
            }
        })
        .await
        .expect_err("pages 3 and 5 fail");

        // Not fail-fast: every page was attempted.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(err.page(), Some(3));
        match err {
            PageError::Page { source, .. } => assert_eq!(source, TaskError::fail("page 3 down")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_page_size_is_rejected() {
        let ctx = CancellationToken::new();
        let err = fetch_all_pages(&ctx, 2, 0, |_ctx, size, number| numbers(5, size, number))
            .await
            .expect_err("page size 0");
        assert!(matches!(err, PageError::InvalidPageSize));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_fan_out_interrupts() {
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            // Page 1 lands at 29ms; pages 2.. are still sleeping at 35ms.
            tokio::time::sleep(Duration::from_millis(35)).await;
            trigger.cancel();
        });

        let err = fetch_all_pages(&ctx, 1, 5, |_ctx, size, number| numbers(23, size, number))
            .await
            .expect_err("cancelled");
        assert!(matches!(err, PageError::Interrupted(RunError::Canceled)));
        assert_eq!(err.page(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_context_fetches_only_first_page() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let err = fetch_all_pages(&ctx, 3, 5, move |_ctx, size, number| {
            counter.fetch_add(1, Ordering::SeqCst);
            numbers(23, size, number)
        })
        .await
        .expect_err("cancelled before fan-out");

        assert!(matches!(err, PageError::Interrupted(RunError::Canceled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_honouring_context_stops_on_cancel() {
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = fetch_all_pages(&ctx, 4, 5, |ctx: CancellationToken, size, number| async move {
            if number == 1 {
                return numbers(23, size, number).await;
            }
            tokio::select! {
                _ = ctx.cancelled() => Err(TaskError::Canceled),
                _ = tokio::time::sleep(Duration::from_secs(60)) => numbers(23, size, number).await,
            }
        })
        .await
        .expect_err("cancelled");

        assert!(matches!(err, PageError::Interrupted(RunError::Canceled)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
