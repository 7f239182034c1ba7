//! Concurrent pagination helpers built on [`TaskRunner`](crate::TaskRunner).
//!
//! Both helpers fetch page 1 synchronously (it reveals the total), then fetch pages
//! `2..=N` concurrently and merge them in page order.
//!
//! - [`page_request`]: pages stay whole; a [`PageSource`] tells how big each page is.
//!   Remaining pages run fail-fast.
//! - [`fetch_all_pages`]: pages are `Vec<T>`; items are flattened into one `Vec<T>`.
//!   Remaining pages all run; any failure fails the call.

mod all_pages;
mod page;

pub use all_pages::{Page, fetch_all_pages};
pub use page::{PageInfo, PageSource, page_request};
