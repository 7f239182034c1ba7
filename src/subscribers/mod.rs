//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`] for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! TaskRunner ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                              │
//!                                              ├──► LogWriter (tracing records)
//!                                              └──► Custom subscribers (metrics, audit, ...)
//! ```

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
