//! # Single-fire cancellation latch.
//!
//! Both cancellation triggers of a batch (fail-fast and the caller's token/timeout)
//! route through one [`CancelLatch`], so `wait` has a single rendezvous point.
//!
//! ## Rules
//! - `fire` may be called concurrently from any number of tasks; only the **first**
//!   call records its reason and cancels the token, later calls return `false`
//!   and drop their reason.
//! - The reason is stored **before** the token is cancelled, so a waiter woken
//!   by the token always finds it.
//! - The reason can be taken out exactly once.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Why a batch was cancelled.
#[derive(Debug)]
pub(crate) enum Cancel<E> {
    /// A task failed under fail-fast.
    Failed { index: usize, source: E },
    /// The caller's token was cancelled.
    Context,
    /// The batch timeout elapsed.
    Deadline { timeout: Duration },
}

struct LatchState<E> {
    fired: bool,
    reason: Option<Cancel<E>>,
}

/// One-shot "cancelled" signal carrying the first recorded reason.
pub(crate) struct CancelLatch<E> {
    state: Mutex<LatchState<E>>,
    token: CancellationToken,
}

impl<E> CancelLatch<E> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LatchState {
                fired: false,
                reason: None,
            }),
            token: CancellationToken::new(),
        }
    }

    /// Records `reason` and cancels the token if nobody fired before.
    ///
    /// Returns `true` for the call that won.
    pub(crate) fn fire(&self, reason: Cancel<E>) -> bool {
        let mut state = self.lock();
        if state.fired {
            return false;
        }
        state.fired = true;
        state.reason = Some(reason);
        drop(state);

        self.token.cancel();
        true
    }

    /// Returns `true` once any caller fired the latch.
    pub(crate) fn is_fired(&self) -> bool {
        self.lock().fired
    }

    /// Token cancelled when the latch fires.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Moves the recorded reason out (`None` if not fired or already taken).
    pub(crate) fn take_reason(&self) -> Option<Cancel<E>> {
        self.lock().reason.take()
    }

    fn lock(&self) -> MutexGuard<'_, LatchState<E>> {
        // The critical sections never panic; recover the state regardless.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
