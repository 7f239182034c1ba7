//! # TaskRunner: bounded-concurrency fan-out/fan-in over a batch of tasks.
//!
//! A [`TaskRunner`] collects tasks, then [`start`](TaskRunner::start)s them all and hands
//! back a [`Batch`]; [`Batch::wait`] returns the results in **submission order**
//! together with the terminal error.
//!
//! ## Architecture
//! ```text
//! TaskRunner::start()
//!     ├─► watcher task      caller token / timeout ──► latch.fire(Context | Deadline)
//!     └─► driver task
//!           for i in 0..N:
//!             ├─► acquire semaphore (optional, raced against latch)
//!             └─► spawn task #i ──► Task::spawn(batch token)
//!                                     ├─ Ok(Some(v)) ─► slot[i] = v
//!                                     ├─ Ok(None)    ─► slot[i] = empty
//!                                     └─ Err(e)      ─► fail-fast: latch.fire(Failed{i, e})
//!                                                       otherwise: slot[i] = e
//!           await handles in index order ─► done.cancel()
//!
//! Batch::wait()
//!     select { driver finished ─► assemble slots, latch fired ─► cancellation error }
//! ```
//!
//! ## Rules
//! - Output order is the **index** order, never completion order.
//! - The latch fires at most once; the first reason wins.
//! - After the latch fires no new task is started; running tasks are **not** aborted,
//!   they see their token cancelled and their results are discarded.
//! - A panicking task is not recovered: the panic resurfaces from `wait`.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::config::RunnerConfig;
use crate::core::latch::{Cancel, CancelLatch};
use crate::core::outcome::Outcome;
use crate::error::{AggregateError, RunError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Task, TaskBox, TaskFn};

/// Builder for one batch of tasks.
///
/// Tasks can be added until [`start`](Self::start) consumes the runner, so adding to a
/// running batch is a compile error.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use taskbatch::{TaskError, TaskRunner};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let runner: TaskRunner<u32, TaskError> = (1..=5u32).fold(TaskRunner::new(), |r, n| {
///         r.add_fn(move |_ctx| async move {
///             tokio::time::sleep(Duration::from_millis(u64::from(10 - n))).await;
///             Ok(Some(n * n))
///         })
///     });
///
///     let squares = runner.set_concurrent(2).fail_fast().run().await.into_result()?;
///     assert_eq!(squares, vec![1, 4, 9, 16, 25]);
///     Ok(())
/// }
/// ```
pub struct TaskRunner<T, E = TaskError> {
    tasks: Vec<TaskBox<T, E>>,
    cfg: RunnerConfig,
    ctx: Option<CancellationToken>,
    bus: Option<Bus>,
}

impl<T, E> Default for TaskRunner<T, E> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            cfg: RunnerConfig::default(),
            ctx: None,
            bus: None,
        }
    }
}

impl<T, E> FromIterator<TaskBox<T, E>> for TaskRunner<T, E> {
    fn from_iter<I: IntoIterator<Item = TaskBox<T, E>>>(iter: I) -> Self {
        Self::with_tasks(iter)
    }
}

impl<T, E> TaskRunner<T, E> {
    /// Creates an empty runner with the default [`RunnerConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner with an initial task set.
    pub fn with_tasks(tasks: impl IntoIterator<Item = TaskBox<T, E>>) -> Self {
        Self {
            tasks: tasks.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Appends a task.
    pub fn add(mut self, task: impl Task<T, E>) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// Appends an already boxed task.
    pub fn add_boxed(mut self, task: TaskBox<T, E>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Appends a closure as a task named `task-<index>`.
    pub fn add_fn<F, Fut>(mut self, f: F) -> Self
    where
        T: 'static,
        E: 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
    {
        let name = format!("task-{}", self.tasks.len());
        self.tasks.push(TaskFn::boxed(name, f));
        self
    }

    /// Appends every task of `tasks`, keeping their order.
    pub fn add_all(mut self, tasks: impl IntoIterator<Item = TaskBox<T, E>>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Cancels the batch on the first task error.
    pub fn fail_fast(mut self) -> Self {
        self.cfg.fail_fast = true;
        self
    }

    /// Caps simultaneously running tasks to `n` (`0` = unbounded).
    pub fn set_concurrent(mut self, n: usize) -> Self {
        self.cfg.max_concurrent = n;
        self
    }

    /// Sets the concurrency cap to `min(max, requested)`.
    ///
    /// Either argument being `0` therefore yields an unbounded batch.
    pub fn set_max_concurrent(self, max: usize, requested: usize) -> Self {
        self.set_concurrent(max.min(requested))
    }

    /// Binds the batch to a caller token; cancelling it cancels the batch with
    /// [`RunError::Canceled`].
    pub fn with_context(mut self, ctx: CancellationToken) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Cancels the batch with [`RunError::DeadlineExceeded`] if it has not finished
    /// `timeout` after [`start`](Self::start). `Duration::ZERO` disables the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: RunnerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Publishes batch and task lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Number of tasks added so far.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no task was added.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T, E> TaskRunner<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Launches every task and returns immediately.
    ///
    /// A batch without tasks spawns nothing. Otherwise this must be called from within a
    /// tokio runtime.
    pub fn start(self) -> Batch<T, E> {
        let total = self.tasks.len();
        if total == 0 {
            return Batch { running: None };
        }

        let shared = Arc::new(Shared {
            latch: CancelLatch::new(),
            bus: self.bus,
            fail_fast: self.cfg.fail_fast,
        });
        let done = CancellationToken::new();
        let semaphore = self
            .cfg
            .concurrency_limit()
            .map(Semaphore::new)
            .map(Arc::new);

        shared.publish(|| Event::new(EventKind::BatchStarted).with_total(total));

        if self.ctx.as_ref().is_some_and(CancellationToken::is_cancelled) {
            shared.latch.fire(Cancel::Context);
        }
        spawn_watcher(
            Arc::clone(&shared),
            done.clone(),
            self.ctx,
            self.cfg.deadline(),
        );

        let driver = tokio::spawn(drive(self.tasks, Arc::clone(&shared), semaphore, done));

        Batch {
            running: Some(Running {
                driver,
                shared,
                total,
            }),
        }
    }

    /// Shorthand for `start().wait().await`.
    pub async fn run(self) -> Outcome<T, E> {
        self.start().wait().await
    }
}

/// Handle to a started batch.
///
/// Dropping a batch without waiting detaches it: running tasks finish in the background
/// and their results are discarded.
pub struct Batch<T, E> {
    running: Option<Running<T, E>>,
}

struct Running<T, E> {
    driver: JoinHandle<Vec<Slot<T, E>>>,
    shared: Arc<Shared<E>>,
    total: usize,
}

impl<T, E> Batch<T, E>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Number of tasks in the batch.
    pub fn len(&self) -> usize {
        self.running.as_ref().map_or(0, |r| r.total)
    }

    /// Returns `true` for a batch without tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels the batch as if the caller token had fired.
    ///
    /// Has no effect if the batch was already cancelled.
    pub fn cancel(&self) {
        if let Some(running) = &self.running {
            running.shared.latch.fire(Cancel::Context);
        }
    }

    /// Waits until every task finished or the batch was cancelled.
    ///
    /// - no tasks → empty outcome, immediately
    /// - all finished → non-empty results in submission order; failures (non fail-fast)
    ///   as [`RunError::Aggregate`] next to the successful results
    /// - cancelled → no results, the single triggering error
    ///
    /// # Panics
    /// Re-raises the panic of a task that panicked.
    pub async fn wait(self) -> Outcome<T, E> {
        let Some(Running {
            mut driver,
            shared,
            total,
        }) = self.running
        else {
            return Outcome::empty();
        };

        let joined = tokio::select! {
            biased;
            _ = shared.latch.token().cancelled() => None,
            res = &mut driver => Some(res),
        };

        if let Some(reason) = shared.latch.take_reason() {
            let err = RunError::from(reason);
            shared.publish(|| {
                Event::new(EventKind::BatchCancelled)
                    .with_total(total)
                    .with_reason(err.to_string())
            });
            return Outcome::cancelled(err);
        }

        let slots = match joined {
            Some(Ok(slots)) => slots,
            Some(Err(join_err)) if join_err.is_panic() => {
                std::panic::resume_unwind(join_err.into_panic())
            }
            // Driver aborted by runtime shutdown, or the latch reason was already consumed.
            Some(Err(_)) | None => return Outcome::cancelled(RunError::Canceled),
        };

        let outcome = assemble(slots);
        shared.publish(|| {
            let ev = Event::new(EventKind::BatchCompleted).with_total(total);
            match &outcome.error {
                Some(err) => ev.with_reason(err.to_string()),
                None => ev,
            }
        });
        outcome
    }
}

/// State shared by the driver, the watcher and every task wrapper.
struct Shared<E> {
    latch: CancelLatch<E>,
    bus: Option<Bus>,
    fail_fast: bool,
}

impl<E> Shared<E> {
    fn publish(&self, ev: impl FnOnce() -> Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev());
        }
    }
}

/// Final state of one task index.
enum Slot<T, E> {
    Value(T),
    Empty,
    Failed(E),
    /// Error handed to the latch (fail-fast).
    Claimed,
    /// Never started: the batch was cancelled first.
    Skipped,
}

/// Turns the caller token and the batch deadline into latch reasons.
///
/// Exits as soon as the batch finishes or is cancelled some other way.
fn spawn_watcher<E: Send + 'static>(
    shared: Arc<Shared<E>>,
    done: CancellationToken,
    ctx: Option<CancellationToken>,
    timeout: Option<Duration>,
) {
    if ctx.is_none() && timeout.is_none() {
        return;
    }
    let deadline = timeout.map(|t| (Instant::now() + t, t));

    tokio::spawn(async move {
        let ctx_cancelled = async {
            match &ctx {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some((at, _)) => time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = done.cancelled() => {}
            _ = shared.latch.token().cancelled() => {}
            _ = ctx_cancelled => {
                shared.latch.fire(Cancel::Context);
            }
            _ = expired => {
                if let Some((_, timeout)) = deadline {
                    shared.latch.fire(Cancel::Deadline { timeout });
                }
            }
        }
    });
}

/// Submits tasks in index order, then collects their slots in index order.
async fn drive<T, E>(
    tasks: Vec<TaskBox<T, E>>,
    shared: Arc<Shared<E>>,
    semaphore: Option<Arc<Semaphore>>,
    done: CancellationToken,
) -> Vec<Slot<T, E>>
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    // Releases the watcher on every exit, including a re-raised task panic.
    let _done = done.drop_guard();
    let total = tasks.len();
    let mut handles: Vec<JoinHandle<Slot<T, E>>> = Vec::with_capacity(total);

    for (index, task) in tasks.into_iter().enumerate() {
        if shared.latch.is_fired() {
            break;
        }
        let permit = match &semaphore {
            Some(sem) => {
                tokio::select! {
                    biased;
                    _ = shared.latch.token().cancelled() => { break; }
                    res = Arc::clone(sem).acquire_owned() => match res {
                        Ok(permit) => Some(permit),
                        Err(_closed) => { break; }
                    },
                }
            }
            None => None,
        };
        handles.push(tokio::spawn(run_task(index, task, permit, Arc::clone(&shared))));
    }

    let mut slots = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok(slot) => slots.push(slot),
            Err(join_err) if join_err.is_panic() => {
                std::panic::resume_unwind(join_err.into_panic())
            }
            Err(_cancelled) => slots.push(Slot::Skipped),
        }
    }
    slots.resize_with(total, || Slot::Skipped);
    slots
}

/// Runs one task and settles its slot.
///
/// Under fail-fast the latch fires before the permit is released, so a waiting
/// submission loop observes the cancellation instead of the free permit.
async fn run_task<T, E>(
    index: usize,
    task: TaskBox<T, E>,
    permit: Option<OwnedSemaphorePermit>,
    shared: Arc<Shared<E>>,
) -> Slot<T, E>
where
    T: 'static,
    E: Display + 'static,
{
    let name: Arc<str> = Arc::from(task.name());
    shared.publish(|| {
        Event::new(EventKind::TaskStarting)
            .with_task(Arc::clone(&name))
            .with_index(index)
    });

    let res = task.spawn(shared.latch.token().clone()).await;

    let slot = match res {
        Ok(value) => {
            shared.publish(|| {
                Event::new(EventKind::TaskCompleted)
                    .with_task(Arc::clone(&name))
                    .with_index(index)
            });
            value.map_or(Slot::Empty, Slot::Value)
        }
        Err(err) => {
            shared.publish(|| {
                Event::new(EventKind::TaskFailed)
                    .with_task(Arc::clone(&name))
                    .with_index(index)
                    .with_reason(err.to_string())
            });
            if shared.fail_fast {
                shared.latch.fire(Cancel::Failed { index, source: err });
                Slot::Claimed
            } else {
                Slot::Failed(err)
            }
        }
    };
    drop(permit);
    slot
}

/// Builds the normal-completion outcome from per-index slots.
fn assemble<T, E>(slots: Vec<Slot<T, E>>) -> Outcome<T, E> {
    let mut results = Vec::with_capacity(slots.len());
    let mut errors = Vec::new();

    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Slot::Value(v) => results.push(v),
            Slot::Failed(e) => errors.push((index, e)),
            Slot::Empty | Slot::Claimed | Slot::Skipped => {}
        }
    }

    let error = if errors.is_empty() {
        None
    } else {
        Some(RunError::Aggregate(AggregateError::new(errors)))
    };
    Outcome { results, error }
}
