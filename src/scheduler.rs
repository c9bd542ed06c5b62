//! Scheduler abstraction for time-based operators
//!
//! Operators never look up a global clock or timer. `throttle`, `delay` and
//! `buffer` receive a [`Scheduler`] when they are built and use it for both
//! reading the time and running deferred work. Any timer or event loop can
//! back a scheduler; the crate ships three:
//!
//! - [`ManualScheduler`]: virtual time advanced by hand, for tests and for
//!   hosts that drive time from their own loop.
//! - [`ThreadPoolScheduler`]: a `futures` thread pool with `futures-time`
//!   timers (features `futures-scheduler` and `timer`).
//! - [`TokioScheduler`]: a tokio runtime (feature `tokio-scheduler`).

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use futures::future::AbortHandle;
use parking_lot::Mutex;
pub use std::time::{Duration, Instant};

use crate::subscription::{Subscription, SubscriptionLike};

mod manual_scheduler;
pub use manual_scheduler::ManualScheduler;

#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
mod thread_pool_scheduler;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use thread_pool_scheduler::ThreadPoolScheduler;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A one-shot unit of deferred work.
pub type OnceTask = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work invoked on every tick of a repeating schedule.
pub type RepeatingTask = Box<dyn FnMut() + Send + 'static>;

/// Runs callbacks after a delay or periodically.
///
/// Implementations decide on which thread a task runs. Operators built on a
/// scheduler serialize their own state, so a multi-threaded scheduler is fine.
pub trait Scheduler {
  /// Current time as seen by this scheduler.
  fn now(&self) -> Instant;

  /// Invoke `task` once, `delay` from now.
  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle;

  /// Invoke `task` every `interval`, first time `interval` from now.
  fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  fn now(&self) -> Instant { (**self).now() }

  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
    (**self).schedule_once(delay, task)
  }

  fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
    (**self).schedule_repeating(interval, task)
  }
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
  fn now(&self) -> Instant { (**self).now() }

  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
    (**self).schedule_once(delay, task)
  }

  fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
    (**self).schedule_repeating(interval, task)
  }
}

// ==================== TaskHandle ====================

/// Cancellation handle for a scheduled task.
///
/// `cancel` is idempotent. A one-shot task's handle also reports closed once
/// the task ran.
#[derive(Clone, Default)]
pub struct TaskHandle(Arc<HandleInner>);

#[derive(Default)]
struct HandleInner {
  closed: AtomicBool,
  abort: Mutex<Option<AbortHandle>>,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  /// A handle that also aborts a spawned future when cancelled.
  pub fn with_abort(abort: AbortHandle) -> Self {
    Self(Arc::new(HandleInner { closed: AtomicBool::new(false), abort: Mutex::new(Some(abort)) }))
  }

  /// Stop future invocations of the task.
  pub fn cancel(&self) {
    if self.0.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let abort = self.0.abort.lock().take();
    if let Some(abort) = abort {
      abort.abort();
    }
    tracing::trace!("scheduled task cancelled");
  }

  /// Mark the task as done. Scheduler implementations call this once a
  /// one-shot task ran.
  pub fn finish(&self) {
    self.0.closed.store(true, Ordering::Release);
    self.0.abort.lock().take();
  }

  pub fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}

impl SubscriptionLike for TaskHandle {
  #[inline]
  fn unsubscribe(&self) { self.cancel() }

  #[inline]
  fn is_closed(&self) -> bool { TaskHandle::is_closed(self) }
}

impl From<TaskHandle> for Subscription {
  fn from(handle: TaskHandle) -> Self { Subscription::from_like(handle) }
}

impl std::fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskHandle").field("is_closed", &self.is_closed()).finish()
  }
}
