use futures::{executor::ThreadPool, future::abortable};

use super::{Duration, Instant, OnceTask, RepeatingTask, Scheduler, TaskHandle};
use crate::error::RxError;

/// Runs tasks on a `futures` thread pool, timing them with `futures-time`.
///
/// Tasks may run on any pool thread, possibly in parallel with the thread that
/// scheduled them.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A scheduler on a new pool with one thread per CPU.
  pub fn new() -> Result<Self, RxError> {
    let pool = ThreadPool::new().map_err(RxError::user)?;
    Ok(Self { pool })
  }

  /// A scheduler sharing an existing pool.
  pub fn with_pool(pool: ThreadPool) -> Self { Self { pool } }
}

impl Scheduler for ThreadPoolScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
    let (fut, abort) = abortable(async move {
      futures_time::task::sleep(delay.into()).await;
      task();
    });
    let handle = TaskHandle::with_abort(abort);
    let c_handle = handle.clone();
    self.pool.spawn_ok(async move {
      if fut.await.is_ok() {
        c_handle.finish();
      }
    });
    handle
  }

  fn schedule_repeating(&self, interval: Duration, mut task: RepeatingTask) -> TaskHandle {
    let (fut, abort) = abortable(async move {
      loop {
        futures_time::task::sleep(interval.into()).await;
        task();
      }
    });
    self.pool.spawn_ok(async move {
      if fut.await.is_err() {
        tracing::trace!("repeating task cancelled");
      }
    });
    TaskHandle::with_abort(abort)
  }
}
