use futures::future::abortable;
use tokio::runtime::Handle;

use super::{Duration, Instant, OnceTask, RepeatingTask, Scheduler, TaskHandle};
use crate::error::RxError;

/// Runs tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  /// A scheduler on the runtime of the calling context.
  ///
  /// Fails when called outside a tokio runtime.
  pub fn current() -> Result<Self, RxError> {
    let handle = Handle::try_current().map_err(RxError::user)?;
    Ok(Self { handle })
  }

  pub fn new(handle: Handle) -> Self { Self { handle } }
}

impl Scheduler for TokioScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
    let (fut, abort) = abortable(async move {
      tokio::time::sleep(delay).await;
      task();
    });
    let handle = TaskHandle::with_abort(abort);
    let c_handle = handle.clone();
    self.handle.spawn(async move {
      if fut.await.is_ok() {
        c_handle.finish();
      }
    });
    handle
  }

  fn schedule_repeating(&self, interval: Duration, mut task: RepeatingTask) -> TaskHandle {
    let (fut, abort) = abortable(async move {
      let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
      loop {
        ticker.tick().await;
        task();
      }
    });
    self.handle.spawn(fut);
    TaskHandle::with_abort(abort)
  }
}
