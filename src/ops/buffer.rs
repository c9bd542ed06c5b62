//! Buffer operator implementation
//!
//! Collects the values of the source into time windows driven by a repeating
//! scheduler task. Each window that received at least one value is emitted as
//! a fresh `Vec` sized to the window, which the downstream owns. The working
//! list keeps its capacity and lives for the whole subscription: it is rented
//! from an [`ObjectPool`] and handed back once the subscription ends, so
//! pushes never reallocate once a subscription has seen its largest window.
//! The emitted copy is the only allocation per flush.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  pool::ObjectPool,
  scheduler::{Duration, Scheduler},
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Idle working lists kept by the pool `buffer` creates on its own.
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 16;

// ==================== Buffer ====================

/// Buffer operator, see [`ObservableExt::buffer`](crate::observable::ObservableExt::buffer).
pub struct Buffer<S, Sch, Item> {
  pub source: S,
  pub window: Duration,
  pub scheduler: Sch,
  pub pool: ObjectPool<Vec<Item>>,
}

impl<S: Clone, Sch: Clone, Item> Clone for Buffer<S, Sch, Item> {
  fn clone(&self) -> Self {
    Self {
      source: self.source.clone(),
      window: self.window,
      scheduler: self.scheduler.clone(),
      pool: self.pool.clone(),
    }
  }
}

// ==================== State ====================

struct BufferState<O, Item> {
  observer: SharedObserver<Vec<Item>, O>,
  /// `None` once the list went back to the pool.
  working: Mutex<Option<Vec<Item>>>,
}

impl<O, Item> BufferState<O, Item>
where
  O: Observer<Vec<Item>>,
{
  /// Move the buffered values into a new `Vec`, or `None` when the window is
  /// empty.
  fn drain(&self) -> Option<Vec<Item>> {
    let mut working = self.working.lock();
    match working.as_mut() {
      Some(list) if !list.is_empty() => Some(list.drain(..).collect()),
      _ => None,
    }
  }

  fn flush(&self) {
    let _serial = self.observer.hold();
    if self.observer.is_closed() {
      return;
    }
    if let Some(batch) = self.drain() {
      self.observer.next(batch);
    }
  }
}

// ==================== Observable ====================

impl<S, Sch, Item> Observable for Buffer<S, Sch, Item>
where
  S: Observable<Item = Item>,
  Item: Send + 'static,
  Sch: Scheduler,
{
  type Item = Vec<Item>;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Vec<Item>> + Send + 'static,
  {
    let Self { source, window, scheduler, pool } = self;
    let upstream = CompositeSubscription::new();
    let state =
      Arc::new(BufferState { observer: SharedObserver::new(observer), working: Mutex::new(Some(pool.rent())) });

    let c_state = state.clone();
    upstream.add(Subscription::new(move || {
      let list = c_state.working.lock().take();
      if let Some(list) = list {
        pool.put_back(list);
      }
    }));

    let c_state = state.clone();
    upstream.add(scheduler.schedule_repeating(window, Box::new(move || c_state.flush())));

    upstream.add(source.actual_subscribe(BufferObserver { state, upstream: upstream.clone() }));
    upstream.into()
  }
}

// ==================== Observer ====================

pub struct BufferObserver<O, Item> {
  state: Arc<BufferState<O, Item>>,
  upstream: CompositeSubscription,
}

impl<O, Item> Observer<Item> for BufferObserver<O, Item>
where
  O: Observer<Vec<Item>>,
{
  fn next(&mut self, value: Item) {
    if let Some(list) = self.state.working.lock().as_mut() {
      list.push(value);
    }
  }

  fn error(&mut self, err: RxError) {
    self.state.observer.error(err);
    self.upstream.unsubscribe();
  }

  fn complete(&mut self) {
    {
      let _serial = self.state.observer.hold();
      if !self.state.observer.is_closed() {
        if let Some(rest) = self.state.drain() {
          self.state.observer.next(rest);
        }
      }
      self.state.observer.complete();
    }
    self.upstream.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.upstream.is_closed() || self.state.observer.is_closed() }
}
