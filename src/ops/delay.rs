//! Delay operator implementation
//!
//! Every `next` and the `complete` of the source are re-emitted `delay` later
//! through a one-shot task of the scheduler. Errors are not delayed: they are
//! delivered at once and cancel whatever is still pending.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  scheduler::{Duration, Scheduler},
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Delay operator, see [`ObservableExt::delay`](crate::observable::ObservableExt::delay).
#[derive(Clone)]
pub struct Delay<S, Sch> {
  pub source: S,
  pub delay: Duration,
  pub scheduler: Sch,
}

enum Delayed<Item> {
  Next(Item),
  Complete,
}

/// Notifications waiting for their task, in arrival order.
///
/// A fired task delivers the oldest pending notification rather than the one
/// it was scheduled for, so delivery order holds even when a multi-threaded
/// scheduler runs tasks due at the same instant out of order.
struct DelayState<O, Item> {
  observer: SharedObserver<Item, O>,
  pending: Mutex<VecDeque<Delayed<Item>>>,
}

pub struct DelayObserver<O, Item, Sch> {
  state: Arc<DelayState<O, Item>>,
  delay: Duration,
  scheduler: Sch,
  upstream: CompositeSubscription,
}

impl<S, Sch> Observable for Delay<S, Sch>
where
  S: Observable,
  S::Item: Send + 'static,
  Sch: Scheduler + Send + 'static,
{
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let observer = DelayObserver {
      state: Arc::new(DelayState { observer: SharedObserver::new(observer), pending: Mutex::new(VecDeque::new()) }),
      delay: self.delay,
      scheduler: self.scheduler,
      upstream: upstream.clone(),
    };
    upstream.add(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

impl<O, Item, Sch> DelayObserver<O, Item, Sch>
where
  O: Observer<Item> + Send + 'static,
  Item: Send + 'static,
  Sch: Scheduler,
{
  fn schedule(&self, notification: Delayed<Item>) {
    self.state.pending.lock().push_back(notification);
    let state = self.state.clone();
    let upstream = self.upstream.clone();
    let handle = self.scheduler.schedule_once(self.delay, Box::new(move || deliver_oldest(&state, &upstream)));
    self.upstream.add(handle);
  }
}

fn deliver_oldest<O, Item>(state: &DelayState<O, Item>, upstream: &CompositeSubscription)
where
  O: Observer<Item>,
{
  let completed = {
    let _serial = state.observer.hold();
    let notification = state.pending.lock().pop_front();
    match notification {
      Some(Delayed::Next(value)) => {
        state.observer.next(value);
        false
      }
      Some(Delayed::Complete) => {
        state.observer.complete();
        true
      }
      None => false,
    }
  };
  if completed {
    upstream.unsubscribe();
  }
}

impl<O, Item, Sch> Observer<Item> for DelayObserver<O, Item, Sch>
where
  O: Observer<Item> + Send + 'static,
  Item: Send + 'static,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) { self.schedule(Delayed::Next(value)) }

  fn error(&mut self, err: RxError) {
    self.state.observer.error(err);
    self.state.pending.lock().clear();
    self.upstream.unsubscribe();
  }

  fn complete(&mut self) { self.schedule(Delayed::Complete) }

  fn is_closed(&self) -> bool { self.upstream.is_closed() || self.state.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  type Log = Arc<Mutex<Vec<String>>>;

  #[allow(clippy::type_complexity)]
  fn recorder() -> (
    Log,
    impl FnMut(i32) + Send + 'static,
    impl FnMut(RxError) + Send + 'static,
    impl FnMut() + Send + 'static,
  ) {
    let log: Log = Arc::new(Mutex::new(vec![]));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    (
      log,
      move |v: i32| n.lock().push(format!("next {v}")),
      move |err: RxError| e.lock().push(format!("error {err}")),
      move || c.lock().push("complete".into()),
    )
  }

  #[test]
  fn shifts_values_and_completion() {
    let scheduler = ManualScheduler::new();
    let (log, n, e, c) = recorder();
    observable::from_iter([1, 2, 3])
      .delay(Duration::from_millis(50), scheduler.clone())
      .subscribe_all(n, e, c);

    assert!(log.lock().is_empty());
    scheduler.advance_by(Duration::from_millis(49));
    assert!(log.lock().is_empty());
    scheduler.advance_by(Duration::from_millis(1));

    assert_eq!(*log.lock(), vec!["next 1", "next 2", "next 3", "complete"]);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn keeps_relative_timing() {
    let scheduler = ManualScheduler::new();
    let subject = Subject::<i32>::new();
    let (log, n, e, c) = recorder();
    subject
      .clone()
      .delay(Duration::from_millis(100), scheduler.clone())
      .subscribe_all(n, e, c);

    subject.next(1);
    scheduler.advance_by(Duration::from_millis(30));
    subject.next(2);
    scheduler.advance_by(Duration::from_millis(70));
    assert_eq!(*log.lock(), vec!["next 1"]);

    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(*log.lock(), vec!["next 1", "next 2"]);
  }

  #[test]
  fn error_is_immediate_and_cancels_pending() {
    let scheduler = ManualScheduler::new();
    let subject = Subject::<i32>::new();
    let (log, n, e, c) = recorder();
    let sub = subject
      .clone()
      .delay(Duration::from_millis(100), scheduler.clone())
      .subscribe_all(n, e, c);

    subject.next(1);
    subject.error(RxError::msg("boom"));
    assert_eq!(*log.lock(), vec!["error boom"]);
    assert!(sub.is_closed());

    scheduler.advance_by(Duration::from_secs(1));
    assert_eq!(*log.lock(), vec!["error boom"]);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn unsubscribe_cancels_pending() {
    let scheduler = ManualScheduler::new();
    let subject = Subject::<i32>::new();
    let (log, n, e, c) = recorder();
    let sub = subject
      .clone()
      .delay(Duration::from_millis(100), scheduler.clone())
      .subscribe_all(n, e, c);

    subject.next(1);
    subject.complete();
    sub.unsubscribe();
    scheduler.advance_by(Duration::from_secs(1));

    assert!(log.lock().is_empty());
    assert!(scheduler.is_empty());
  }

  #[test]
  fn releases_source_after_delayed_completion() {
    let scheduler = ManualScheduler::new();
    let subject = Subject::<i32>::new();
    let (log, n, e, c) = recorder();
    let sub = subject
      .clone()
      .delay(Duration::from_millis(10), scheduler.clone())
      .subscribe_all(n, e, c);

    subject.next(7);
    subject.complete();
    assert!(!sub.is_closed());

    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock(), vec!["next 7", "complete"]);
    assert!(sub.is_closed());
  }

  #[test]
  fn delayed_subscriber_may_feed_the_source() {
    let scheduler = ManualScheduler::new();
    let subject = Subject::<i32>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let (c_seen, c_subject) = (seen.clone(), subject.clone());
    subject
      .clone()
      .delay(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| {
        c_seen.lock().push(v);
        if v < 3 {
          c_subject.next(v + 1);
        }
      });

    subject.next(1);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*seen.lock(), vec![1]);
    scheduler.advance_by(Duration::from_millis(10));
    scheduler.advance_by(Duration::from_millis(10));

    assert_eq!(*seen.lock(), vec![1, 2, 3]);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn downstream_take_cancels_pending_values() {
    let scheduler = ManualScheduler::new();
    let (log, n, e, c) = recorder();
    observable::from_iter(0..5)
      .delay(Duration::from_millis(5), scheduler.clone())
      .take(2)
      .subscribe_all(n, e, c);
    scheduler.advance_by(Duration::from_millis(5));

    assert_eq!(*log.lock(), vec!["next 0", "next 1", "complete"]);
    assert!(scheduler.is_empty());
  }
}
