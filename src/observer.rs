//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::{
  cell::RefCell,
  collections::VecDeque,
  sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::ReentrantMutex;

use crate::error::RxError;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives zero or more values followed by at most one terminal
/// notification, either `error` or `complete`. Sources in this crate never
/// call an observer again after a terminal notification, and every operator
/// observer guards the same rule for its own downstream.
pub trait Observer<Item> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(&mut self, err: RxError);

  /// Handle completion of the observable
  fn complete(&mut self);

  /// Checks if the observer is closed.
  ///
  /// Synchronous sources (like `from_iter`) poll this to stop emitting early,
  /// for example once a `take` downstream is satisfied.
  fn is_closed(&self) -> bool { false }
}

/// Type-erased observer, as stored by subjects and boxed observables.
pub type BoxedObserver<Item> = Box<dyn Observer<Item> + Send>;

impl<Item, O> Observer<Item> for Box<O>
where
  O: Observer<Item> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: RxError) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

// ============================================================================
// FnObserver - Closure adapter
// ============================================================================

/// Observer built from closures, created by the `subscribe*` family.
///
/// Once a terminal notification arrived, further notifications are dropped.
#[derive(Clone)]
pub struct FnObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
  stopped: bool,
}

impl<N, E, C> FnObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    Self { next, error, complete, stopped: false }
  }
}

impl<Item, N, E, C> Observer<Item> for FnObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(RxError),
  C: FnMut(),
{
  fn next(&mut self, value: Item) {
    if !self.stopped {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: RxError) {
    if !self.stopped {
      self.stopped = true;
      (self.error)(err);
    }
  }

  fn complete(&mut self) {
    if !self.stopped {
      self.stopped = true;
      (self.complete)();
    }
  }

  fn is_closed(&self) -> bool { self.stopped }
}

/// Error handler used by `subscribe(next)` when no handler was given.
pub(crate) fn log_unhandled_error(err: RxError) {
  tracing::error!(error = %err, "unhandled error reached a subscriber");
}

pub(crate) fn ignore_complete() {}

// ============================================================================
// SharedObserver - thread-safe, re-entrant terminal-once slot
// ============================================================================

enum Notification<Item> {
  Next(Item),
  Error(RxError),
  Complete,
}

struct Slot<Item, O> {
  /// Out of the slot while a notification is being delivered.
  observer: Option<O>,
  delivering: bool,
  /// Notifications pushed from inside the observer's own callbacks.
  queued: VecDeque<Notification<Item>>,
}

/// A thread-safe slot holding an observer reachable from more than one place.
///
/// Used by subject observer lists, `create` emitters and the operators that
/// feed one downstream from several sources or from scheduler tasks.
///
/// Notifications from different threads are serialized. A notification pushed
/// from inside the observer's own callback, on the same thread, is queued and
/// delivered right after that callback returns, so feedback loops neither
/// deadlock nor reorder. Closing the slot is lock free, so a subscription can
/// be released from inside the observer's own callback.
pub(crate) struct SharedObserver<Item, O = BoxedObserver<Item>> {
  released: AtomicBool,
  stopped: AtomicBool,
  slot: ReentrantMutex<RefCell<Slot<Item, O>>>,
}

impl<Item, O> SharedObserver<Item, O>
where
  O: Observer<Item>,
{
  pub(crate) fn new(observer: O) -> Self {
    Self {
      released: AtomicBool::new(false),
      stopped: AtomicBool::new(false),
      slot: ReentrantMutex::new(RefCell::new(Slot {
        observer: Some(observer),
        delivering: false,
        queued: VecDeque::new(),
      })),
    }
  }

  /// Detach without notifying. Later and queued values are dropped.
  pub(crate) fn close(&self) { self.released.store(true, Ordering::Release); }

  pub(crate) fn is_closed(&self) -> bool {
    if self.released.load(Ordering::Acquire) || self.stopped.load(Ordering::Acquire) {
      return true;
    }
    let Some(guard) = self.slot.try_lock() else {
      return false;
    };
    let Ok(slot) = guard.try_borrow() else {
      return false;
    };
    match &slot.observer {
      Some(observer) => observer.is_closed(),
      None => !slot.delivering,
    }
  }

  /// Keep other threads out of the slot until the guard is dropped.
  ///
  /// Notifications sent by the holding thread still go through, so a caller
  /// can pair reading its own state with delivering the result.
  pub(crate) fn hold(&self) -> impl Sized + '_ { self.slot.lock() }

  pub(crate) fn next(&self, value: Item) {
    if self.released.load(Ordering::Acquire) || self.stopped.load(Ordering::Acquire) {
      return;
    }
    self.deliver(Notification::Next(value));
  }

  pub(crate) fn error(&self, err: RxError) {
    if self.released.load(Ordering::Acquire) || self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    self.deliver(Notification::Error(err));
  }

  pub(crate) fn complete(&self) {
    if self.released.load(Ordering::Acquire) || self.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    self.deliver(Notification::Complete);
  }

  fn deliver(&self, notification: Notification<Item>) {
    let guard = self.slot.lock();
    let mut observer = {
      let mut slot = guard.borrow_mut();
      if slot.delivering {
        slot.queued.push_back(notification);
        return;
      }
      let Some(observer) = slot.observer.take() else {
        return;
      };
      slot.delivering = true;
      observer
    };

    let mut terminated = false;
    let mut current = Some(notification);
    while let Some(notification) = current {
      match notification {
        Notification::Next(value) => {
          if !self.released.load(Ordering::Acquire) {
            observer.next(value);
          }
        }
        Notification::Error(err) => {
          observer.error(err);
          terminated = true;
        }
        Notification::Complete => {
          observer.complete();
          terminated = true;
        }
      }
      if terminated {
        break;
      }
      current = guard.borrow_mut().queued.pop_front();
    }

    let observer = (!terminated).then_some(observer);
    let mut slot = guard.borrow_mut();
    slot.delivering = false;
    slot.queued.clear();
    slot.observer = observer;
  }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(&mut self, _: RxError) {}

    fn complete(&mut self) {}
  }

  #[test]
  fn test_observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[test]
  fn test_fn_observer_stops_after_terminal() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    let mut observer = FnObserver::new(
      move |v: i32| n.lock().push(format!("next {v}")),
      |_: RxError| {},
      move || c.lock().push("complete".to_string()),
    );

    observer.next(1);
    observer.complete();
    observer.next(2);
    observer.complete();

    assert!(Observer::<i32>::is_closed(&observer));
    assert_eq!(*log.lock(), vec!["next 1", "complete"]);
  }

  #[test]
  fn test_shared_observer_terminal_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    let shared = SharedObserver::<i32>::new(Box::new(FnObserver::new(
      move |v: i32| n.lock().push(v),
      |_: RxError| {},
      move || c.lock().push(-1),
    )));

    shared.next(1);
    shared.complete();
    shared.complete();
    shared.next(2);

    assert!(shared.is_closed());
    assert_eq!(*log.lock(), vec![1, -1]);
  }

  #[test]
  fn test_closed_shared_observer_drops_values() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let n = log.clone();
    let shared = SharedObserver::<i32>::new(Box::new(FnObserver::new(
      move |v: i32| n.lock().push(v),
      |_: RxError| {},
      || {},
    )));

    shared.close();
    shared.next(1);
    shared.error(RxError::msg("late"));

    assert!(log.lock().is_empty());
  }

  type Holder = Arc<Mutex<Option<Arc<SharedObserver<i32>>>>>;

  fn looping_observer(log: Arc<Mutex<Vec<String>>>, holder: Holder) -> BoxedObserver<i32> {
    let c = log.clone();
    Box::new(FnObserver::new(
      move |v: i32| {
        log.lock().push(format!("enter {v}"));
        let shared = holder.lock().clone();
        if let Some(shared) = shared {
          if v < 3 {
            shared.next(v + 1);
          } else {
            shared.complete();
          }
        }
        log.lock().push(format!("leave {v}"));
      },
      |_: RxError| {},
      move || c.lock().push("complete".to_string()),
    ))
  }

  #[test]
  fn test_reentrant_notifications_are_queued_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let holder: Holder = Arc::new(Mutex::new(None));
    let shared = Arc::new(SharedObserver::new(looping_observer(log.clone(), holder.clone())));
    *holder.lock() = Some(shared.clone());

    shared.next(0);

    assert_eq!(
      *log.lock(),
      vec!["enter 0", "leave 0", "enter 1", "leave 1", "enter 2", "leave 2", "enter 3", "leave 3", "complete"]
    );
    assert!(shared.is_closed());
    holder.lock().take();
  }

  #[test]
  fn test_reentrant_values_dropped_after_release() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let holder: Holder = Arc::new(Mutex::new(None));
    let (c_hits, c_holder) = (hits.clone(), holder.clone());
    let observer: BoxedObserver<i32> = Box::new(FnObserver::new(
      move |v: i32| {
        c_hits.lock().push(v);
        let shared = c_holder.lock().clone();
        if let Some(shared) = shared {
          shared.next(v + 1);
          shared.close();
        }
      },
      |_: RxError| {},
      || {},
    ));
    let shared = Arc::new(SharedObserver::new(observer));
    *holder.lock() = Some(shared.clone());

    shared.next(1);

    assert_eq!(*hits.lock(), vec![1]);
    assert!(shared.is_closed());
    holder.lock().take();
  }

  #[test]
  fn test_shared_observer_reports_downstream_closed() {
    let shared = SharedObserver::<i32>::new(Box::new(FnObserver::new(|_: i32| {}, |_: RxError| {}, || {})));
    assert!(!shared.is_closed());

    let mut finished = FnObserver::new(|_: i32| {}, |_: RxError| {}, || {});
    Observer::<i32>::complete(&mut finished);
    let shared = SharedObserver::<i32, _>::new(finished);
    assert!(shared.is_closed());
  }
}
