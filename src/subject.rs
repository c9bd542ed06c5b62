//! Hot multicast sources
//!
//! A [`Subject`] is both an observer and an observable: whatever is pushed
//! into it is broadcast to every current subscriber. [`ReactiveProperty`] is a
//! subject with a current value that is replayed to each new subscriber.
//!
//! Observers stay registered until their subscription is released. A
//! subscription that is never released keeps its observer alive as long as the
//! source lives.
//!
//! Broadcasts iterate over a snapshot of the observer list taken under the
//! list lock, and deliver outside it. A subscribe racing a broadcast either is
//! in the snapshot or is not; it never sees a torn list. An observer released
//! while a broadcast is in flight receives nothing further.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{
  error::RxError,
  observable::Observable,
  observer::{BoxedObserver, Observer, SharedObserver},
  subscription::Subscription,
};

mod reactive_property;
mod subscribers;

pub use reactive_property::ReactiveProperty;
use subscribers::{broadcast_complete, broadcast_error, broadcast_value, Subscribers};

#[derive(Clone)]
enum Terminal {
  Completed,
  Errored(RxError),
}

struct SubjectState<Item> {
  observers: Subscribers<Item>,
  terminal: Option<Terminal>,
}

/// Multicast hot source.
///
/// Active until the first `error` or `complete`, which is absorbing: later
/// terminal calls are ignored, values are dropped, and new subscribers receive
/// the stored terminal notification right away.
///
/// Cloning yields another handle to the same subject.
///
/// ```
/// use rxlite::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let subject = Subject::<i32>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.clone().map(|v| v + 1).subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// subject.next(1);
/// subject.next(2);
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub struct Subject<Item> {
  state: Arc<Mutex<SubjectState<Item>>>,
}

impl<Item> Clone for Subject<Item> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<Item> Default for Subject<Item> {
  fn default() -> Self {
    Self { state: Arc::new(Mutex::new(SubjectState { observers: Subscribers::default(), terminal: None })) }
  }
}

impl<Item> Subject<Item> {
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently registered.
  pub fn observer_count(&self) -> usize { self.state.lock().observers.len() }

  /// Whether `error` or `complete` was called.
  pub fn is_terminated(&self) -> bool { self.state.lock().terminal.is_some() }

  pub fn next(&self, value: Item)
  where
    Item: Clone,
  {
    let snapshot = {
      let state = self.state.lock();
      if state.terminal.is_some() {
        return;
      }
      state.observers.snapshot()
    };
    broadcast_value(&snapshot, value);
  }

  pub fn error(&self, err: RxError) {
    let Some(observers) = self.terminate(Terminal::Errored(err.clone())) else {
      return;
    };
    broadcast_error(&observers, err);
  }

  pub fn complete(&self) {
    let Some(observers) = self.terminate(Terminal::Completed) else {
      return;
    };
    broadcast_complete(&observers);
  }

  fn terminate(&self, terminal: Terminal) -> Option<subscribers::Snapshot<Item>> {
    let mut state = self.state.lock();
    if state.terminal.is_some() {
      tracing::trace!("subject already terminated, ignoring terminal notification");
      return None;
    }
    state.terminal = Some(terminal);
    Some(state.observers.drain())
  }
}

fn remove_on_release<Item: Send + 'static>(
  state: Weak<Mutex<SubjectState<Item>>>,
  id: usize,
  observer: Arc<SharedObserver<Item>>,
) -> Subscription {
  Subscription::new(move || {
    observer.close();
    if let Some(state) = state.upgrade() {
      state.lock().observers.remove(id);
    }
  })
}

impl<Item: Clone + Send + 'static> Observable for Subject<Item> {
  type Item = Item;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    let mut state = self.state.lock();
    match state.terminal.clone() {
      Some(Terminal::Completed) => {
        drop(state);
        observer.complete();
        Subscription::empty()
      }
      Some(Terminal::Errored(err)) => {
        drop(state);
        observer.error(err);
        Subscription::empty()
      }
      None => {
        let boxed: BoxedObserver<Item> = Box::new(observer);
        let shared = Arc::new(SharedObserver::new(boxed));
        let id = state.observers.add(shared.clone());
        drop(state);
        remove_on_release(Arc::downgrade(&self.state), id, shared)
      }
    }
  }
}

impl<Item: Clone> Observer<Item> for Subject<Item> {
  fn next(&mut self, value: Item) { Subject::next(self, value) }

  fn error(&mut self, err: RxError) { Subject::error(self, err) }

  fn complete(&mut self) { Subject::complete(self) }

  fn is_closed(&self) -> bool { self.is_terminated() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::prelude::*;

  fn recorder() -> (Arc<Mutex<Vec<String>>>, FnObserver<impl FnMut(i32), impl FnMut(RxError), impl FnMut()>) {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    let observer = FnObserver::new(
      move |v: i32| n.lock().push(format!("next {v}")),
      move |err: RxError| e.lock().push(format!("error {err}")),
      move || c.lock().push("complete".to_string()),
    );
    (log, observer)
  }

  #[test]
  fn broadcast_to_all_subscribers() {
    let subject = Subject::<i32>::new();
    let (log_a, a) = recorder();
    let (log_b, b) = recorder();
    subject.clone().actual_subscribe(a);
    subject.clone().actual_subscribe(b);
    assert_eq!(subject.observer_count(), 2);

    subject.next(1);
    subject.complete();

    assert_eq!(*log_a.lock(), vec!["next 1", "complete"]);
    assert_eq!(*log_b.lock(), vec!["next 1", "complete"]);
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn first_terminal_wins() {
    let subject = Subject::<i32>::new();
    let (log, observer) = recorder();
    subject.clone().actual_subscribe(observer);

    subject.error(RxError::msg("first"));
    subject.complete();
    subject.error(RxError::msg("second"));
    subject.next(2);

    assert_eq!(*log.lock(), vec!["error first"]);
  }

  #[test]
  fn late_subscriber_receives_stored_terminal() {
    let subject = Subject::<i32>::new();
    subject.next(1);
    subject.error(RxError::msg("gone"));

    let (log, observer) = recorder();
    let sub = subject.clone().actual_subscribe(observer);

    assert!(sub.is_closed());
    assert_eq!(*log.lock(), vec!["error gone"]);

    let subject = Subject::<i32>::new();
    subject.complete();
    let (log, observer) = recorder();
    subject.actual_subscribe(observer);
    assert_eq!(*log.lock(), vec!["complete"]);
  }

  #[test]
  fn unsubscribe_detaches_observer() {
    let subject = Subject::<i32>::new();
    let (log, observer) = recorder();
    let sub = subject.clone().actual_subscribe(observer);

    subject.next(1);
    sub.unsubscribe();
    sub.unsubscribe();
    subject.next(2);

    assert_eq!(subject.observer_count(), 0);
    assert_eq!(*log.lock(), vec!["next 1"]);
  }

  #[test]
  fn unsubscribe_during_broadcast() {
    let subject = Subject::<i32>::new();
    let second_hits = Arc::new(AtomicUsize::new(0));
    let holder: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    // The first observer releases the second one while the broadcast is in
    // flight; the second must not receive that value.
    let c_holder = holder.clone();
    subject.clone().subscribe(move |_| {
      if let Some(sub) = c_holder.lock().take() {
        sub.unsubscribe();
      }
    });
    let c_hits = second_hits.clone();
    let second = subject.clone().subscribe(move |_| {
      c_hits.fetch_add(1, Ordering::SeqCst);
    });
    *holder.lock() = Some(second);

    subject.next(1);
    subject.next(2);

    assert_eq!(second_hits.load(Ordering::SeqCst), 0);
    assert_eq!(subject.observer_count(), 1);
  }

  #[test]
  fn observer_may_unsubscribe_itself() {
    let subject = Subject::<i32>::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let holder: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let (c_hits, c_holder) = (hits.clone(), holder.clone());
    let sub = subject.clone().subscribe(move |_| {
      c_hits.fetch_add(1, Ordering::SeqCst);
      if let Some(sub) = c_holder.lock().as_ref() {
        sub.unsubscribe();
      }
    });
    *holder.lock() = Some(sub);

    subject.next(1);
    subject.next(2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn subject_as_observer() {
    let subject = Subject::<i32>::new();
    let (log, observer) = recorder();
    subject.clone().actual_subscribe(observer);

    observable::from_iter([1, 2]).actual_subscribe(subject.clone());

    assert!(subject.is_terminated());
    assert_eq!(*log.lock(), vec!["next 1", "next 2", "complete"]);
  }

  #[test]
  fn concurrent_next_and_subscribe() {
    let subject = Subject::<usize>::new();
    let total = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..4)
      .map(|_| {
        let subject = subject.clone();
        std::thread::spawn(move || {
          for i in 0..200 {
            subject.next(i);
          }
        })
      })
      .collect();
    for _ in 0..8 {
      let total = total.clone();
      subject.clone().subscribe(move |_| {
        total.fetch_add(1, Ordering::SeqCst);
      });
    }
    for producer in producers {
      producer.join().unwrap();
    }

    subject.next(0);
    assert!(total.load(Ordering::SeqCst) >= 8);
    assert_eq!(subject.observer_count(), 8);
  }

  #[test]
  fn subscriber_may_feed_back_into_subject() {
    let subject = Subject::<i32>::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c, c_subject) = (log.clone(), log.clone(), subject.clone());
    let sub = subject.clone().map(|v| v * 10).subscribe_complete(
      move |v| {
        n.lock().push(format!("next {v}"));
        if v < 30 {
          c_subject.next(v / 10 + 1);
        } else {
          c_subject.complete();
        }
      },
      move || c.lock().push("complete".to_string()),
    );

    subject.next(0);

    assert_eq!(*log.lock(), vec!["next 0", "next 10", "next 20", "next 30", "complete"]);
    assert!(subject.is_terminated());
    assert_eq!(subject.observer_count(), 0);
    sub.unsubscribe();
  }
}
