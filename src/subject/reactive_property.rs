use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::subscribers::{broadcast_value, Subscribers};
use crate::{
  error::RxError,
  observable::Observable,
  observer::{BoxedObserver, Observer, SharedObserver},
  subscription::Subscription,
};

struct PropertyState<Item> {
  value: Mutex<Item>,
  observers: Mutex<Subscribers<Item>>,
}

/// A value holder that broadcasts every change.
///
/// Each new subscriber receives the current value before `subscribe`
/// returns. Setting a value equal to the current one does nothing; a
/// different value is stored and delivered synchronously to the current
/// subscribers in subscription order. A property never terminates.
///
/// Observers are moved into `subscribe`, so one observer instance can never be
/// registered twice.
///
/// ```
/// use rxlite::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let volume = ReactiveProperty::new(5);
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// volume.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// volume.set_value(5);
/// volume.set_value(7);
/// assert_eq!(*seen.lock().unwrap(), vec![5, 7]);
/// ```
pub struct ReactiveProperty<Item> {
  state: Arc<PropertyState<Item>>,
}

impl<Item> Clone for ReactiveProperty<Item> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<Item: Default> Default for ReactiveProperty<Item> {
  fn default() -> Self { Self::new(Item::default()) }
}

impl<Item> ReactiveProperty<Item> {
  pub fn new(value: Item) -> Self {
    Self {
      state: Arc::new(PropertyState { value: Mutex::new(value), observers: Mutex::new(Subscribers::default()) }),
    }
  }

  /// Number of observers currently registered.
  pub fn observer_count(&self) -> usize { self.state.observers.lock().len() }
}

impl<Item: Clone + PartialEq> ReactiveProperty<Item> {
  pub fn value(&self) -> Item { self.state.value.lock().clone() }

  /// Store `value` and broadcast it, unless it equals the current value.
  pub fn set_value(&self, value: Item) { self.update(|_| value) }

  /// Compute the next value from the current one. Broadcasts only when the
  /// result differs from the current value.
  pub fn update(&self, f: impl FnOnce(&Item) -> Item) {
    let (snapshot, value) = {
      let mut current = self.state.value.lock();
      let next = f(&current);
      if *current == next {
        return;
      }
      *current = next.clone();
      (self.state.observers.lock().snapshot(), next)
    };
    broadcast_value(&snapshot, value);
  }
}

impl<Item> std::fmt::Debug for ReactiveProperty<Item>
where
  Item: std::fmt::Debug,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReactiveProperty")
      .field("value", &*self.state.value.lock())
      .field("observer_count", &self.observer_count())
      .finish()
  }
}

impl<Item: Clone + Send + 'static> Observable for ReactiveProperty<Item> {
  type Item = Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    let boxed: BoxedObserver<Item> = Box::new(observer);
    let shared = Arc::new(SharedObserver::new(boxed));

    // Register and read the value under the value lock, then replay while
    // other threads are held out of the new observer's slot: a concurrent
    // change either happened before (and is the replayed value) or is
    // delivered after the replay.
    let id = {
      let _serial = shared.hold();
      let (id, value) = {
        let value = self.state.value.lock();
        let id = self.state.observers.lock().add(shared.clone());
        (id, value.clone())
      };
      shared.next(value);
      id
    };

    let state: Weak<PropertyState<Item>> = Arc::downgrade(&self.state);
    Subscription::new(move || {
      shared.close();
      if let Some(state) = state.upgrade() {
        state.observers.lock().remove(id);
      }
    })
  }
}

/// Pushing into a property sets its value. Terminal notifications are
/// ignored: a property stays alive.
impl<Item: Clone + PartialEq> Observer<Item> for ReactiveProperty<Item> {
  fn next(&mut self, value: Item) { self.set_value(value) }

  fn error(&mut self, err: RxError) {
    tracing::trace!(error = %err, "reactive property ignores error");
  }

  fn complete(&mut self) {}
}
