use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::RxError,
  observable::Observable,
  observer::{BoxedObserver, Observer, SharedObserver},
  subscription::Subscription,
};

/// Observable built from a subscribe function, see [`create`].
pub struct Create<F, Item> {
  subscribe: F,
  _marker: PhantomData<fn() -> Item>,
}

impl<F: Clone, Item> Clone for Create<F, Item> {
  fn clone(&self) -> Self { Self { subscribe: self.subscribe.clone(), _marker: PhantomData } }
}

/// Build a cold observable from `subscribe`.
///
/// `subscribe` runs once per subscription with an [`Emitter`] for the new
/// observer and returns the subscription releasing whatever it started. If it
/// fails, the error is delivered to the observer and nothing is left to
/// release.
///
/// ```
/// use rxlite::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// observable::create(|emitter: Emitter<i32>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
///   Ok(Subscription::empty())
/// })
/// .subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub fn create<Item, F>(subscribe: F) -> Create<F, Item>
where
  F: FnOnce(Emitter<Item>) -> Result<Subscription, RxError>,
{
  Create { subscribe, _marker: PhantomData }
}

impl<F, Item> Observable for Create<F, Item>
where
  F: FnOnce(Emitter<Item>) -> Result<Subscription, RxError>,
  Item: Send + 'static,
{
  type Item = Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    let boxed: BoxedObserver<Item> = Box::new(observer);
    let shared = Arc::new(SharedObserver::new(boxed));
    let emitter = Emitter(shared.clone());

    match (self.subscribe)(emitter) {
      Ok(inner) => Subscription::new(move || {
        shared.close();
        inner.unsubscribe();
      }),
      Err(err) => {
        tracing::debug!(error = %err, "create: subscribe function failed");
        shared.error(err);
        Subscription::empty()
      }
    }
  }
}

/// The handle `create`'s subscribe function pushes notifications through.
///
/// Cloneable and thread-safe, so it can be moved into a callback or a
/// scheduled task. Once a terminal notification was sent, or the subscription
/// was released, everything further is dropped.
pub struct Emitter<Item>(Arc<SharedObserver<Item>>);

impl<Item> Clone for Emitter<Item> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item> Emitter<Item> {
  pub fn next(&self, value: Item) { self.0.next(value) }

  pub fn error(&self, err: RxError) { self.0.error(err) }

  pub fn complete(&self) { self.0.complete() }

  /// Whether the observer stopped listening: a terminal notification was sent,
  /// the subscription was released, or the observer itself reports closed.
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Item> Observer<Item> for Emitter<Item> {
  fn next(&mut self, value: Item) { Emitter::next(self, value) }

  fn error(&mut self, err: RxError) { Emitter::error(self, err) }

  fn complete(&mut self) { Emitter::complete(self) }

  fn is_closed(&self) -> bool { Emitter::is_closed(self) }
}
