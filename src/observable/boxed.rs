//! Type-erased observables
//!
//! Operator chains have long concrete types. [`BoxedObservable`] hides them
//! behind one type per item, so differently built streams can be stored in
//! the same field or returned from the same function.

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::Subscription,
};

/// Object-safe observable trait for type erasure.
trait DynObservable<Item> {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item>) -> Subscription;
}

impl<S> DynObservable<S::Item> for S
where
  S: Observable,
  S::Item: 'static,
{
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<S::Item>) -> Subscription {
    (*self).actual_subscribe(observer)
  }
}

/// An observable of `Item` whose concrete type was erased, see
/// [`box_it`](crate::observable::ObservableExt::box_it).
pub struct BoxedObservable<Item>(Box<dyn DynObservable<Item> + Send>);

impl<Item: 'static> BoxedObservable<Item> {
  pub fn new(source: impl Observable<Item = Item> + Send + 'static) -> Self { Self(Box::new(source)) }
}

impl<Item: 'static> Observable for BoxedObservable<Item> {
  type Item = Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    self.0.box_subscribe(Box::new(observer))
  }
}
