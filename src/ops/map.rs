//! Map operator implementation
//!
//! Transforms every value with a selector. The selector either cannot fail
//! (`map`) or returns a `Result` (`try_map`); a failure ends the stream with
//! an `error` naming `map` and releases the source.

use crate::{
  error::RxError,
  function::Callback,
  observable::Observable,
  observer::Observer,
  ops::callback_failed,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Map operator, see [`ObservableExt::map`](crate::observable::ObservableExt::map).
#[derive(Clone)]
pub struct Map<S, F> {
  pub source: S,
  pub func: F,
}

pub struct MapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: CompositeSubscription,
}

impl<S, F> Observable for Map<S, F>
where
  S: Observable,
  F: Callback<S::Item> + Send + 'static,
{
  type Item = F::Output;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<F::Output> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let observer = MapObserver { observer: Some(observer), func: self.func, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

impl<Item, O, F> Observer<Item> for MapObserver<O, F>
where
  O: Observer<F::Output>,
  F: Callback<Item>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match self.func.call(value) {
      Ok(mapped) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(mapped);
        }
      }
      Err(err) => {
        if let Some(mut observer) = self.observer.take() {
          observer.error(callback_failed("map", err));
        }
        self.upstream.unsubscribe();
      }
    }
  }

  fn error(&mut self, err: RxError) {
    if let Some(mut observer) = self.observer.take() {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    if let Some(mut observer) = self.observer.take() {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.as_ref().map_or(true, |o| o.is_closed()) }
}
