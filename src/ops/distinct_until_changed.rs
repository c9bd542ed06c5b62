//! DistinctUntilChanged operator implementation
//!
//! Filters consecutive duplicate items emitted by the source observable. The
//! first value always passes; after that a value is forwarded only when the
//! comparer reports it differs from the last forwarded one.

use std::marker::PhantomData;

use crate::{
  error::RxError,
  function::Comparer,
  observable::Observable,
  observer::Observer,
  ops::callback_failed,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// DistinctUntilChanged operator: Emits items only if they are different from
/// the previous item.
#[derive(Clone)]
pub struct DistinctUntilChanged<S, C> {
  pub source: S,
  pub comparer: C,
}

/// DistinctUntilChangedObserver wrapper for filtering consecutive duplicates
pub struct DistinctUntilChangedObserver<O, C, Item> {
  observer: Option<O>,
  comparer: C,
  last: Option<Item>,
  upstream: CompositeSubscription,
  _marker: PhantomData<fn(Item)>,
}

impl<S, C> Observable for DistinctUntilChanged<S, C>
where
  S: Observable,
  S::Item: Clone + Send + 'static,
  C: Comparer<S::Item> + Send + 'static,
{
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let observer = DistinctUntilChangedObserver {
      observer: Some(observer),
      comparer: self.comparer,
      last: None,
      upstream: upstream.clone(),
      _marker: PhantomData,
    };
    upstream.add(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

impl<O, C, Item> Observer<Item> for DistinctUntilChangedObserver<O, C, Item>
where
  O: Observer<Item>,
  C: Comparer<Item>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    let changed = match &self.last {
      None => Ok(true),
      Some(last) => self.comparer.equals(last, &value).map(|equal| !equal),
    };
    match changed {
      Ok(true) => {
        self.last = Some(value.clone());
        if let Some(observer) = self.observer.as_mut() {
          observer.next(value);
        }
      }
      Ok(false) => {}
      Err(err) => {
        if let Some(mut observer) = self.observer.take() {
          observer.error(callback_failed("distinct_until_changed", err));
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
