//! TakeUntil operator implementation
//!
//! Emits the values of the source until a second observable, the notifier,
//! emits a value. The notifier is subscribed first, so a notifier that fires
//! synchronously prevents the source from being subscribed at all.

use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// TakeUntil operator, see
/// [`ObservableExt::take_until`](crate::observable::ObservableExt::take_until).
#[derive(Clone)]
pub struct TakeUntil<S, N> {
  pub source: S,
  pub notifier: N,
}

type Downstream<Item, O> = Arc<SharedObserver<Item, O>>;

/// Observer for the source observable
pub struct TakeUntilObserver<O, Item> {
  observer: Downstream<Item, O>,
  upstream: CompositeSubscription,
}

/// Observer for the notifier observable
///
/// `Item` is the item type of the source; the notifier's own item type is
/// free, its values are only a signal.
pub struct TakeUntilNotifierObserver<O, Item> {
  observer: Downstream<Item, O>,
  upstream: CompositeSubscription,
  _marker: PhantomData<fn(Item)>,
}

impl<S, N> Observable for TakeUntil<S, N>
where
  S: Observable,
  S::Item: Send + 'static,
  N: Observable,
{
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let observer = Arc::new(SharedObserver::new(observer));

    let notifier_observer = TakeUntilNotifierObserver::<O, S::Item> {
      observer: observer.clone(),
      upstream: upstream.clone(),
      _marker: PhantomData,
    };
    upstream.add(self.notifier.actual_subscribe(notifier_observer));

    if !upstream.is_closed() {
      let source_observer = TakeUntilObserver { observer, upstream: upstream.clone() };
      upstream.add(self.source.actual_subscribe(source_observer));
    }
    upstream.into()
  }
}

impl<Item, O> Observer<Item> for TakeUntilObserver<O, Item>
where
  O: Observer<Item>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.upstream.unsubscribe();
  }

  fn complete(&mut self) {
    self.observer.complete();
    self.upstream.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.upstream.is_closed() || self.observer.is_closed() }
}

impl<NotifierItem, O, Item> Observer<NotifierItem> for TakeUntilNotifierObserver<O, Item>
where
  O: Observer<Item>,
{
  fn next(&mut self, _: NotifierItem) {
    if !self.observer.is_closed() {
      tracing::trace!("take_until notifier fired");
    }
    self.observer.complete();
    self.upstream.unsubscribe();
  }

  fn error(&mut self, err: RxError) {
    self.observer.error(err);
    self.upstream.unsubscribe();
  }

  // A notifier that completes without emitting never stops the source.
  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.upstream.is_closed() || self.observer.is_closed() }
}
