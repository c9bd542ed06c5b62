use crate::{
  error::RxError,
  observable::Observable,
  observer::Observer,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Emits only the first `count` values emitted by the source Observable.
///
/// If the source emits fewer than `count` values then all of its values are
/// emitted. Once `count` values went through, `take` completes and releases
/// the source, regardless if the source completes. Anything the source sends
/// afterwards, an error included, is swallowed. `take(0)` completes right
/// away without subscribing to the source.
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from_iter(0..10).take(5).subscribe(|v| println!("{v}"));
///
/// // print logs:
/// // 0
/// // 1
/// // 2
/// // 3
/// // 4
/// ```
#[derive(Clone)]
pub struct Take<S> {
  pub source: S,
  pub count: usize,
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: CompositeSubscription,
}

impl<S: Observable> Observable for Take<S> {
  type Item = S::Item;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    if self.count == 0 {
      observer.complete();
      return Subscription::empty();
    }
    let upstream = CompositeSubscription::new();
    let observer = TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

impl<Item, O> Observer<Item> for TakeObserver<O>
where
  O: Observer<Item>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    observer.next(value);
    self.remaining -= 1;
    if self.remaining == 0 {
      if let Some(mut observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.unsubscribe();
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
