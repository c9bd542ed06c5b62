//! Observable trait and fluent operator surface
//!
//! [`Observable`] is the single capability every source and operator
//! implements. [`ObservableExt`] is blanket-implemented for all of them and
//! carries the fluent API: operators return new observables wrapping `self`,
//! and the `subscribe*` family attaches closures.
//!
//! Cold sources live in the submodules: [`create`], [`from_iter`], [`of`],
//! [`empty`] and [`throw_err`].

use crate::{
  error::RxError,
  function::{EqComparer, Fallible, Infallible},
  observer::{ignore_complete, log_unhandled_error, FnObserver, Observer},
  ops::{
    buffer::{Buffer, DEFAULT_BUFFER_POOL_SIZE},
    combine_latest::CombineLatest,
    delay::Delay,
    distinct_until_changed::DistinctUntilChanged,
    filter::Filter,
    map::Map,
    skip::Skip,
    take::Take,
    take_until::TakeUntil,
    throttle::Throttle,
  },
  pool::ObjectPool,
  scheduler::{Duration, Scheduler},
  subscription::Subscription,
};

mod boxed;
mod create;
mod from_iter;
mod trivial;

pub use boxed::BoxedObservable;
pub use create::{create, Create, Emitter};
pub use from_iter::{from_iter, of, FromIter};
pub use trivial::{empty, throw_err, Empty, ThrowErr};

/// A source of values that can be subscribed to.
///
/// Subscribing consumes the observable. Hot sources such as
/// [`Subject`](crate::subject::Subject) are cheap handles, so clone them to
/// subscribe more than once.
pub trait Observable {
  type Item;

  /// Attach `observer` and start delivering to it.
  ///
  /// Delivery may begin before this returns: a synchronous source emits all of
  /// its values, and its terminal notification, from inside this call.
  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item> + Send + 'static;
}

/// Fluent operators and subscribe helpers, available on every [`Observable`].
pub trait ObservableExt: Observable + Sized {
  /// Transform every value with `f`.
  ///
  /// ```
  /// use rxlite::prelude::*;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// observable::from_iter([1, 2, 3])
  ///   .map(|v| v * 10)
  ///   .subscribe(move |v| c_seen.lock().unwrap().push(v));
  /// assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
  /// ```
  fn map<B, F>(self, f: F) -> Map<Self, Infallible<F>>
  where
    F: FnMut(Self::Item) -> B,
  {
    Map { source: self, func: Infallible(f) }
  }

  /// Like [`map`](ObservableExt::map), but `f` may fail. A failure is
  /// delivered as `error` and the upstream subscription is released.
  fn try_map<B, F>(self, f: F) -> Map<Self, Fallible<F>>
  where
    F: FnMut(Self::Item) -> Result<B, RxError>,
  {
    Map { source: self, func: Fallible(f) }
  }

  /// Forward only the values for which `predicate` holds.
  fn filter<F>(self, predicate: F) -> Filter<Self, Infallible<F>>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    Filter { source: self, predicate: Infallible(predicate) }
  }

  fn try_filter<F>(self, predicate: F) -> Filter<Self, Fallible<F>>
  where
    F: FnMut(&Self::Item) -> Result<bool, RxError>,
  {
    Filter { source: self, predicate: Fallible(predicate) }
  }

  /// Ignore the first `count` values.
  fn skip(self, count: usize) -> Skip<Self> { Skip { source: self, count } }

  /// Forward the first `count` values, then complete and release the source.
  fn take(self, count: usize) -> Take<Self> { Take { source: self, count } }

  /// Drop values equal to the last forwarded one.
  fn distinct_until_changed(self) -> DistinctUntilChanged<Self, EqComparer>
  where
    Self::Item: PartialEq + Clone,
  {
    DistinctUntilChanged { source: self, comparer: EqComparer }
  }

  /// Like [`distinct_until_changed`](ObservableExt::distinct_until_changed)
  /// with a custom equality, called as `equals(previous, current)`.
  fn distinct_until_changed_by<F>(self, equals: F) -> DistinctUntilChanged<Self, Infallible<F>>
  where
    F: FnMut(&Self::Item, &Self::Item) -> bool,
  {
    DistinctUntilChanged { source: self, comparer: Infallible(equals) }
  }

  fn try_distinct_until_changed_by<F>(self, equals: F) -> DistinctUntilChanged<Self, Fallible<F>>
  where
    F: FnMut(&Self::Item, &Self::Item) -> Result<bool, RxError>,
  {
    DistinctUntilChanged { source: self, comparer: Fallible(equals) }
  }

  /// Combine the latest values of `self` and `other` with `selector` every
  /// time either side emits, once both have emitted.
  fn combine_latest<Other, F, Out>(self, other: Other, selector: F) -> CombineLatest<Self, Other, Infallible<F>>
  where
    Other: Observable,
    F: FnMut(Self::Item, Other::Item) -> Out,
  {
    CombineLatest { a: self, b: other, combiner: Infallible(selector) }
  }

  fn try_combine_latest<Other, F, Out>(self, other: Other, selector: F) -> CombineLatest<Self, Other, Fallible<F>>
  where
    Other: Observable,
    F: FnMut(Self::Item, Other::Item) -> Result<Out, RxError>,
  {
    CombineLatest { a: self, b: other, combiner: Fallible(selector) }
  }

  /// Forward values until `notifier` emits a value (then complete) or fails
  /// (then fail with its error). A plain completion of `notifier` is ignored.
  fn take_until<N: Observable>(self, notifier: N) -> TakeUntil<Self, N> {
    TakeUntil { source: self, notifier }
  }

  /// Forward a value only when at least `interval` passed since the last
  /// forwarded one. The first value always passes.
  fn throttle<S: Scheduler>(self, interval: Duration, scheduler: S) -> Throttle<Self, S> {
    Throttle { source: self, interval, scheduler }
  }

  /// Shift every value and the completion by `delay`. Errors are not delayed.
  fn delay<S: Scheduler>(self, delay: Duration, scheduler: S) -> Delay<Self, S> {
    Delay { source: self, delay, scheduler }
  }

  /// Collect values into a `Vec` emitted every `window`. Empty windows emit
  /// nothing; completion flushes what is left.
  fn buffer<S: Scheduler>(self, window: Duration, scheduler: S) -> Buffer<Self, S, Self::Item>
  where
    Self::Item: 'static,
  {
    let pool = ObjectPool::new(DEFAULT_BUFFER_POOL_SIZE, Vec::new).with_reset(Vec::clear);
    self.buffer_with_pool(window, scheduler, pool)
  }

  /// Like [`buffer`](ObservableExt::buffer), renting the working list from
  /// `pool`.
  fn buffer_with_pool<S: Scheduler>(
    self,
    window: Duration,
    scheduler: S,
    pool: ObjectPool<Vec<Self::Item>>,
  ) -> Buffer<Self, S, Self::Item> {
    Buffer { source: self, window, scheduler, pool }
  }

  /// Erase the concrete observable type.
  fn box_it(self) -> BoxedObservable<Self::Item>
  where
    Self: Send + 'static,
    Self::Item: 'static,
  {
    BoxedObservable::new(self)
  }

  /// Subscribe with a `next` handler. Errors are logged through `tracing`,
  /// completion is ignored.
  fn subscribe<N>(self, next: N) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, log_unhandled_error, ignore_complete))
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(RxError) + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, error, ignore_complete))
  }

  fn subscribe_complete<N, C>(self, next: N, complete: C) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, log_unhandled_error, complete))
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(RxError) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, error, complete))
  }
}

impl<T: Observable> ObservableExt for T {}
