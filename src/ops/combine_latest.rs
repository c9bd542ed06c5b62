use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::RxError,
  function::Combiner,
  observable::Observable,
  observer::{Observer, SharedObserver},
  ops::callback_failed,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// CombineLatest operator, see
/// [`ObservableExt::combine_latest`](crate::observable::ObservableExt::combine_latest).
///
/// Nothing is emitted until both sources produced a value. After that every
/// value from either side emits `combiner(latest_a, latest_b)`.
///
/// A source completing without ever producing a value completes the
/// combination at once, since no result can follow. Otherwise the combination
/// completes when both sources completed. An error from either source or from
/// the combiner is delivered once and releases both sources.
#[derive(Clone)]
pub struct CombineLatest<A, B, F> {
  pub a: A,
  pub b: B,
  pub combiner: F,
}

enum CombineItem<A, B> {
  ItemA(A),
  ItemB(B),
}

#[derive(Clone, Copy)]
enum Side {
  A,
  B,
}

struct Latest<A, B, F> {
  a: Option<A>,
  b: Option<B>,
  a_completed: bool,
  b_completed: bool,
  combiner: F,
}

/// The latest values are updated and combined under `latest`; the result is
/// delivered after that lock is released, so the downstream may push into
/// either source again.
struct CombineLatestState<O, A, B, F: Combiner<A, B>> {
  latest: Mutex<Latest<A, B, F>>,
  observer: SharedObserver<F::Output, O>,
}

/// Both side observers route into this one.
pub struct CombineLatestObserver<O, A, B, F: Combiner<A, B>> {
  state: Arc<CombineLatestState<O, A, B, F>>,
  upstream: CompositeSubscription,
}

impl<O, A, B, F: Combiner<A, B>> Clone for CombineLatestObserver<O, A, B, F> {
  fn clone(&self) -> Self { Self { state: self.state.clone(), upstream: self.upstream.clone() } }
}

impl<O, A, B, F> CombineLatestObserver<O, A, B, F>
where
  O: Observer<F::Output>,
  A: Clone,
  B: Clone,
  F: Combiner<A, B>,
{
  fn next(&self, value: CombineItem<A, B>) {
    if self.is_closed() {
      return;
    }
    let combined = {
      let mut guard = self.state.latest.lock();
      let latest = &mut *guard;
      match value {
        CombineItem::ItemA(v) => latest.a = Some(v),
        CombineItem::ItemB(v) => latest.b = Some(v),
      }
      let (Some(a), Some(b)) = (&latest.a, &latest.b) else {
        return;
      };
      latest.combiner.combine(a.clone(), b.clone())
    };
    match combined {
      Ok(combined) => self.state.observer.next(combined),
      Err(err) => {
        self.state.observer.error(callback_failed("combine_latest", err));
        self.upstream.unsubscribe();
      }
    }
  }

  fn error(&self, err: RxError) {
    self.state.observer.error(err);
    self.upstream.unsubscribe();
  }

  fn complete(&self, side: Side) {
    let done = {
      let mut latest = self.state.latest.lock();
      let had_value = match side {
        Side::A => {
          latest.a_completed = true;
          latest.a.is_some()
        }
        Side::B => {
          latest.b_completed = true;
          latest.b.is_some()
        }
      };
      !had_value || (latest.a_completed && latest.b_completed)
    };
    if done {
      self.state.observer.complete();
      self.upstream.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.upstream.is_closed() || self.state.observer.is_closed() }
}

pub struct AObserver<O, A, B, F: Combiner<A, B>>(CombineLatestObserver<O, A, B, F>);

pub struct BObserver<O, A, B, F: Combiner<A, B>>(CombineLatestObserver<O, A, B, F>);

impl<O, A, B, F> Observer<A> for AObserver<O, A, B, F>
where
  O: Observer<F::Output>,
  A: Clone,
  B: Clone,
  F: Combiner<A, B>,
{
  #[inline]
  fn next(&mut self, value: A) { self.0.next(CombineItem::ItemA(value)) }

  #[inline]
  fn error(&mut self, err: RxError) { self.0.error(err) }

  #[inline]
  fn complete(&mut self) { self.0.complete(Side::A) }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<O, A, B, F> Observer<B> for BObserver<O, A, B, F>
where
  O: Observer<F::Output>,
  A: Clone,
  B: Clone,
  F: Combiner<A, B>,
{
  #[inline]
  fn next(&mut self, value: B) { self.0.next(CombineItem::ItemB(value)) }

  #[inline]
  fn error(&mut self, err: RxError) { self.0.error(err) }

  #[inline]
  fn complete(&mut self) { self.0.complete(Side::B) }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<SA, SB, F> Observable for CombineLatest<SA, SB, F>
where
  SA: Observable,
  SB: Observable,
  SA::Item: Clone + Send + 'static,
  SB::Item: Clone + Send + 'static,
  F: Combiner<SA::Item, SB::Item> + Send + 'static,
  F::Output: Send + 'static,
{
  type Item = F::Output;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<F::Output> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let combine = CombineLatestObserver {
      state: Arc::new(CombineLatestState {
        latest: Mutex::new(Latest { a: None, b: None, a_completed: false, b_completed: false, combiner: self.combiner }),
        observer: SharedObserver::new(observer),
      }),
      upstream: upstream.clone(),
    };

    upstream.add(self.a.actual_subscribe(AObserver(combine.clone())));
    // The first source may already have ended the combination.
    if !upstream.is_closed() {
      upstream.add(self.b.actual_subscribe(BObserver(combine)));
    }
    upstream.into()
  }
}
