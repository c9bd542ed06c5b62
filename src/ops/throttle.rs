use crate::{
  error::RxError,
  observable::Observable,
  observer::Observer,
  scheduler::{Duration, Instant, Scheduler},
  subscription::Subscription,
};

/// Emits a value from the source, then ignores subsequent source values until
/// `interval` passed on the scheduler's clock, then repeats this process.
///
/// Only the leading value of each window is kept; dropped values are never
/// emitted later. Terminal notifications pass straight through.
///
/// ```
/// use rxlite::prelude::*;
///
/// let scheduler = ManualScheduler::new();
/// let subject = Subject::new();
/// subject
///   .clone()
///   .throttle(Duration::from_millis(100), scheduler.clone())
///   .subscribe(|v: i32| println!("{v}"));
///
/// subject.next(1); // emitted
/// subject.next(2); // dropped
/// scheduler.advance_by(Duration::from_millis(100));
/// subject.next(3); // emitted
/// ```
#[derive(Clone)]
pub struct Throttle<S, Sch> {
  pub source: S,
  pub interval: Duration,
  pub scheduler: Sch,
}

pub struct ThrottleObserver<O, Sch> {
  observer: Option<O>,
  interval: Duration,
  scheduler: Sch,
  last_emit: Option<Instant>,
}

impl<S, Sch> Observable for Throttle<S, Sch>
where
  S: Observable,
  Sch: Scheduler + Send + 'static,
{
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let Self { source, interval, scheduler } = self;
    source.actual_subscribe(ThrottleObserver { observer: Some(observer), interval, scheduler, last_emit: None })
  }
}

impl<Item, O, Sch> Observer<Item> for ThrottleObserver<O, Sch>
where
  O: Observer<Item>,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    let now = self.scheduler.now();
    let open = self
      .last_emit
      .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
    if open {
      self.last_emit = Some(now);
      observer.next(value);
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
