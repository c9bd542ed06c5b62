use crate::{
  error::RxError,
  function::Predicate,
  observable::Observable,
  observer::Observer,
  ops::callback_failed,
  subscription::{CompositeSubscription, Subscription, SubscriptionLike},
};

/// Filter operator: forwards only the values that pass a predicate.
///
/// A failing predicate (`try_filter`) ends the stream with an `error` naming
/// `filter` and releases the source.
#[derive(Clone)]
pub struct Filter<S, F> {
  pub source: S,
  pub predicate: F,
}

pub struct FilterObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  upstream: CompositeSubscription,
}

impl<S, F> Observable for Filter<S, F>
where
  S: Observable,
  F: Predicate<S::Item> + Send + 'static,
{
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let upstream = CompositeSubscription::new();
    let observer = FilterObserver { observer: Some(observer), predicate: self.predicate, upstream: upstream.clone() };
    upstream.add(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

impl<Item, O, F> Observer<Item> for FilterObserver<O, F>
where
  O: Observer<Item>,
  F: Predicate<Item>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    match self.predicate.test(&value) {
      Ok(true) => observer.next(value),
      Ok(false) => {}
      Err(err) => {
        if let Some(mut observer) = self.observer.take() {
          observer.error(callback_failed("filter", err));
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

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn keeps_matching_values() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    observable::from_iter(0..10)
      .filter(|v| v % 3 == 0)
      .subscribe(move |v| c_seen.lock().push(v));
    assert_eq!(*seen.lock(), vec![0, 3, 6, 9]);
  }

  #[test]
  fn passes_completion() {
    let completed = Arc::new(AtomicUsize::new(0));
    let c_completed = completed.clone();
    observable::from_iter(0..3).filter(|_| false).subscribe_complete(
      |_| panic!("every value is filtered"),
      move || {
        c_completed.fetch_add(1, Ordering::SeqCst);
      },
    );
    assert_eq!(completed.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn failing_predicate_becomes_error() {
    let subject = Subject::<i32>::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e) = (log.clone(), log.clone());
    subject
      .clone()
      .try_filter(|v| if *v >= 0 { Ok(v % 2 == 0) } else { Err(RxError::msg("negative")) })
      .subscribe_err(
        move |v| n.lock().push(format!("next {v}")),
        move |err: RxError| e.lock().push(format!("{} {}", err.operator_name().unwrap_or("-"), err.root_cause())),
      );

    subject.next(2);
    subject.next(3);
    subject.next(-1);
    subject.next(4);

    assert_eq!(*log.lock(), vec!["next 2", "filter negative"]);
    assert_eq!(subject.observer_count(), 0);
  }
}
