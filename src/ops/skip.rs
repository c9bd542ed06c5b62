//! Skip operator implementation
//!
//! This module contains the Skip operator, which ignores the first `count`
//! values emitted by the source Observable, then emits the rest.

use crate::{error::RxError, observable::Observable, observer::Observer, subscription::Subscription};

/// Skip operator: Ignores the first `count` values from the source observable
///
/// If the source completes before emitting `count` values, `skip` completes
/// without emitting any values.
///
/// ```
/// use rxlite::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let result = Arc::new(Mutex::new(Vec::new()));
/// let c_result = result.clone();
/// observable::from_iter([1, 2, 3, 4, 5])
///   .skip(2)
///   .subscribe(move |v| c_result.lock().unwrap().push(v));
/// assert_eq!(*result.lock().unwrap(), vec![3, 4, 5]);
/// ```
#[derive(Clone)]
pub struct Skip<S> {
  pub source: S,
  pub count: usize,
}

pub struct SkipObserver<O> {
  observer: Option<O>,
  remaining: usize,
}

impl<S: Observable> Observable for Skip<S> {
  type Item = S::Item;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item> + Send + 'static,
  {
    let Skip { source, count } = self;
    source.actual_subscribe(SkipObserver { observer: Some(observer), remaining: count })
  }
}

impl<Item, O> Observer<Item> for SkipObserver<O>
where
  O: Observer<Item>,
{
  fn next(&mut self, value: Item) {
    if self.remaining > 0 {
      self.remaining -= 1;
    } else if let Some(observer) = self.observer.as_mut() {
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

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn base_function() {
    let completed = Arc::new(AtomicBool::new(false));
    let next_count = Arc::new(AtomicUsize::new(0));
    let (c_completed, c_next_count) = (completed.clone(), next_count.clone());

    observable::from_iter(0..100).skip(5).subscribe_complete(
      move |_| {
        c_next_count.fetch_add(1, Ordering::SeqCst);
      },
      move || c_completed.store(true, Ordering::SeqCst),
    );

    assert_eq!(next_count.load(Ordering::SeqCst), 95);
    assert!(completed.load(Ordering::SeqCst));
  }

  #[test]
  fn more_than_source() {
    let completed = Arc::new(AtomicBool::new(false));
    let next_count = Arc::new(AtomicUsize::new(0));
    let (c_completed, c_next_count) = (completed.clone(), next_count.clone());

    observable::from_iter(0..100).skip(101).subscribe_complete(
      move |_| {
        c_next_count.fetch_add(1, Ordering::SeqCst);
      },
      move || c_completed.store(true, Ordering::SeqCst),
    );

    assert_eq!(next_count.load(Ordering::SeqCst), 0);
    assert!(completed.load(Ordering::SeqCst));
  }

  #[test]
  fn zero_count_forwards_everything() {
    let result = Arc::new(Mutex::new(Vec::new()));
    let c_result = result.clone();
    observable::from_iter([1, 2, 3]).skip(0).subscribe(move |v| c_result.lock().push(v));
    assert_eq!(*result.lock(), vec![1, 2, 3]);
  }

  #[test]
  fn chaining() {
    let result = Arc::new(Mutex::new(Vec::new()));
    let c_result = result.clone();
    observable::from_iter(0..100).skip(5).skip(5).subscribe(move |v| c_result.lock().push(v));
    assert_eq!(result.lock().len(), 90);
  }

  #[test]
  fn error_propagation() {
    let error = Arc::new(Mutex::new(String::new()));
    let c_error = error.clone();
    observable::throw_err::<i32>("test error")
      .skip(5)
      .subscribe_err(|_| {}, move |e| *c_error.lock() = e.to_string());
    assert_eq!(*error.lock(), "test error");
  }
}
