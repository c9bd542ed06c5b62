use std::marker::PhantomData;

use crate::{error::RxError, observable::Observable, observer::Observer, subscription::Subscription};

/// Creates an observable that produces no values and completes immediately.
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::empty().subscribe(|v: i32| println!("{v}"));
/// // Result: nothing printed
/// ```
pub fn empty<Item>() -> Empty<Item> { Empty(PhantomData) }

/// Creates an observable that emits no items, just terminates with `err`.
pub fn throw_err<Item>(err: impl Into<RxError>) -> ThrowErr<Item> { ThrowErr(err.into(), PhantomData) }

pub struct Empty<Item>(PhantomData<fn() -> Item>);

impl<Item> Clone for Empty<Item> {
  fn clone(&self) -> Self { Empty(PhantomData) }
}

impl<Item> Observable for Empty<Item> {
  type Item = Item;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    observer.complete();
    Subscription::empty()
  }
}

pub struct ThrowErr<Item>(RxError, PhantomData<fn() -> Item>);

impl<Item> Clone for ThrowErr<Item> {
  fn clone(&self) -> Self { ThrowErr(self.0.clone(), PhantomData) }
}

impl<Item> Observable for ThrowErr<Item> {
  type Item = Item;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Item> + Send + 'static,
  {
    observer.error(self.0);
    Subscription::empty()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn empty_only_completes() {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, c) = (log.clone(), log.clone());
    observable::empty::<i32>().subscribe_complete(move |v| n.lock().push(v), move || c.lock().push(-1));
    assert_eq!(*log.lock(), vec![-1]);
  }

  #[test]
  fn throw_err_only_errors() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    observable::throw_err::<i32>("boom").subscribe_all(
      |_| panic!("no value expected"),
      move |e| c_errors.lock().push(e.to_string()),
      || panic!("no completion expected"),
    );
    assert_eq!(*errors.lock(), vec!["boom"]);
  }
}
