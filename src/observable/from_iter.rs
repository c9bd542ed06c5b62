use std::iter::{once, Once};

use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Creates an observable that produces values from an iterator.
///
/// Emits everything synchronously inside `subscribe`, then completes. Stops
/// early once the observer reports closed, e.g. behind a satisfied `take`.
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from_iter(0..10).subscribe(|v| println!("{v}"));
/// observable::from_iter(vec![0, 1, 2, 3]).subscribe(|v| println!("{v}"));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> FromIter<Iter::IntoIter>
where
  Iter: IntoIterator,
{
  FromIter(iter.into_iter())
}

/// Creates an observable emitting a single value, then completing.
pub fn of<Item>(value: Item) -> FromIter<Once<Item>> { FromIter(once(value)) }

#[derive(Clone)]
pub struct FromIter<Iter>(Iter);

impl<Iter: Iterator> Observable for FromIter<Iter> {
  type Item = Iter::Item;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Self::Item> + Send + 'static,
  {
    let mut iter = self.0;
    while !observer.is_closed() {
      match iter.next() {
        Some(value) => observer.next(value),
        None => {
          observer.complete();
          break;
        }
      }
    }
    Subscription::empty()
  }
}
