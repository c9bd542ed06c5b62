use std::sync::Arc;

use smallvec::SmallVec;

use crate::{error::RxError, observer::SharedObserver};

pub(crate) type ObserverRef<Item> = Arc<SharedObserver<Item>>;

/// A stable copy of the observer list, delivered to outside the list lock.
pub(crate) type Snapshot<Item> = SmallVec<[ObserverRef<Item>; 2]>;

/// Observer list with ID-based removal, shared by `Subject` and
/// `ReactiveProperty`.
///
/// Entries keep subscription order, so a snapshot broadcasts in the order the
/// observers subscribed.
pub(crate) struct Subscribers<Item> {
  next_id: usize,
  entries: Vec<(usize, ObserverRef<Item>)>,
}

impl<Item> Default for Subscribers<Item> {
  fn default() -> Self { Self { next_id: 0, entries: Vec::new() } }
}

impl<Item> Subscribers<Item> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: ObserverRef<Item>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, observer));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<ObserverRef<Item>> {
    let idx = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
    Some(self.entries.remove(idx).1)
  }

  pub(crate) fn len(&self) -> usize { self.entries.len() }

  pub(crate) fn snapshot(&self) -> Snapshot<Item> {
    self.entries.iter().map(|(_, observer)| observer.clone()).collect()
  }

  /// Empty the list, returning what it held.
  pub(crate) fn drain(&mut self) -> Snapshot<Item> {
    self.entries.drain(..).map(|(_, observer)| observer).collect()
  }
}

/// Deliver `value` to every observer in `snapshot`. The last one receives the
/// moved value instead of a clone.
pub(crate) fn broadcast_value<Item: Clone>(snapshot: &[ObserverRef<Item>], value: Item) {
  if let Some((last, rest)) = snapshot.split_last() {
    for observer in rest {
      observer.next(value.clone());
    }
    last.next(value);
  }
}

pub(crate) fn broadcast_error<Item>(snapshot: &[ObserverRef<Item>], err: RxError) {
  for observer in snapshot {
    observer.error(err.clone());
  }
}

pub(crate) fn broadcast_complete<Item>(snapshot: &[ObserverRef<Item>]) {
  for observer in snapshot {
    observer.complete();
  }
}
