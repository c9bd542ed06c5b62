//! Bounded object pool
//!
//! [`ObjectPool`] keeps idle instances around for reuse. `buffer` rents its
//! working list from one so that a high frequency window does not allocate a
//! new `Vec` for every subscription.

use std::sync::Arc;

use parking_lot::Mutex;

type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;
type Reset<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// A thread-safe pool holding at most `max_size` idle instances.
///
/// Renting from an empty pool constructs a fresh instance with the factory.
/// Instances returned while the pool is full are dropped. Clones share the
/// same idle set.
pub struct ObjectPool<T> {
  idle: Arc<Mutex<Vec<T>>>,
  max_size: usize,
  factory: Factory<T>,
  reset: Option<Reset<T>>,
}

impl<T> Clone for ObjectPool<T> {
  fn clone(&self) -> Self {
    Self {
      idle: self.idle.clone(),
      max_size: self.max_size,
      factory: self.factory.clone(),
      reset: self.reset.clone(),
    }
  }
}

impl<T> ObjectPool<T> {
  pub fn new(max_size: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
    Self {
      idle: Arc::new(Mutex::new(Vec::with_capacity(max_size))),
      max_size,
      factory: Arc::new(factory),
      reset: None,
    }
  }

  /// Run `reset` on every instance handed back before it is kept for reuse.
  pub fn with_reset(mut self, reset: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
    self.reset = Some(Arc::new(reset));
    self
  }

  /// Take an idle instance, or build a new one when none is left.
  pub fn rent(&self) -> T {
    let idle = self.idle.lock().pop();
    idle.unwrap_or_else(|| (self.factory)())
  }

  /// Hand an instance back. Dropped when the pool is already full.
  pub fn put_back(&self, mut item: T) {
    if let Some(reset) = &self.reset {
      reset(&mut item);
    }
    let mut idle = self.idle.lock();
    if idle.len() < self.max_size {
      idle.push(item);
    } else {
      drop(idle);
      tracing::trace!(max_size = self.max_size, "object pool full, discarding instance");
    }
  }

  /// Number of idle instances.
  pub fn len(&self) -> usize { self.idle.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn max_size(&self) -> usize { self.max_size }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ObjectPool").field("idle", &self.len()).field("max_size", &self.max_size).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  fn counting_pool(max_size: usize) -> (ObjectPool<Vec<i32>>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let c_created = created.clone();
    let pool = ObjectPool::new(max_size, move || {
      c_created.fetch_add(1, Ordering::SeqCst);
      Vec::new()
    })
    .with_reset(Vec::clear);
    (pool, created)
  }

  #[test]
  fn renting_beyond_returned_builds_fresh() {
    let (pool, created) = counting_pool(4);
    let a = pool.rent();
    let b = pool.rent();
    assert_eq!(created.load(Ordering::SeqCst), 2);

    pool.put_back(a);
    let _c = pool.rent();
    assert_eq!(created.load(Ordering::SeqCst), 2);
    let _d = pool.rent();
    assert_eq!(created.load(Ordering::SeqCst), 3);
    drop(b);
  }

  #[test]
  fn pool_size_is_capped() {
    let (pool, _) = counting_pool(2);
    for _ in 0..5 {
      pool.put_back(vec![1]);
    }
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.max_size(), 2);
  }

  #[test]
  fn reset_runs_before_reuse() {
    let (pool, _) = counting_pool(2);
    pool.put_back(vec![1, 2, 3]);
    assert!(pool.rent().is_empty());
  }

  #[test]
  fn concurrent_rent_and_return() {
    let (pool, _) = counting_pool(8);
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let pool = pool.clone();
        std::thread::spawn(move || {
          for _ in 0..1000 {
            let mut v = pool.rent();
            v.push(1);
            pool.put_back(v);
          }
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }
    assert!(pool.len() <= 8);
    assert!(!pool.is_empty());
  }
}
