//! Subscription handles
//!
//! A [`Subscription`] is returned by every `subscribe` call. Releasing it
//! detaches the observer from its source and frees whatever the chain holds
//! for it: inner subscriptions, scheduled timers, pooled buffers.
//! [`CompositeSubscription`] aggregates several of them behind one handle.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;
use smallvec::SmallVec;

/// Something that can be released.
///
/// `unsubscribe` must be idempotent: releasing twice has no additional effect.
pub trait SubscriptionLike {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before `complete` is called).
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

/// Opaque, cloneable handle to an active observer-to-source binding.
///
/// Dropping a `Subscription` does *not* release it; call
/// [`unsubscribe`](Subscription::unsubscribe), or turn it into a
/// [`SubscriptionGuard`] with
/// [`unsubscribe_when_dropped`](Subscription::unsubscribe_when_dropped).
#[derive(Clone)]
pub struct Subscription(Arc<dyn SubscriptionLike + Send + Sync>);

impl Subscription {
  /// A subscription that runs `teardown` exactly once when released.
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self(Arc::new(Teardown { closed: AtomicBool::new(false), action: Mutex::new(Some(Box::new(teardown))) }))
  }

  /// A subscription with nothing to release. It reports itself as closed.
  pub fn empty() -> Self { Self(Arc::new(Released)) }

  /// Wrap any [`SubscriptionLike`] value.
  pub fn from_like(inner: impl SubscriptionLike + Send + Sync + 'static) -> Self { Self(Arc::new(inner)) }

  #[inline]
  pub fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }

  /// Whether both handles refer to the same subscription.
  pub fn ptr_eq(&self, other: &Subscription) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard::new(self) }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("is_closed", &self.is_closed()).finish()
  }
}

struct Teardown {
  closed: AtomicBool,
  action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionLike for Teardown {
  fn unsubscribe(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let action = self.action.lock().take();
    if let Some(action) = action {
      action();
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

struct Released;

impl SubscriptionLike for Released {
  fn unsubscribe(&self) {}

  fn is_closed(&self) -> bool { true }
}

// ==================== CompositeSubscription ====================

/// A set of subscriptions released together.
///
/// Safe to share between threads. Adding to an already released composite
/// releases the added subscription immediately. Children are released outside
/// the internal lock, so a child's teardown may touch the composite again.
#[derive(Clone, Default)]
pub struct CompositeSubscription(Arc<Mutex<Inner>>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[Subscription; 2]>,
}

impl CompositeSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn add(&self, subscription: impl Into<Subscription>) {
    let subscription = subscription.into();
    {
      let mut inner = self.0.lock();
      if !inner.closed {
        inner.teardown.retain(|s| !s.is_closed());
        inner.teardown.push(subscription);
        return;
      }
    }
    subscription.unsubscribe();
  }

  /// Detach `subscription` and release it. Returns whether it was held.
  pub fn remove(&self, subscription: &Subscription) -> bool {
    let removed = {
      let mut inner = self.0.lock();
      let position = inner.teardown.iter().position(|s| s.ptr_eq(subscription));
      position.map(|idx| inner.teardown.remove(idx))
    };
    match removed {
      Some(removed) => {
        removed.unsubscribe();
        true
      }
      None => false,
    }
  }

  /// Number of children currently held.
  pub fn len(&self) -> usize { self.0.lock().teardown.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl SubscriptionLike for CompositeSubscription {
  fn unsubscribe(&self) {
    let children = {
      let mut inner = self.0.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for child in children {
      child.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}

impl From<CompositeSubscription> for Subscription {
  fn from(composite: CompositeSubscription) -> Self { Subscription(Arc::new(composite)) }
}

impl Debug for CompositeSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.lock();
    f.debug_struct("CompositeSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

// ==================== SubscriptionGuard ====================

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Option<Subscription>);

impl SubscriptionGuard {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: Subscription) -> Self { Self(Some(subscription)) }

  /// Consumes the guard without releasing the subscription.
  pub fn into_inner(mut self) -> Subscription { self.0.take().unwrap_or_else(Subscription::empty) }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe();
    }
  }
}
