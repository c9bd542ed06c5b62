//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Core traits and sources
pub use crate::observable::{self, BoxedObservable, Emitter, Observable, ObservableExt};
// Observer
pub use crate::observer::{BoxedObserver, FnObserver, Observer};
// Subscription
pub use crate::subscription::{CompositeSubscription, Subscription, SubscriptionGuard, SubscriptionLike};
// Subjects
pub use crate::subject::{ReactiveProperty, Subject};
// Schedulers
pub use crate::scheduler::{Duration, Instant, ManualScheduler, Scheduler, TaskHandle};
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Errors and utilities
pub use crate::{
  error::{RxError, RxException},
  pool::ObjectPool,
};
