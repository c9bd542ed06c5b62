//! # rxlite: push-based reactive streams
//!
//! A small, thread-safe implementation of [Reactive Extensions](http://reactivex.io/):
//! hot [`Subject`]s and [`ReactiveProperty`]s, cold sources, a fluent operator
//! surface and time operators driven by an injected [`Scheduler`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let subject = Subject::new();
//! let subscription = subject
//!   .clone()
//!   .filter(|v: &i32| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("Value: {v}"));
//!
//! subject.next(1);
//! subject.next(2); // prints "Value: 4"
//! subscription.unsubscribe();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Anything that can be subscribed to |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to release an active subscription |
//! | [`Scheduler`] | Clock and timer used by `throttle`, `delay` and `buffer` |
//!
//! Delivery is synchronous on the thread that emits. Only the time operators
//! defer work, and only through their scheduler.
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** + **`timer`** (default): [`ThreadPoolScheduler`]
//!   on a `futures` thread pool with `futures-time` timers.
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime.
//!
//! [`Subject`]: subject::Subject
//! [`ReactiveProperty`]: subject::ReactiveProperty
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler

pub mod error;
pub mod function;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod pool;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
