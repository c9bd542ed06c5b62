//! Operators
//!
//! Each operator is an [`Observable`](crate::observable::Observable) wrapping
//! its source plus an observer decorator applying the transformation. They are
//! normally built through [`ObservableExt`](crate::observable::ObservableExt).
//!
//! Every decorator keeps its downstream observer in an `Option` that is taken
//! on the terminal notification, so nothing reaches the downstream after it.
//! Operators fed from several places (a second source, scheduler tasks) keep it
//! in a shared slot instead, which also lets their subscribers push back into
//! a source from inside a callback.
//! Operators that must release their source early (`take`, failing user
//! callbacks, ...) subscribe through a [`CompositeSubscription`] created before
//! the source subscription exists, so they can release it even while the
//! source is still emitting synchronously from inside `subscribe`.
//!
//! [`CompositeSubscription`]: crate::subscription::CompositeSubscription

pub mod buffer;
pub mod combine_latest;
pub mod delay;
pub mod distinct_until_changed;
pub mod filter;
pub mod map;
pub mod skip;
pub mod take;
pub mod take_until;
pub mod throttle;

use crate::error::RxError;

/// Wrap the failure of a user callback with the operator it ran in.
pub(crate) fn callback_failed(operator: &'static str, err: RxError) -> RxError {
  tracing::debug!(operator, error = %err, "user callback failed");
  RxError::operator(operator, err)
}
