//! Error types carried by `error` notifications
//!
//! Every stream in rxlite fails with the same error type, [`RxError`]. It is
//! cheap to clone so a [`Subject`](crate::subject::Subject) can hand the same
//! failure to all of its observers.
//!
//! Operators that run user code wrap callback failures in an
//! [`RxException`], which records the operator name and optional diagnostic
//! context while keeping the original failure reachable through
//! [`std::error::Error::source`].

use std::{error::Error as StdError, fmt::Debug, sync::Arc};

/// The error delivered through `Observer::error`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RxError {
  /// A plain message.
  #[error("{0}")]
  Message(Arc<str>),

  /// An error produced by user code.
  #[error(transparent)]
  User(Arc<dyn StdError + Send + Sync + 'static>),

  /// A failure annotated by the operator it happened in.
  #[error(transparent)]
  Operator(Arc<RxException>),
}

impl RxError {
  /// Create an error from a message.
  pub fn msg(message: impl Into<String>) -> Self { Self::Message(Arc::from(message.into())) }

  /// Wrap an arbitrary error value.
  pub fn user(error: impl StdError + Send + Sync + 'static) -> Self { Self::User(Arc::new(error)) }

  /// Wrap `cause` with the name of the operator it went through.
  pub fn operator(operator: &'static str, cause: RxError) -> Self {
    Self::Operator(Arc::new(RxException::new(operator, cause)))
  }

  /// The operator that annotated this error, if any.
  pub fn operator_name(&self) -> Option<&'static str> {
    match self {
      Self::Operator(exception) => Some(exception.operator()),
      _ => None,
    }
  }

  /// The exception wrapper, if this error carries one.
  pub fn as_exception(&self) -> Option<&RxException> {
    match self {
      Self::Operator(exception) => Some(exception),
      _ => None,
    }
  }

  /// Walk through nested operator annotations down to the original failure.
  pub fn root_cause(&self) -> &RxError {
    let mut current = self;
    while let Self::Operator(exception) = current {
      current = exception.inner();
    }
    current
  }
}

impl From<&str> for RxError {
  fn from(message: &str) -> Self { Self::msg(message) }
}

impl From<String> for RxError {
  fn from(message: String) -> Self { Self::msg(message) }
}

impl From<RxException> for RxError {
  fn from(exception: RxException) -> Self { Self::Operator(Arc::new(exception)) }
}

/// Diagnostic wrapper recording where a failure happened.
///
/// Built with [`RxException::new`] and refined with
/// [`with_last_value`](RxException::with_last_value) and
/// [`with_context`](RxException::with_context).
///
/// ```
/// use rxlite::prelude::*;
///
/// let err: RxError = RxException::new("map", RxError::msg("bad input"))
///   .with_last_value(&42)
///   .with_context("parsing sensor frame")
///   .into();
///
/// assert_eq!(err.operator_name(), Some("map"));
/// assert_eq!(err.root_cause().to_string(), "bad input");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("`{operator}` failed{}: {cause}", describe(.last_value, .context))]
pub struct RxException {
  operator: &'static str,
  last_value: Option<String>,
  context: Option<String>,
  #[source]
  cause: RxError,
}

impl RxException {
  pub fn new(operator: &'static str, cause: RxError) -> Self {
    Self { operator, last_value: None, context: None, cause }
  }

  /// Record the value that was being processed when the failure happened.
  pub fn with_last_value(mut self, value: &impl Debug) -> Self {
    self.last_value = Some(format!("{value:?}"));
    self
  }

  /// Attach free-form context.
  pub fn with_context(mut self, context: impl Into<String>) -> Self {
    self.context = Some(context.into());
    self
  }

  pub fn operator(&self) -> &'static str { self.operator }

  pub fn last_value(&self) -> Option<&str> { self.last_value.as_deref() }

  pub fn context(&self) -> Option<&str> { self.context.as_deref() }

  /// The failure this exception wraps.
  pub fn inner(&self) -> &RxError { &self.cause }
}

fn describe(last_value: &Option<String>, context: &Option<String>) -> String {
  match (last_value, context) {
    (Some(value), Some(context)) => format!(" on {value} ({context})"),
    (Some(value), None) => format!(" on {value}"),
    (None, Some(context)) => format!(" ({context})"),
    (None, None) => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("sensor offline")]
  struct SensorOffline;

  #[test]
  fn message_display() {
    assert_eq!(RxError::msg("boom").to_string(), "boom");
    assert_eq!(RxError::from("boom").to_string(), "boom");
  }

  #[test]
  fn user_error_keeps_display() {
    let err = RxError::user(SensorOffline);
    assert_eq!(err.to_string(), "sensor offline");
    assert!(err.operator_name().is_none());
  }

  #[test]
  fn exception_display_includes_details() {
    let exception = RxException::new("filter", RxError::msg("nope"))
      .with_last_value(&"frame-7")
      .with_context("tick 12");
    assert_eq!(exception.to_string(), "`filter` failed on \"frame-7\" (tick 12): nope");
    assert_eq!(exception.last_value(), Some("\"frame-7\""));
    assert_eq!(exception.context(), Some("tick 12"));
  }

  #[test]
  fn source_chain_reaches_cause() {
    let err = RxError::operator("map", RxError::user(SensorOffline));
    let source = err.source().expect("operator error has a source");
    assert_eq!(source.to_string(), "sensor offline");
  }

  #[test]
  fn root_cause_unwraps_nested_operators() {
    let err = RxError::operator("map", RxError::operator("filter", RxError::msg("inner")));
    assert_eq!(err.operator_name(), Some("map"));
    assert_eq!(err.root_cause().to_string(), "inner");
    assert_eq!(err.as_exception().map(|e| e.inner().operator_name()), Some(Some("filter")));
  }
}
