//! User callback adapters
//!
//! Every operator that runs user code has two entry points: one taking a plain
//! closure (`map`, `filter`, ...) and one taking a closure that returns a
//! `Result` (`try_map`, `try_filter`, ...). Both are funneled through the
//! traits in this module, wrapped in [`Infallible`] or [`Fallible`], so the
//! operator itself only ever sees a fallible call and handles failure in one
//! place.

use crate::error::RxError;

/// Wraps a closure that cannot fail.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Infallible<F>(pub F);

/// Wraps a closure that returns `Result<_, RxError>`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Fallible<F>(pub F);

/// One-argument callback, used by `map`.
pub trait Callback<Arg> {
  type Output;
  fn call(&mut self, arg: Arg) -> Result<Self::Output, RxError>;
}

impl<F, Arg, Out> Callback<Arg> for Infallible<F>
where
  F: FnMut(Arg) -> Out,
{
  type Output = Out;
  #[inline]
  fn call(&mut self, arg: Arg) -> Result<Out, RxError> { Ok((self.0)(arg)) }
}

impl<F, Arg, Out> Callback<Arg> for Fallible<F>
where
  F: FnMut(Arg) -> Result<Out, RxError>,
{
  type Output = Out;
  #[inline]
  fn call(&mut self, arg: Arg) -> Result<Out, RxError> { (self.0)(arg) }
}

/// Predicate over a borrowed item, used by `filter`.
pub trait Predicate<Item> {
  fn test(&mut self, item: &Item) -> Result<bool, RxError>;
}

impl<F, Item> Predicate<Item> for Infallible<F>
where
  F: FnMut(&Item) -> bool,
{
  #[inline]
  fn test(&mut self, item: &Item) -> Result<bool, RxError> { Ok((self.0)(item)) }
}

impl<F, Item> Predicate<Item> for Fallible<F>
where
  F: FnMut(&Item) -> Result<bool, RxError>,
{
  #[inline]
  fn test(&mut self, item: &Item) -> Result<bool, RxError> { (self.0)(item) }
}

/// Equality test between the previous and the current item, used by
/// `distinct_until_changed`. Returns `true` when the two are considered equal.
pub trait Comparer<Item> {
  fn equals(&mut self, previous: &Item, current: &Item) -> Result<bool, RxError>;
}

/// Compares with `PartialEq`.
#[derive(Clone, Copy, Default)]
pub struct EqComparer;

impl<Item: PartialEq> Comparer<Item> for EqComparer {
  #[inline]
  fn equals(&mut self, previous: &Item, current: &Item) -> Result<bool, RxError> {
    Ok(previous == current)
  }
}

impl<F, Item> Comparer<Item> for Infallible<F>
where
  F: FnMut(&Item, &Item) -> bool,
{
  #[inline]
  fn equals(&mut self, previous: &Item, current: &Item) -> Result<bool, RxError> {
    Ok((self.0)(previous, current))
  }
}

impl<F, Item> Comparer<Item> for Fallible<F>
where
  F: FnMut(&Item, &Item) -> Result<bool, RxError>,
{
  #[inline]
  fn equals(&mut self, previous: &Item, current: &Item) -> Result<bool, RxError> {
    (self.0)(previous, current)
  }
}

/// Two-argument result selector, used by `combine_latest`.
pub trait Combiner<A, B> {
  type Output;
  fn combine(&mut self, a: A, b: B) -> Result<Self::Output, RxError>;
}

impl<F, A, B, Out> Combiner<A, B> for Infallible<F>
where
  F: FnMut(A, B) -> Out,
{
  type Output = Out;
  #[inline]
  fn combine(&mut self, a: A, b: B) -> Result<Out, RxError> { Ok((self.0)(a, b)) }
}

impl<F, A, B, Out> Combiner<A, B> for Fallible<F>
where
  F: FnMut(A, B) -> Result<Out, RxError>,
{
  type Output = Out;
  #[inline]
  fn combine(&mut self, a: A, b: B) -> Result<Out, RxError> { (self.0)(a, b) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn infallible_callback_always_ok() {
    let mut double = Infallible(|v: i32| v * 2);
    assert_eq!(double.call(4).ok(), Some(8));
  }

  #[test]
  fn fallible_callback_passes_error_through() {
    let mut parse = Fallible(|v: &str| v.parse::<i32>().map_err(RxError::user));
    assert_eq!(parse.call("12").ok(), Some(12));
    assert!(parse.call("twelve").is_err());
  }

  #[test]
  fn eq_comparer_uses_partial_eq() {
    let mut cmp = EqComparer;
    assert_eq!(Comparer::<i32>::equals(&mut cmp, &1, &1).ok(), Some(true));
    assert_eq!(Comparer::<i32>::equals(&mut cmp, &1, &2).ok(), Some(false));
  }
}
