/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Per-axis slice requests.
//!
//! A [`Span`] says which part of one axis a caller wants: everything,
//! a single index, a half-open range, a strided range, or an explicit
//! list of indices. Spans are plain values; they are resolved against
//! an axis length only at the moment they are applied.
//!
//! Negative positions count from the end of the axis, but the two
//! ends of a range do not wrap the same way:
//!
//! ```text
//!   axis of length n = 5:   0   1   2   3   4
//!
//!   Span::new(1, 0)       first=1, last=0 → n      ⇒ [1, 2, 3, 4]
//!   Span::new(-3, -1)     first=2, last=4          ⇒ [2, 3]
//!   Span::stepped(0, 0, 2)                         ⇒ [0, 2, 4]
//!   Span::stepped(-1, -1, -1)  (REVERSED)          ⇒ [4, 3, 2, 1, 0]
//!   Span::stepped(3, 0, -1)                        ⇒ [3, 2, 1]
//! ```
//!
//! With a positive step, `first` wraps when negative and `last` wraps
//! when zero or negative, so `0` as `last` means "through the end".
//! With a negative step both ends are shifted by one before wrapping:
//! `first` wraps when `first + 1` is not positive and `last` wraps
//! when `last + 1` is negative. `-1` as `first` therefore names the
//! last element, and `-1` as `last` names the slot before element 0.

use std::ops::Range;
use std::ops::RangeFrom;
use std::ops::RangeFull;
use std::ops::RangeTo;

use serde::Deserialize;
use serde::Serialize;

use crate::config::CheckMode;

/// Errors that arise while resolving or applying a span.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpanError {
    #[error("span step must be nonzero")]
    ZeroStep,

    #[error("index {index} out of bounds for axis of length {len}")]
    IndexOutOfBounds { index: isize, len: usize },

    #[error("span [{first}, {last}) with step {step} is invalid for axis of length {len}")]
    InvalidBounds {
        first: isize,
        last: isize,
        step: isize,
        len: usize,
    },

    #[error("cannot apply a span to a collapsed axis")]
    CollapsedAxis,
}

/// A slice request for one axis.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Span {
    /// Every element of the axis.
    All,
    /// A single element; the axis disappears from the result.
    Scalar(isize),
    /// The half-open range `[first, last)`.
    Simple { first: isize, last: isize },
    /// The arithmetic progression from `first` toward `last` by `step`.
    Regular {
        first: isize,
        last: isize,
        step: isize,
    },
    /// An explicit list of positions, in order. Repeats are allowed.
    Irregular(Vec<isize>),
}

/// Selects an entire axis.
pub const ALL: Span = Span::All;

/// Selects an entire axis in reverse order.
pub const REVERSED: Span = Span::Regular {
    first: -1,
    last: -1,
    step: -1,
};

impl Span {
    /// The whole axis.
    pub fn all() -> Self {
        Span::All
    }

    /// The range `[0, last)`.
    pub fn to(last: isize) -> Self {
        Span::Simple { first: 0, last }
    }

    /// The range `[first, last)`.
    pub fn new(first: isize, last: isize) -> Self {
        Span::Simple { first, last }
    }

    /// Every `step`th position from `first` toward `last`.
    pub fn stepped(first: isize, last: isize, step: isize) -> Self {
        Span::Regular { first, last, step }
    }

    /// An explicit list of positions.
    pub fn list(indices: impl IntoIterator<Item = isize>) -> Self {
        Span::Irregular(indices.into_iter().collect())
    }

    /// Whether applying this span removes the axis.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Span::Scalar(_))
    }

    /// Resolve this span against an axis of length `len`.
    pub fn resolve(&self, len: usize, mode: CheckMode) -> Result<Resolved, SpanError> {
        let n = len as isize;
        match self {
            Span::All => Ok(Resolved::All),
            Span::Scalar(index) => resolve_index(*index, len, mode).map(Resolved::Scalar),
            Span::Simple { first, last } => {
                let f = wrap_negative(*first, n);
                let l = wrap_non_positive(*last, n);
                if mode.is_strict() && !(0 <= f && f <= l && l <= n) {
                    return Err(SpanError::InvalidBounds {
                        first: *first,
                        last: *last,
                        step: 1,
                        len,
                    });
                }
                Ok(Resolved::Simple {
                    first: f,
                    size: (l - f).max(0) as usize,
                })
            }
            Span::Regular { step: 0, .. } => Err(SpanError::ZeroStep),
            Span::Regular { first, last, step } if *step > 0 => {
                let f = wrap_negative(*first, n);
                let l = wrap_non_positive(*last, n);
                if mode.is_strict() && !(0 <= f && f <= l && l <= n) {
                    return Err(SpanError::InvalidBounds {
                        first: *first,
                        last: *last,
                        step: *step,
                        len,
                    });
                }
                let size = if l > f { (l - f - 1) / step + 1 } else { 0 };
                Ok(Resolved::Regular {
                    first: f,
                    size: size as usize,
                    step: *step,
                })
            }
            Span::Regular { first, last, step } => {
                let f = wrap_non_positive(*first + 1, n) - 1;
                let l = wrap_negative(*last + 1, n) - 1;
                if mode.is_strict() && !(-1 <= l && l <= f && f < n) {
                    return Err(SpanError::InvalidBounds {
                        first: *first,
                        last: *last,
                        step: *step,
                        len,
                    });
                }
                let size = if f > l { (f - l - 1) / -step + 1 } else { 0 };
                Ok(Resolved::Regular {
                    first: f,
                    size: size as usize,
                    step: *step,
                })
            }
            Span::Irregular(indices) => indices
                .iter()
                .map(|&index| resolve_index(index, len, mode))
                .collect::<Result<Vec<_>, _>>()
                .map(Resolved::Irregular),
        }
    }
}

/// A span resolved against a known axis length. Positions are
/// non-negative and in range unless resolved in fast mode from an
/// invalid span.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Resolved {
    All,
    Scalar(isize),
    Simple {
        first: isize,
        size: usize,
    },
    Regular {
        first: isize,
        size: usize,
        step: isize,
    },
    Irregular(Vec<isize>),
}

impl Resolved {
    /// Number of positions selected; `None` for a scalar.
    pub fn size(&self, len: usize) -> Option<usize> {
        match self {
            Resolved::All => Some(len),
            Resolved::Scalar(_) => None,
            Resolved::Simple { size, .. } | Resolved::Regular { size, .. } => Some(*size),
            Resolved::Irregular(indices) => Some(indices.len()),
        }
    }
}

/// `x + n` if `x` is negative.
pub(crate) fn wrap_negative(x: isize, n: isize) -> isize {
    if x < 0 { x + n } else { x }
}

/// `x + n` unless `x` is positive.
pub(crate) fn wrap_non_positive(x: isize, n: isize) -> isize {
    if x > 0 { x } else { x + n }
}

/// Resolve a single position, wrapping a negative `index` once.
pub(crate) fn resolve_index(index: isize, len: usize, mode: CheckMode) -> Result<isize, SpanError> {
    let resolved = wrap_negative(index, len as isize);
    if mode.is_strict() && !(0 <= resolved && resolved < len as isize) {
        return Err(SpanError::IndexOutOfBounds { index, len });
    }
    Ok(resolved)
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Span {
            fn from(index: $ty) -> Self {
                Span::Scalar(index as isize)
            }
        }

        impl From<Range<$ty>> for Span {
            fn from(range: Range<$ty>) -> Self {
                Span::Simple { first: range.start as isize, last: range.end as isize }
            }
        }

        impl From<RangeTo<$ty>> for Span {
            fn from(range: RangeTo<$ty>) -> Self {
                Span::Simple { first: 0, last: range.end as isize }
            }
        }

        impl From<RangeFrom<$ty>> for Span {
            fn from(range: RangeFrom<$ty>) -> Self {
                Span::Simple { first: range.start as isize, last: 0 }
            }
        }

        impl From<Vec<$ty>> for Span {
            fn from(indices: Vec<$ty>) -> Self {
                Span::Irregular(indices.into_iter().map(|i| i as isize).collect())
            }
        }

        impl From<&[$ty]> for Span {
            fn from(indices: &[$ty]) -> Self {
                Span::Irregular(indices.iter().map(|&i| i as isize).collect())
            }
        }
    )*};
}

impl_from_int!(isize, i32, i64, usize);

impl From<RangeFull> for Span {
    fn from(_: RangeFull) -> Self {
        Span::All
    }
}

impl From<&Span> for Span {
    fn from(span: &Span) -> Self {
        span.clone()
    }
}

/// A sequence of spans, one per surviving axis, applied left to
/// right. Axes without a span are taken whole.
pub trait SpanList {
    fn into_span_vec(self) -> Vec<Span>;
}

/// A [`SpanList`] of exactly `N` spans. Array indexing requires
/// `IntoSpans<D>` for an array of rank `D`, so passing the wrong
/// number of spans is a type error.
pub trait IntoSpans<const N: usize>: SpanList {}

impl SpanList for Vec<Span> {
    fn into_span_vec(self) -> Vec<Span> {
        self
    }
}

impl SpanList for &[Span] {
    fn into_span_vec(self) -> Vec<Span> {
        self.to_vec()
    }
}

impl<S: Into<Span>, const N: usize> SpanList for [S; N] {
    fn into_span_vec(self) -> Vec<Span> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<Span>, const N: usize> IntoSpans<N> for [S; N] {}

macro_rules! impl_span_list_single {
    ($($ty:ty),*) => {$(
        impl SpanList for $ty {
            fn into_span_vec(self) -> Vec<Span> {
                vec![self.into()]
            }
        }

        impl IntoSpans<1> for $ty {}
    )*};
}

impl_span_list_single!(
    Span,
    RangeFull,
    isize,
    i32,
    i64,
    usize,
    Range<isize>,
    Range<i32>,
    Range<i64>,
    Range<usize>,
    RangeTo<isize>,
    RangeTo<i32>,
    RangeTo<i64>,
    RangeTo<usize>,
    RangeFrom<isize>,
    RangeFrom<i32>,
    RangeFrom<i64>,
    RangeFrom<usize>
);

macro_rules! impl_span_list_tuple {
    ($n:literal; $($name:ident),+) => {
        impl<$($name: Into<Span>),+> SpanList for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_span_vec(self) -> Vec<Span> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }

        impl<$($name: Into<Span>),+> IntoSpans<$n> for ($($name,)+) {}
    };
}

impl_span_list_tuple!(1; A);
impl_span_list_tuple!(2; A, B);
impl_span_list_tuple!(3; A, B, C);
impl_span_list_tuple!(4; A, B, C, D);
impl_span_list_tuple!(5; A, B, C, D, E);
impl_span_list_tuple!(6; A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: CheckMode = CheckMode::Strict;

    fn positions(span: &Span, len: usize) -> Vec<isize> {
        match span.resolve(len, STRICT).unwrap() {
            Resolved::All => (0..len as isize).collect(),
            Resolved::Scalar(i) => vec![i],
            Resolved::Simple { first, size } => (0..size as isize).map(|i| first + i).collect(),
            Resolved::Regular { first, size, step } => {
                (0..size as isize).map(|i| first + i * step).collect()
            }
            Resolved::Irregular(indices) => indices,
        }
    }

    #[test]
    fn test_simple_resolution() {
        assert_eq!(positions(&Span::new(1, 0), 5), vec![1, 2, 3, 4]);
        assert_eq!(positions(&Span::new(-3, -1), 5), vec![2, 3]);
        assert_eq!(positions(&Span::to(2), 5), vec![0, 1]);
        assert_eq!(positions(&Span::new(2, 2), 5), Vec::<isize>::new());
        assert_eq!(positions(&Span::new(0, 0), 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(positions(&Span::new(5, 5), 5), Vec::<isize>::new());
    }

    #[test]
    fn test_negative_indexing_equivalence() {
        for n in 3..12usize {
            let n_ = n as isize;
            assert_eq!(
                positions(&Span::new(-3, -1), n),
                positions(&Span::new(n_ - 3, n_ - 1), n)
            );
        }
    }

    #[test]
    fn test_regular_positive_step() {
        assert_eq!(positions(&Span::stepped(0, 0, 2), 5), vec![0, 2, 4]);
        assert_eq!(positions(&Span::stepped(1, 0, 2), 5), vec![1, 3]);
        assert_eq!(positions(&Span::stepped(1, 4, 3), 5), vec![1]);
        assert_eq!(positions(&Span::stepped(-4, -1, 1), 5), vec![1, 2, 3]);
        assert_eq!(positions(&Span::stepped(3, 3, 2), 5), Vec::<isize>::new());
    }

    #[test]
    fn test_regular_negative_step() {
        // full reversal
        assert_eq!(positions(&REVERSED, 5), vec![4, 3, 2, 1, 0]);
        assert_eq!(positions(&REVERSED, 1), vec![0]);
        assert_eq!(positions(&REVERSED, 0), Vec::<isize>::new());
        // single element
        assert_eq!(positions(&Span::stepped(0, -1, -1), 5), vec![0]);
        assert_eq!(positions(&Span::stepped(-1, -2, -1), 5), vec![4]);
        // empty
        assert_eq!(positions(&Span::stepped(2, 2, -1), 5), Vec::<isize>::new());
        // explicit bounds
        assert_eq!(positions(&Span::stepped(3, 0, -1), 5), vec![3, 2, 1]);
        assert_eq!(positions(&Span::stepped(4, -1, -2), 5), vec![4, 2, 0]);
        assert_eq!(positions(&Span::stepped(-2, 0, -1), 10), vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(positions(&Span::stepped(8, 2, -2), 10), vec![8, 6, 4]);
        assert_eq!(positions(&Span::stepped(-1, -1, -3), 10), vec![9, 6, 3, 0]);
    }

    #[test]
    fn test_negative_step_exhaustive() {
        // Every valid (first, last) pair, written with non-negative
        // bounds, selects exactly the positions first, first+step, ...
        // strictly above last.
        for n in 0..6isize {
            for first in 0..n {
                for last in -1..=first {
                    for step in 1..4isize {
                        let got = positions(&Span::stepped(first, last, -step), n as usize);
                        let want: Vec<isize> = (0..)
                            .map(|i| first - i * step)
                            .take_while(|&p| p > last)
                            .collect();
                        assert_eq!(got, want, "n={n} first={first} last={last} step=-{step}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_step() {
        assert_eq!(
            Span::stepped(0, 4, 0).resolve(5, STRICT),
            Err(SpanError::ZeroStep)
        );
        assert_eq!(
            Span::stepped(0, 4, 0).resolve(5, CheckMode::Fast),
            Err(SpanError::ZeroStep)
        );
    }

    #[test]
    fn test_bounds() {
        assert!(matches!(
            Span::Scalar(5).resolve(5, STRICT),
            Err(SpanError::IndexOutOfBounds { index: 5, len: 5 })
        ));
        assert!(matches!(
            Span::Scalar(-6).resolve(5, STRICT),
            Err(SpanError::IndexOutOfBounds { index: -6, len: 5 })
        ));
        assert_eq!(Span::Scalar(-1).resolve(5, STRICT), Ok(Resolved::Scalar(4)));
        assert!(matches!(
            Span::new(3, 2).resolve(5, STRICT),
            Err(SpanError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Span::new(0, 6).resolve(5, STRICT),
            Err(SpanError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Span::stepped(5, 0, -1).resolve(5, STRICT),
            Err(SpanError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Span::list([0, 7]).resolve(5, STRICT),
            Err(SpanError::IndexOutOfBounds { index: 7, len: 5 })
        ));
        // Fast mode passes the request through unchanged.
        assert_eq!(Span::Scalar(7).resolve(5, CheckMode::Fast), Ok(Resolved::Scalar(7)));
    }

    #[test]
    fn test_irregular_resolution() {
        assert_eq!(positions(&Span::list([0, -1, 2, 2]), 5), vec![0, 4, 2, 2]);
        assert_eq!(positions(&Span::from(vec![3, 1]), 5), vec![3, 1]);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Span::from(3), Span::Scalar(3));
        assert_eq!(Span::from(..), Span::All);
        assert_eq!(Span::from(2..5), Span::new(2, 5));
        assert_eq!(Span::from(..5), Span::to(5));
        assert_eq!(Span::from(2..), Span::new(2, 0));
        assert_eq!(Span::from(2usize..4usize), Span::new(2, 4));

        assert_eq!((.., 1).into_span_vec(), vec![Span::All, Span::Scalar(1)]);
        assert_eq!(
            [Span::All, REVERSED].into_span_vec(),
            vec![Span::All, Span::stepped(-1, -1, -1)]
        );
        assert_eq!(3isize.into_span_vec(), vec![Span::Scalar(3)]);
        assert_eq!((0, 1, 2, 3, 4, 5).into_span_vec().len(), 6);
    }

    #[test]
    fn test_serde() {
        for span in [ALL, REVERSED, Span::Scalar(-2), Span::new(1, 3), Span::list([4, 0])] {
            let json = serde_json::to_string(&span).unwrap();
            let back: Span = serde_json::from_str(&json).unwrap();
            assert_eq!(back, span);
        }
    }
}
