/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Reinterpreting the dimensions of an array.
//!
//! Reshaping keeps the row-major element sequence and changes only
//! the dimensions laid over it. An owned [`Array`] already holds its
//! elements in that order, so reshaping it moves the buffer into the
//! result without copying. Borrowed arrays and views are materialized
//! into a fresh buffer first.
//!
//! ```text
//!   [6, 4]  ── reshape ──▶  [2, 3, 4]        same 24 elements
//!   [6, 4]  ── flatten ──▶  [24]
//!   [6, 4]  ── partition [3] ──▶  [2, 3, 4]  axis 0 split as (6/3, 3)
//! ```
//!
//! See [`reshape`], [`flatten`], [`partition`] and [`make_array`] for
//! entry points.

use crate::array::Array;
use crate::array::ArrayError;
use crate::view::ArrayView;
use crate::view::ArrayViewMut;

mod sealed {
    pub trait Sealed {}
}

/// Something that can surrender its elements in row-major order.
pub trait IntoStorage: sealed::Sealed {
    type Elem;

    /// Dimensions of the source.
    fn dims(&self) -> Vec<usize>;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements in row-major order.
    fn into_storage(self) -> Vec<Self::Elem>;
}

impl<T, const D: usize> sealed::Sealed for Array<T, D> {}

impl<T, const D: usize> IntoStorage for Array<T, D> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        Array::dims(self).to_vec()
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn into_storage(self) -> Vec<T> {
        tracing::trace!("reusing the buffer of array {}", self.id());
        self.into_vec()
    }
}

impl<T: Clone, const D: usize> sealed::Sealed for &Array<T, D> {}

impl<T: Clone, const D: usize> IntoStorage for &Array<T, D> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        Array::dims(*self).to_vec()
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn into_storage(self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T: Clone> sealed::Sealed for ArrayView<'_, T> {}

impl<T: Clone> IntoStorage for ArrayView<'_, T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        ArrayView::dims(self)
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn into_storage(self) -> Vec<T> {
        tracing::trace!("materializing a {:?} view of array {}", self.kind(), self.id());
        self.to_vec()
    }
}

impl<T: Clone> sealed::Sealed for &ArrayView<'_, T> {}

impl<T: Clone> IntoStorage for &ArrayView<'_, T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        ArrayView::dims(*self)
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn into_storage(self) -> Vec<T> {
        self.to_vec()
    }
}

impl<T: Clone> sealed::Sealed for ArrayViewMut<'_, T> {}

impl<T: Clone> IntoStorage for ArrayViewMut<'_, T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        ArrayViewMut::dims(self)
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn into_storage(self) -> Vec<T> {
        self.into_view().to_vec()
    }
}

impl<T> sealed::Sealed for Vec<T> {}

impl<T> IntoStorage for Vec<T> {
    type Elem = T;

    fn dims(&self) -> Vec<usize> {
        vec![self.len()]
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn into_storage(self) -> Vec<T> {
        self
    }
}

/// Lay `dims` over the elements of `src`. The element count must not
/// change.
pub fn reshape<const N: usize, S: IntoStorage>(
    src: S,
    dims: [usize; N],
) -> Result<Array<S::Elem, N>, ArrayError> {
    let expected: usize = dims.iter().product();
    if src.len() != expected {
        return Err(ArrayError::ShapeMismatch {
            expected: dims.to_vec(),
            actual: src.dims(),
        });
    }
    Ok(Array::from_raw(src.into_storage(), dims))
}

/// Reshape to a single axis.
pub fn flatten<S: IntoStorage>(src: S) -> Array<S::Elem, 1> {
    let len = src.len();
    Array::from_raw(src.into_storage(), [len])
}

/// Split each of the leading `K` axes of `array` into an `(outer,
/// inner)` pair of axes, where `inner = parts[axis]`. The buffer is
/// reused as is.
///
/// `N` must equal `D + K`; any other combination fails to compile.
pub fn partition<const K: usize, const D: usize, const N: usize, T>(
    array: Array<T, D>,
    parts: [usize; K],
) -> Result<Array<T, N>, ArrayError> {
    const {
        assert!(K <= D, "cannot partition more axes than the array has");
        assert!(N == D + K, "partitioning K axes adds exactly K axes");
    }

    let old = *array.dims();
    let mut dims = [0usize; N];
    for (axis, &part) in parts.iter().enumerate() {
        let len = old[axis];
        if part == 0 || len % part != 0 {
            return Err(ArrayError::Indivisible { axis, len, part });
        }
        dims[2 * axis] = len / part;
        dims[2 * axis + 1] = part;
    }
    for axis in K..D {
        dims[K + axis] = old[axis];
    }
    Ok(Array::from_raw(array.into_vec(), dims))
}

/// A new array of rank `N` from any array, view or vector.
pub fn make_array<const N: usize, S: IntoStorage>(src: S) -> Result<Array<S::Elem, N>, ArrayError> {
    let dims: [usize; N] =
        src.dims()
            .try_into()
            .map_err(|dims: Vec<usize>| ArrayError::RankMismatch {
                expected: N,
                actual: dims.len(),
            })?;
    Ok(Array::from_raw(src.into_storage(), dims))
}
