/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The owning array container.
//!
//! An [`Array`] owns a contiguous row-major buffer and a fixed number
//! of dimensions `D`, known at compile time. Everything else in this
//! crate is a view over some array's buffer.
//!
//! Every array carries an [`ArrayId`] drawn from a process-wide
//! counter. Views and layouts record the id of the array they were
//! made from; two operands refer to the same storage exactly when
//! their ids are equal. Cloning or resizing an array issues a fresh
//! id, so layouts computed before a resize are recognized as stale.

use std::fmt;
use std::ops::Index;
use std::ops::IndexMut;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::config;
use crate::copy;
use crate::copy::Source;
use crate::layout::ViewLayout;
use crate::span::wrap_negative;
use crate::span::IntoSpans;
use crate::span::SpanError;
use crate::span::SpanList;
use crate::view::element;
use crate::view::element_mut;
use crate::view::ArrayView;
use crate::view::ArrayViewMut;
use crate::view::Part;

/// Errors raised by arrays and views.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ArrayError {
    #[error(transparent)]
    Span(#[from] SpanError),

    #[error("expected {expected} coordinates, got {actual}")]
    RankMismatch { expected: usize, actual: usize },

    #[error("{given} spans applied to a view of depth {depth}")]
    TooManySpans { given: usize, depth: usize },

    #[error("index {index} out of bounds for axis {axis} of length {len}")]
    IndexOutOfBounds {
        axis: usize,
        index: isize,
        len: usize,
    },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("offset {offset} outside storage of {len} elements")]
    OffsetOutOfStorage { offset: isize, len: usize },

    #[error("layout of array {layout} used with array {array}")]
    ForeignLayout { layout: ArrayId, array: ArrayId },

    #[error("axis {axis} of length {len} cannot be split into parts of {part}")]
    Indivisible { axis: usize, len: usize, part: usize },
}

/// Identity of an array's storage.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct ArrayId(u64);

impl ArrayId {
    /// A fresh, never before issued id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ArrayId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArrayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An owned, row-major array of rank `D`.
#[derive(Debug)]
pub struct Array<T, const D: usize> {
    id: ArrayId,
    dims: [usize; D],
    data: Vec<T>,
}

impl<T: Clone, const D: usize> Clone for Array<T, D> {
    fn clone(&self) -> Self {
        Self {
            id: ArrayId::next(),
            dims: self.dims,
            data: self.data.clone(),
        }
    }
}

impl<T: PartialEq, const D: usize> PartialEq for Array<T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.data == other.data
    }
}

impl<T: Eq, const D: usize> Eq for Array<T, D> {}

impl<T, const D: usize> Array<T, D> {
    /// An array of default elements.
    pub fn new(dims: [usize; D]) -> Self
    where
        T: Default + Clone,
    {
        Self::from_elem(dims, T::default())
    }

    /// An array with every element equal to `value`.
    pub fn from_elem(dims: [usize; D], value: T) -> Self
    where
        T: Clone,
    {
        Self::from_raw(vec![value; dims.iter().product()], dims)
    }

    /// An array over `data`, which must hold exactly
    /// `product(dims)` elements in row-major order.
    pub fn from_vec(data: Vec<T>, dims: [usize; D]) -> Result<Self, ArrayError> {
        let expected = dims.iter().product();
        if data.len() != expected {
            return Err(ArrayError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_raw(data, dims))
    }

    /// An array over `data` without checking its length.
    ///
    /// # Safety
    ///
    /// `data.len()` must equal the product of `dims`; the unchecked
    /// accessors rely on it.
    pub unsafe fn from_vec_unchecked(data: Vec<T>, dims: [usize; D]) -> Self {
        Self::from_raw(data, dims)
    }

    pub(crate) fn from_raw(data: Vec<T>, dims: [usize; D]) -> Self {
        Self {
            id: ArrayId::next(),
            dims,
            data,
        }
    }

    /// An array whose element at each coordinate is `f(coordinate)`.
    pub fn from_shape_fn(dims: [usize; D], mut f: impl FnMut([usize; D]) -> T) -> Self {
        let size = dims.iter().product();
        let mut data = Vec::with_capacity(size);
        let mut coords = [0; D];
        for _ in 0..size {
            data.push(f(coords));
            for axis in (0..D).rev() {
                coords[axis] += 1;
                if coords[axis] < dims[axis] {
                    break;
                }
                coords[axis] = 0;
            }
        }
        Self::from_raw(data, dims)
    }

    pub fn id(&self) -> ArrayId {
        self.id
    }

    pub fn dims(&self) -> &[usize; D] {
        &self.dims
    }

    /// Length of axis `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    pub fn depth(&self) -> usize {
        D
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Visit every element in row-major order.
    pub fn traverse(&self, f: impl FnMut(&T)) {
        self.data.iter().for_each(f);
    }

    /// The layout covering the whole array.
    pub fn layout(&self) -> ViewLayout {
        ViewLayout::full(self.id, &self.dims)
    }

    fn offset(&self, index: [isize; D]) -> Result<isize, ArrayError> {
        let strict = config::global::check_mode().is_strict();
        let mut offset = 0isize;
        for (axis, (&i, &len)) in index.iter().zip(&self.dims).enumerate() {
            let wrapped = wrap_negative(i, len as isize);
            if strict && !(0 <= wrapped && wrapped < len as isize) {
                return Err(ArrayError::IndexOutOfBounds {
                    axis,
                    index: i,
                    len,
                });
            }
            offset = offset * len as isize + wrapped;
        }
        Ok(offset)
    }

    /// The element at `index`. Negative indices count from the end.
    pub fn at(&self, index: [isize; D]) -> Result<&T, ArrayError> {
        let offset = self.offset(index)?;
        element(&self.data, offset)
    }

    pub fn at_mut(&mut self, index: [isize; D]) -> Result<&mut T, ArrayError> {
        let offset = self.offset(index)?;
        element_mut(&mut self.data, offset)
    }

    /// The element at `index` without any validation.
    ///
    /// # Safety
    ///
    /// Every index must be within its axis, and the array must hold
    /// `product(dims)` elements.
    pub unsafe fn at_unchecked(&self, index: [usize; D]) -> &T {
        let offset = self.linear_index(index);
        // SAFETY: the caller guarantees `offset` is in bounds.
        unsafe { self.data.get_unchecked(offset) }
    }

    fn linear_index(&self, index: [usize; D]) -> usize {
        index
            .iter()
            .zip(&self.dims)
            .fold(0, |offset, (&i, &len)| offset * len + i)
    }

    /// A view of the elements selected by `spans`, one per axis.
    pub fn view<S: IntoSpans<D>>(&self, spans: S) -> Result<ArrayView<'_, T>, ArrayError> {
        let layout = self.layout_of(spans)?;
        Ok(ArrayView::new(&self.data, layout))
    }

    pub fn view_mut<S: IntoSpans<D>>(
        &mut self,
        spans: S,
    ) -> Result<ArrayViewMut<'_, T>, ArrayError> {
        let layout = self.layout_of(spans)?;
        Ok(ArrayViewMut::new(&mut self.data, layout))
    }

    /// The layout of the elements selected by `spans`. Layouts may be
    /// computed ahead of time and used later with
    /// [`assign_layouts`](Self::assign_layouts).
    pub fn layout_of<S: SpanList>(&self, spans: S) -> Result<ViewLayout, ArrayError> {
        let layout = self
            .layout()
            .collapse(&spans.into_span_vec(), config::global::check_mode())?;
        layout.check_storage(self.data.len())?;
        Ok(layout)
    }

    pub fn as_view(&self) -> ArrayView<'_, T> {
        ArrayView::new(&self.data, self.layout())
    }

    pub fn as_view_mut(&mut self) -> ArrayViewMut<'_, T> {
        let layout = self.layout();
        ArrayViewMut::new(&mut self.data, layout)
    }

    /// The element when every span is a scalar, otherwise a view.
    pub fn select<S: IntoSpans<D>>(&self, spans: S) -> Result<Part<'_, T>, ArrayError> {
        self.as_view().select(spans)
    }

    /// A fresh array holding a copy of the selected elements.
    pub fn part<const N: usize, S: IntoSpans<D>>(&self, spans: S) -> Result<Array<T, N>, ArrayError>
    where
        T: Clone,
    {
        self.view(spans)?.to_array()
    }

    /// Copy the elements selected by `src` onto those selected by
    /// `dst`, within this array. The result is as if the source had
    /// been read completely before anything was written.
    pub fn assign<S1: SpanList, S2: SpanList>(&mut self, dst: S1, src: S2) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        let dst = self.layout_of(dst)?;
        let src = self.layout_of(src)?;
        self.assign_layouts(&dst, &src)
    }

    /// [`assign`](Self::assign) for precomputed layouts. Both must
    /// have been made from this array since its last resize.
    pub fn assign_layouts(&mut self, dst: &ViewLayout, src: &ViewLayout) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        for layout in [dst, src] {
            if layout.id() != self.id {
                return Err(ArrayError::ForeignLayout {
                    layout: layout.id(),
                    array: self.id,
                });
            }
            layout.check_storage(self.data.len())?;
        }
        copy::copy_within(&mut self.data, src, dst)
    }

    /// Overwrite every element from another array or view with the
    /// same dimensions.
    pub fn assign_from<S>(&mut self, src: &S) -> Result<(), ArrayError>
    where
        S: Source + ?Sized,
        S::Elem: Clone + Into<T>,
    {
        let layout = self.layout();
        copy::copy_from_source(src, &mut self.data, &layout)
    }

    /// Change the dimensions. Elements keep their linear positions;
    /// new positions are default-filled. Existing layouts become
    /// stale.
    pub fn resize(&mut self, dims: [usize; D])
    where
        T: Default + Clone,
    {
        let old = self.id;
        self.data.resize(dims.iter().product(), T::default());
        self.dims = dims;
        self.id = ArrayId::next();
        tracing::trace!("resized array {} to {:?} as {}", old, dims, self.id);
    }
}

impl<T> From<Vec<T>> for Array<T, 1> {
    fn from(data: Vec<T>) -> Self {
        let len = data.len();
        Array::from_raw(data, [len])
    }
}

impl<T, const D: usize> Index<[usize; D]> for Array<T, D> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if any index is out of bounds for its axis.
    fn index(&self, index: [usize; D]) -> &T {
        for (axis, (&i, &len)) in index.iter().zip(&self.dims).enumerate() {
            assert!(
                i < len,
                "index {} out of bounds for axis {} of length {}",
                i,
                axis,
                len
            );
        }
        &self.data[self.linear_index(index)]
    }
}

impl<T, const D: usize> IndexMut<[usize; D]> for Array<T, D> {
    fn index_mut(&mut self, index: [usize; D]) -> &mut T {
        for (axis, (&i, &len)) in index.iter().zip(&self.dims).enumerate() {
            assert!(
                i < len,
                "index {} out of bounds for axis {} of length {}",
                i,
                axis,
                len
            );
        }
        let offset = self.linear_index(index);
        &mut self.data[offset]
    }
}

impl<'a, T, const D: usize> IntoIterator for &'a Array<T, D> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: fmt::Display, const D: usize> fmt::Display for Array<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_view(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::global;
    use crate::config::CheckMode;
    use crate::span::Span;
    use crate::span::REVERSED;

    fn hundred() -> Array<i32, 2> {
        Array::from_vec((0..100).collect(), [10, 10]).unwrap()
    }

    #[test]
    fn test_construction() {
        let a = Array::<f64, 3>::new([2, 3, 4]);
        assert_eq!(a.size(), 24);
        assert_eq!(a.depth(), 3);
        assert!(a.iter().all(|&x| x == 0.0));

        let b = Array::from_elem([2, 2], 'x');
        assert_eq!(b.as_slice(), &['x'; 4]);

        assert!(matches!(
            Array::from_vec(vec![1, 2, 3], [2, 2]),
            Err(ArrayError::SizeMismatch { expected: 4, actual: 3 })
        ));

        let c = Array::from_shape_fn([2, 3], |[i, j]| i * 3 + j);
        assert_eq!(c.as_slice(), &[0, 1, 2, 3, 4, 5]);

        let d: Array<u8, 1> = vec![1, 2, 3].into();
        assert_eq!(d.dims(), &[3]);

        // SAFETY: four elements for a 2×2 array.
        let e = unsafe { Array::from_vec_unchecked(vec![1, 2, 3, 4], [2, 2]) };
        // SAFETY: in bounds.
        assert_eq!(unsafe { *e.at_unchecked([1, 0]) }, 3);
    }

    #[test]
    fn test_element_access() {
        let mut a = hundred();
        assert_eq!(*a.at([3, 4]).unwrap(), 34);
        assert_eq!(*a.at([-1, -2]).unwrap(), 98);
        assert_eq!(a[[3, 4]], 34);
        a[[3, 4]] = -34;
        *a.at_mut([0, 0]).unwrap() = -1;
        assert_eq!(a.as_slice()[34], -34);
        assert_eq!(a.as_slice()[0], -1);
        assert_eq!(*a.select((3, 5)).unwrap().element().unwrap(), 35);
    }

    #[test]
    #[should_panic(expected = "index 10 out of bounds for axis 0 of length 10")]
    fn test_index_panics() {
        let a = hundred();
        let _ = a[[10, 0]];
    }

    #[test]
    fn test_bounds_checked_in_strict_mode() {
        let lock = global::lock();
        let _guard = lock.override_check_mode(CheckMode::Strict);
        let a = hundred();
        assert!(matches!(
            a.at([10, 0]),
            Err(ArrayError::IndexOutOfBounds { axis: 0, index: 10, len: 10 })
        ));
        assert!(matches!(
            a.at([0, -11]),
            Err(ArrayError::IndexOutOfBounds { axis: 1, index: -11, len: 10 })
        ));
    }

    #[test]
    fn test_fast_mode_is_not_validated() {
        let lock = global::lock();
        let _guard = lock.override_check_mode(CheckMode::Fast);
        let a = hundred();
        // Wraps into the next row instead of failing.
        assert_eq!(*a.at([0, 10]).unwrap(), 10);
        assert!(matches!(
            a.at([10, 0]),
            Err(ArrayError::OffsetOutOfStorage { offset: 100, len: 100 })
        ));
    }

    #[test]
    fn test_self_assignment_of_columns() {
        let mut a = hundred();
        a.assign((.., 1), (.., 3)).unwrap();
        assert_eq!(
            a.view((.., 1)).unwrap().to_vec(),
            (0..10).map(|i| i * 10 + 3).collect::<Vec<_>>()
        );
        assert_eq!(
            a.view((.., 3)).unwrap().to_vec(),
            (0..10).map(|i| i * 10 + 3).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_overlapping_shift() {
        let mut a = Array::from(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        a.assign(Span::new(1, 0), Span::new(0, 7)).unwrap();
        assert_eq!(a.as_slice(), &[0, 0, 1, 2, 3, 4, 5, 6]);

        let mut b = Array::from(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        b.assign(Span::new(0, 7), Span::new(1, 0)).unwrap();
        assert_eq!(b.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 7]);

        let mut c = Array::from(vec![0, 1, 2, 3, 4]);
        c.assign(.., REVERSED).unwrap();
        assert_eq!(c.as_slice(), &[4, 3, 2, 1, 0]);

        let mut d = Array::from(vec![0, 1, 2, 3]);
        d.assign(.., ..).unwrap();
        assert_eq!(d.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_assign_rows_irregular() {
        let mut a = Array::from_shape_fn([3, 2], |[i, j]| (i * 2 + j) as i32);
        a.assign(Span::list([0, 1, 2]), Span::list([2, 0, 1])).unwrap();
        assert_eq!(a.as_slice(), &[4, 5, 0, 1, 2, 3]);
    }

    #[test]
    fn test_assign_shape_mismatch() {
        let mut a = hundred();
        assert!(matches!(
            a.assign((.., 1), (1, ..)),
            Ok(())
        ));
        assert!(matches!(
            a.assign((.., 1), (Span::new(0, 5), 1)),
            Err(ArrayError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_foreign_and_stale_layouts() {
        let mut a = hundred();
        let b = hundred();
        let theirs = b.layout_of((.., 0)).unwrap();
        let ours = a.layout_of((.., 1)).unwrap();
        assert!(matches!(
            a.assign_layouts(&ours, &theirs),
            Err(ArrayError::ForeignLayout { .. })
        ));

        a.resize([5, 20]);
        assert!(matches!(
            a.assign_layouts(&ours, &ours),
            Err(ArrayError::ForeignLayout { .. })
        ));
    }

    #[test]
    fn test_assign_from() {
        let mut a = Array::<i64, 2>::new([2, 3]);
        let b = Array::from_shape_fn([3, 2], |[i, j]| (i * 2 + j) as i32);
        assert!(matches!(
            a.assign_from(&b),
            Err(ArrayError::ShapeMismatch { .. })
        ));
        let t = b.view((.., 0)).unwrap();
        let mut row = a.view_mut((0, ..)).unwrap();
        row.assign(&t).unwrap();
        assert_eq!(a.as_slice(), &[0, 2, 4, 0, 0, 0]);

        let mut c = Array::<i32, 2>::new([3, 2]);
        c.assign_from(&b).unwrap();
        assert_eq!(c, b);
    }

    #[test]
    fn test_clone_and_resize_issue_new_ids() {
        let mut a = hundred();
        let b = a.clone();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);

        let before = a.id();
        a.resize([3, 3]);
        assert_ne!(a.id(), before);
        assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        a.resize([2, 6]);
        assert_eq!(&a.as_slice()[9..], &[0, 0, 0]);
    }

    #[test]
    fn test_part() {
        let a = hundred();
        let p: Array<i32, 1> = a.part((2, Span::stepped(0, 0, 3))).unwrap();
        assert_eq!(p.as_slice(), &[20, 23, 26, 29]);
        let q: Array<i32, 2> = a.part((Span::new(8, 0), Span::new(8, 0))).unwrap();
        assert_eq!(q.as_slice(), &[88, 89, 98, 99]);
    }

    #[test]
    fn test_display() {
        let a = Array::from_shape_fn([2, 2], |[i, j]| i * 2 + j);
        assert_eq!(a.to_string(), "[[0, 1], [2, 3]]");
    }
}
