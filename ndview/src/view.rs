/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Views over array storage.
//!
//! An [`ArrayView`] pairs a borrowed slice of base storage with a
//! [`ViewLayout`]; an [`ArrayViewMut`] does the same with an
//! exclusive borrow. Views never own memory and cannot outlive the
//! array they borrow, so a view can never observe a resized array.
//!
//! ```text
//!   Array<i32, 2>  dims [3, 4]            a.view((.., 1))
//!
//!    0  1  2  3                           offset 1
//!    4  5  6  7      ─────────────▶       indexers [All, Scalar]
//!    8  9 10 11                           kind Regular, stride 4
//!                                         elements 1, 5, 9
//! ```
//!
//! Re-slicing a view ([`ArrayView::view`]) composes the new spans
//! with the existing indexers; no element is copied. When every axis
//! becomes fixed, [`ArrayView::select`] returns the element itself.
//!
//! Public operations read the global [`CheckMode`](crate::CheckMode)
//! once and validate spans and coordinates accordingly.

use std::fmt;

use itertools::Itertools;

use crate::array::Array;
use crate::array::ArrayError;
use crate::array::ArrayId;
use crate::config;
use crate::copy;
use crate::copy::Source;
use crate::iter::Iter;
use crate::iter::OuterIter;
use crate::kind::ViewKind;
use crate::layout::ViewLayout;
use crate::span::Span;
use crate::span::SpanList;

/// Either a single element or a view, depending on how many axes a
/// selection leaves.
#[derive(Debug)]
pub enum Part<'a, T> {
    Element(&'a T),
    View(ArrayView<'a, T>),
}

impl<'a, T> Part<'a, T> {
    pub fn element(self) -> Option<&'a T> {
        match self {
            Part::Element(element) => Some(element),
            Part::View(_) => None,
        }
    }

    pub fn view(self) -> Option<ArrayView<'a, T>> {
        match self {
            Part::Element(_) => None,
            Part::View(view) => Some(view),
        }
    }
}

pub(crate) fn element<T>(data: &[T], offset: isize) -> Result<&T, ArrayError> {
    usize::try_from(offset)
        .ok()
        .and_then(|offset| data.get(offset))
        .ok_or(ArrayError::OffsetOutOfStorage {
            offset,
            len: data.len(),
        })
}

pub(crate) fn element_mut<T>(data: &mut [T], offset: isize) -> Result<&mut T, ArrayError> {
    let len = data.len();
    usize::try_from(offset)
        .ok()
        .and_then(|offset| data.get_mut(offset))
        .ok_or(ArrayError::OffsetOutOfStorage { offset, len })
}

/// A shared view of (part of) an array.
#[derive(Debug)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    layout: ViewLayout,
}

impl<T> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<'a, T> ArrayView<'a, T> {
    pub(crate) fn new(data: &'a [T], layout: ViewLayout) -> Self {
        Self { data, layout }
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    /// Identity of the viewed array.
    pub fn id(&self) -> ArrayId {
        self.layout.id()
    }

    pub fn kind(&self) -> ViewKind {
        self.layout.kind()
    }

    /// Number of surviving axes.
    pub fn depth(&self) -> usize {
        self.layout.depth()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.layout.dims()
    }

    /// Length of surviving axis `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= self.depth()`.
    pub fn dim(&self, axis: usize) -> usize {
        match self.layout.dim(axis) {
            Some(dim) => dim,
            None => panic!("axis {} out of range for depth {}", axis, self.depth()),
        }
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Distance between consecutive elements, for strided views.
    pub fn stride(&self) -> Option<isize> {
        self.layout.stride()
    }

    /// The element at `coords`, one per surviving axis.
    pub fn at(&self, coords: &[isize]) -> Result<&'a T, ArrayError> {
        let offset = self.layout.position(coords, config::global::check_mode())?;
        element(self.data, offset)
    }

    /// The element at `coords` without any validation.
    ///
    /// # Safety
    ///
    /// `coords` must hold exactly one in-range coordinate per
    /// surviving axis, and the view must have been built from valid
    /// spans.
    pub unsafe fn at_unchecked(&self, coords: &[usize]) -> &'a T {
        let offset = self.layout.offset_of(coords);
        // SAFETY: the caller guarantees `offset` addresses an element.
        unsafe { self.data.get_unchecked(offset as usize) }
    }

    /// Re-slice this view. Surviving axes without a span are taken
    /// whole.
    pub fn view<S: SpanList>(&self, spans: S) -> Result<ArrayView<'a, T>, ArrayError> {
        let layout = self
            .layout
            .collapse(&spans.into_span_vec(), config::global::check_mode())?;
        layout.check_storage(self.data.len())?;
        Ok(ArrayView::new(self.data, layout))
    }

    /// Re-slice this view, yielding the element itself when no axis
    /// survives.
    pub fn select<S: SpanList>(&self, spans: S) -> Result<Part<'a, T>, ArrayError> {
        let view = self.view(spans)?;
        if view.depth() == 0 {
            return element(self.data, view.layout.offset()).map(Part::Element);
        }
        Ok(Part::View(view))
    }

    /// The sub-view obtained by fixing the outer `leading.len()` axes.
    pub fn subview(&self, leading: &[isize]) -> Result<ArrayView<'a, T>, ArrayError> {
        let spans: Vec<Span> = leading.iter().map(|&i| Span::Scalar(i)).collect();
        self.view(spans)
    }

    /// Sub-views along the outermost surviving axis.
    pub fn outer_iter(&self) -> OuterIter<'a, T> {
        OuterIter::new(self.data, self.layout.clone())
    }

    /// The elements in element order.
    pub fn iter(&self) -> Iter<'a, T> {
        Iter::new(self.data, self.layout.clone())
    }

    /// Visit every element in element order.
    pub fn traverse(&self, mut f: impl FnMut(&'a T)) {
        let data = self.data;
        self.layout.traverse(|offset| f(&data[offset as usize]));
    }

    /// Copy the elements, in element order, into `dst`.
    pub fn copy_to(&self, dst: &mut [T]) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        if dst.len() != self.size() {
            return Err(ArrayError::SizeMismatch {
                expected: self.size(),
                actual: dst.len(),
            });
        }
        let mut slots = dst.iter_mut();
        self.traverse(|value| {
            if let Some(slot) = slots.next() {
                *slot = value.clone();
            }
        });
        Ok(())
    }

    /// The elements in element order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.size());
        self.traverse(|value| out.push(value.clone()));
        out
    }

    /// Materialize the view into a new array of rank `N`.
    pub fn to_array<const N: usize>(&self) -> Result<Array<T, N>, ArrayError>
    where
        T: Clone,
    {
        let dims: [usize; N] =
            self.dims()
                .try_into()
                .map_err(|dims: Vec<usize>| ArrayError::RankMismatch {
                    expected: N,
                    actual: dims.len(),
                })?;
        Array::from_vec(self.to_vec(), dims)
    }
}

impl<'a, T> IntoIterator for ArrayView<'a, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        Iter::new(self.data, self.layout)
    }
}

impl<'a, T> IntoIterator for &ArrayView<'a, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for ArrayView<'_, T> {
    /// Views are equal when their dimensions and elements are equal,
    /// regardless of where they live.
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.iter().eq(other.iter())
    }
}

impl<T: fmt::Display> fmt::Display for ArrayView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.depth() {
            0 => match self.iter().next() {
                Some(value) => write!(f, "{}", value),
                None => Ok(()),
            },
            1 => write!(f, "[{}]", self.iter().join(", ")),
            _ => write!(f, "[{}]", self.outer_iter().join(", ")),
        }
    }
}

/// An exclusive view of (part of) an array.
#[derive(Debug)]
pub struct ArrayViewMut<'a, T> {
    data: &'a mut [T],
    layout: ViewLayout,
}

impl<'a, T> ArrayViewMut<'a, T> {
    pub(crate) fn new(data: &'a mut [T], layout: ViewLayout) -> Self {
        Self { data, layout }
    }

    /// A shared view of the same elements.
    pub fn as_view(&self) -> ArrayView<'_, T> {
        ArrayView::new(self.data, self.layout.clone())
    }

    /// Downgrade to a shared view for the rest of the borrow.
    pub fn into_view(self) -> ArrayView<'a, T> {
        ArrayView::new(self.data, self.layout)
    }

    /// A shorter-lived exclusive view of the same elements, leaving
    /// `self` usable once it is dropped.
    pub fn reborrow(&mut self) -> ArrayViewMut<'_, T> {
        ArrayViewMut::new(self.data, self.layout.clone())
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn id(&self) -> ArrayId {
        self.layout.id()
    }

    pub fn kind(&self) -> ViewKind {
        self.layout.kind()
    }

    pub fn depth(&self) -> usize {
        self.layout.depth()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.layout.dims()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stride(&self) -> Option<isize> {
        self.layout.stride()
    }

    pub fn at(&self, coords: &[isize]) -> Result<&T, ArrayError> {
        let offset = self.layout.position(coords, config::global::check_mode())?;
        element(self.data, offset)
    }

    pub fn at_mut(&mut self, coords: &[isize]) -> Result<&mut T, ArrayError> {
        let offset = self.layout.position(coords, config::global::check_mode())?;
        element_mut(self.data, offset)
    }

    /// Re-slice this view mutably.
    pub fn view_mut<S: SpanList>(&mut self, spans: S) -> Result<ArrayViewMut<'_, T>, ArrayError> {
        let layout = self
            .layout
            .collapse(&spans.into_span_vec(), config::global::check_mode())?;
        layout.check_storage(self.data.len())?;
        Ok(ArrayViewMut::new(self.data, layout))
    }

    /// Apply `f` to every element in element order. An irregular view
    /// that lists a position twice visits it twice.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        let data = &mut *self.data;
        self.layout.traverse(|offset| f(&mut data[offset as usize]));
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.for_each_mut(|slot| *slot = value.clone());
    }

    /// Overwrite the elements, in element order, from `src`.
    pub fn copy_from(&mut self, src: &[T]) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        if src.len() != self.size() {
            return Err(ArrayError::SizeMismatch {
                expected: self.size(),
                actual: src.len(),
            });
        }
        let mut values = src.iter();
        self.for_each_mut(|slot| {
            if let Some(value) = values.next() {
                *slot = value.clone();
            }
        });
        Ok(())
    }

    /// Overwrite the elements from another array or view of the same
    /// dimensions, converting each element.
    pub fn assign<S>(&mut self, src: &S) -> Result<(), ArrayError>
    where
        S: Source + ?Sized,
        S::Elem: Clone + Into<T>,
    {
        copy::copy_from_source(src, self.data, &self.layout)
    }
}
