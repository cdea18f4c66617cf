/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Element-order iteration.
//!
//! [`Offsets`] walks the storage offsets of a layout from both ends
//! with a pair of [`ElementCursor`]s. Strided layouts compute each
//! offset as `offset + i · stride`; irregular layouts keep an
//! [`IndexCounter`] and resolve coordinates through their indexers.
//! [`Iter`] pairs offsets with storage, and [`OuterIter`] yields the
//! sub-views along the outermost surviving axis.

use std::iter::FusedIterator;

use crate::cursor::ElementCursor;
use crate::cursor::IndexCounter;
use crate::layout::ViewLayout;
use crate::view::ArrayView;

/// Storage offsets of a layout, in element order.
#[derive(Clone, Debug)]
pub struct Offsets {
    layout: ViewLayout,
    stride: isize,
    front: ElementCursor,
    back: ElementCursor,
    len: usize,
}

impl Offsets {
    pub fn new(layout: ViewLayout) -> Self {
        let len = layout.size();
        let (stride, front, back) = match layout.stride() {
            Some(stride) => (stride, ElementCursor::Linear(0), ElementCursor::Linear(len)),
            None => {
                let dims = layout.dims();
                (
                    0,
                    ElementCursor::Counter(IndexCounter::new(&dims)),
                    ElementCursor::Counter(IndexCounter::end(&dims)),
                )
            }
        };
        Self {
            layout,
            stride,
            front,
            back,
            len,
        }
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    fn offset(&self, cursor: &ElementCursor) -> isize {
        match cursor {
            ElementCursor::Linear(index) => self.layout.offset() + *index as isize * self.stride,
            ElementCursor::Counter(counter) => self.layout.offset_of(counter.coords()),
        }
    }
}

impl Iterator for Offsets {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.len == 0 {
            return None;
        }
        let offset = self.offset(&self.front);
        self.front.step_forward();
        self.len -= 1;
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn nth(&mut self, n: usize) -> Option<isize> {
        if n >= self.len {
            self.front = self.back.clone();
            self.len = 0;
            return None;
        }
        self.front.advance(n as isize);
        self.len -= n;
        self.next()
    }
}

impl DoubleEndedIterator for Offsets {
    fn next_back(&mut self) -> Option<isize> {
        if self.len == 0 {
            return None;
        }
        self.back.step_back();
        self.len -= 1;
        Some(self.offset(&self.back))
    }

    fn nth_back(&mut self, n: usize) -> Option<isize> {
        if n >= self.len {
            self.back = self.front.clone();
            self.len = 0;
            return None;
        }
        self.back.advance(-(n as isize));
        self.len -= n;
        self.next_back()
    }
}

impl ExactSizeIterator for Offsets {}

impl FusedIterator for Offsets {}

/// Shared references to the elements of a view, in element order.
#[derive(Debug)]
pub struct Iter<'a, T> {
    data: &'a [T],
    offsets: Offsets,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            offsets: self.offsets.clone(),
        }
    }
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(data: &'a [T], layout: ViewLayout) -> Self {
        Self {
            data,
            offsets: Offsets::new(layout),
        }
    }

    fn element(&self, offset: isize) -> &'a T {
        let data = self.data;
        &data[offset as usize]
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.offsets.next().map(|offset| self.element(offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.offsets.nth(n).map(|offset| self.element(offset))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.offsets.next_back().map(|offset| self.element(offset))
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.offsets.nth_back(n).map(|offset| self.element(offset))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Sub-views along the outermost surviving axis.
#[derive(Debug)]
pub struct OuterIter<'a, T> {
    data: &'a [T],
    layout: ViewLayout,
    front: usize,
    back: usize,
}

impl<T> Clone for OuterIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            layout: self.layout.clone(),
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> OuterIter<'a, T> {
    pub(crate) fn new(data: &'a [T], layout: ViewLayout) -> Self {
        let back = layout.dim(0).unwrap_or(0);
        Self {
            data,
            layout,
            front: 0,
            back,
        }
    }

    fn sub_view(&self, index: usize) -> ArrayView<'a, T> {
        ArrayView::new(self.data, self.layout.fix_outer(index))
    }
}

impl<'a, T> Iterator for OuterIter<'a, T> {
    type Item = ArrayView<'a, T>;

    fn next(&mut self) -> Option<ArrayView<'a, T>> {
        if self.front >= self.back {
            return None;
        }
        let view = self.sub_view(self.front);
        self.front += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for OuterIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.sub_view(self.back))
    }
}

impl<T> ExactSizeIterator for OuterIter<'_, T> {}

impl<T> FusedIterator for OuterIter<'_, T> {}
