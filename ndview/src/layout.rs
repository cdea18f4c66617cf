/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! View layouts.
//!
//! A [`ViewLayout`] is the borrow-free description of a view: which
//! array it refers to, the base array's dimensions, one [`Indexer`]
//! per base axis, and the absolute offset of the view's first element
//! in the base storage.
//!
//! # Addressing
//!
//! For a base array of dimensions `d₀ … dₙ₋₁`, base axis `a` has the
//! row-major stride `sₐ = dₐ₊₁ · … · dₙ₋₁`. The element of a view at
//! surviving coordinates `k` lives at
//!
//! ```text
//!   offset + Σₐ gₐ(kₐ) · sₐ
//! ```
//!
//! where `gₐ` is axis `a`'s indexer (fixed axes contribute nothing;
//! their position is already folded into `offset`). The sum is
//! evaluated in Horner form over the base axes, so no stride table
//! is kept.
//!
//! # Re-slicing
//!
//! [`ViewLayout::collapse`] applies one span per surviving axis.
//! Each axis yields a relative offset `oₐ` and a new indexer; the
//! view offset grows by `oₐ · sₐ`. Surviving axes without a span are
//! taken whole.
//!
//! # Derived stride
//!
//! Simple and regular views are addressed as `offset + i · stride`
//! over the flat element index `i`:
//!
//! ```text
//!   Simple                     stride = 1
//!   Regular, depth 1           stride = step · sₐ   (a = the surviving axis)
//!   Regular, depth > 1         stride = s_last      (last surviving axis)
//! ```
//!
//! The base stride `s_last` is the product of the base dimensions
//! after the innermost surviving axis.

use serde::Deserialize;
use serde::Serialize;

use crate::array::ArrayError;
use crate::array::ArrayId;
use crate::config::CheckMode;
use crate::indexer::Indexer;
use crate::kind::ViewKind;
use crate::span::wrap_negative;
use crate::span::Span;

/// The addressing information of a view, independent of any storage.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ViewLayout {
    id: ArrayId,
    base_dims: Vec<usize>,
    indexers: Vec<Indexer>,
    offset: isize,
}

/// A surviving axis, flattened for traversal.
#[derive(Clone, Debug)]
struct Axis<'a> {
    indexer: &'a Indexer,
    size: usize,
    stride: isize,
}

impl ViewLayout {
    /// The layout covering all of an array with identity `id`.
    pub fn full(id: ArrayId, dims: &[usize]) -> Self {
        Self {
            id,
            base_dims: dims.to_vec(),
            indexers: vec![Indexer::All; dims.len()],
            offset: 0,
        }
    }

    /// Identity of the array this layout addresses.
    pub fn id(&self) -> ArrayId {
        self.id
    }

    /// Dimensions of the base array.
    pub fn base_dims(&self) -> &[usize] {
        &self.base_dims
    }

    /// One indexer per base axis.
    pub fn indexers(&self) -> &[Indexer] {
        &self.indexers
    }

    /// Absolute offset of the first element.
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Number of surviving axes.
    pub fn depth(&self) -> usize {
        self.indexers.iter().filter(|ix| !ix.is_scalar()).count()
    }

    /// Length of each surviving axis.
    pub fn dims(&self) -> Vec<usize> {
        self.indexers
            .iter()
            .zip(&self.base_dims)
            .filter(|(ix, _)| !ix.is_scalar())
            .map(|(ix, &d)| ix.size(d))
            .collect()
    }

    /// Length of surviving axis `axis`, if there is one.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.indexers
            .iter()
            .zip(&self.base_dims)
            .filter(|(ix, _)| !ix.is_scalar())
            .nth(axis)
            .map(|(ix, &d)| ix.size(d))
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn kind(&self) -> ViewKind {
        ViewKind::classify(self.indexers.iter().map(Indexer::kind))
    }

    /// Whether this layout covers its whole array in order.
    pub fn is_full(&self) -> bool {
        self.offset == 0 && self.indexers.iter().all(|ix| matches!(ix, Indexer::All))
    }

    /// The single stride between consecutive elements, for simple and
    /// regular views.
    pub fn stride(&self) -> Option<isize> {
        match self.kind() {
            ViewKind::Simple => Some(1),
            ViewKind::Regular => {
                let axes = self.axes();
                let last = axes.last()?;
                if axes.len() == 1 {
                    Some(last.stride * last.indexer.step()?)
                } else {
                    Some(last.stride)
                }
            }
            ViewKind::Irregular => None,
        }
    }

    /// Lowest and highest absolute offsets the view touches; `None`
    /// when it has no elements.
    pub fn extent(&self) -> Option<(isize, isize)> {
        let axes = self.axes();
        if axes.iter().any(|axis| axis.size == 0) {
            return None;
        }
        let (mut lo, mut hi) = (self.offset, self.offset);
        for axis in &axes {
            let (min, max) = match axis.indexer {
                Indexer::Irregular(positions) => positions
                    .iter()
                    .fold((isize::MAX, isize::MIN), |(min, max), &p| (min.min(p), max.max(p))),
                indexer => {
                    let last = indexer.get(axis.size - 1);
                    (last.min(0), last.max(0))
                }
            };
            lo += min * axis.stride;
            hi += max * axis.stride;
        }
        Some((lo, hi))
    }

    /// Fails unless every element lies within a buffer of `len`
    /// elements. Layouts built in fast mode from invalid spans may
    /// not.
    pub(crate) fn check_storage(&self, len: usize) -> Result<(), ArrayError> {
        match self.extent() {
            Some((lo, _)) if lo < 0 => Err(ArrayError::OffsetOutOfStorage { offset: lo, len }),
            Some((_, hi)) if hi >= len as isize => {
                Err(ArrayError::OffsetOutOfStorage { offset: hi, len })
            }
            _ => Ok(()),
        }
    }

    /// Surviving axes, outermost first, with their base strides.
    fn axes(&self) -> Vec<Axis<'_>> {
        let mut stride = 1isize;
        let mut axes = Vec::new();
        for (ix, &d) in self.indexers.iter().zip(&self.base_dims).rev() {
            if !ix.is_scalar() {
                axes.push(Axis {
                    indexer: ix,
                    size: ix.size(d),
                    stride,
                });
            }
            stride *= d as isize;
        }
        axes.reverse();
        axes
    }

    /// Apply `spans` to the surviving axes, left to right.
    pub fn collapse(&self, spans: &[Span], mode: CheckMode) -> Result<ViewLayout, ArrayError> {
        let depth = self.depth();
        if spans.len() > depth {
            return Err(ArrayError::TooManySpans {
                given: spans.len(),
                depth,
            });
        }

        let mut spans = spans.iter();
        let mut offset = 0isize;
        let mut indexers = Vec::with_capacity(self.indexers.len());
        for (ix, &d) in self.indexers.iter().zip(&self.base_dims) {
            offset *= d as isize;
            if ix.is_scalar() {
                indexers.push(Indexer::Scalar);
                continue;
            }
            let (delta, next) = match spans.next() {
                Some(span) => ix.collapse(d, span, mode)?,
                None => (0, ix.clone()),
            };
            offset += delta;
            indexers.push(next);
        }

        Ok(ViewLayout {
            id: self.id,
            base_dims: self.base_dims.clone(),
            indexers,
            offset: self.offset + offset,
        })
    }

    /// Fix the outermost surviving axis at `index`, which must be in
    /// range.
    pub(crate) fn fix_outer(&self, index: usize) -> ViewLayout {
        let mut layout = self.clone();
        let mut delta = 0isize;
        let mut fixed = false;
        for (ix, &d) in layout.indexers.iter_mut().zip(&self.base_dims) {
            delta *= d as isize;
            if !fixed && !ix.is_scalar() {
                delta += ix.get(index);
                *ix = Indexer::Scalar;
                fixed = true;
            }
        }
        layout.offset += delta;
        layout
    }

    /// The absolute offset of the element at `coords`, one per
    /// surviving axis. Negative coordinates count from the end.
    pub fn position(&self, coords: &[isize], mode: CheckMode) -> Result<isize, ArrayError> {
        let depth = self.depth();
        if coords.len() != depth {
            return Err(ArrayError::RankMismatch {
                expected: depth,
                actual: coords.len(),
            });
        }

        let mut coords = coords.iter().enumerate();
        let mut rel = 0isize;
        for (ix, &d) in self.indexers.iter().zip(&self.base_dims) {
            rel *= d as isize;
            if ix.is_scalar() {
                continue;
            }
            let Some((axis, &index)) = coords.next() else {
                break;
            };
            let len = ix.size(d);
            let wrapped = wrap_negative(index, len as isize);
            let out_of_bounds = ArrayError::IndexOutOfBounds { axis, index, len };
            if mode.is_strict() && !(0 <= wrapped && wrapped < len as isize) {
                return Err(out_of_bounds);
            }
            rel += ix.lookup(wrapped).ok_or(out_of_bounds)?;
        }
        Ok(self.offset + rel)
    }

    /// The absolute offset of the element at in-range `coords`.
    pub(crate) fn offset_of(&self, coords: &[usize]) -> isize {
        let mut coords = coords.iter();
        let mut rel = 0isize;
        for (ix, &d) in self.indexers.iter().zip(&self.base_dims) {
            rel *= d as isize;
            if !ix.is_scalar() {
                rel += ix.get(coords.next().copied().unwrap_or(0));
            }
        }
        self.offset + rel
    }

    /// The absolute offset of the `flat`th element in element order.
    pub fn offset_at(&self, flat: usize) -> isize {
        if let Some(stride) = self.stride() {
            return self.offset + flat as isize * stride;
        }
        let dims = self.dims();
        let mut coords = vec![0; dims.len()];
        let mut rest = flat;
        for (c, &d) in coords.iter_mut().zip(&dims).rev() {
            if d > 0 {
                *c = rest % d;
                rest /= d;
            }
        }
        self.offset_of(&coords)
    }

    /// Visit the absolute offset of every element, in element order.
    /// Strided innermost axes are walked by stepping; irregular ones
    /// through their position lists.
    pub fn traverse(&self, mut f: impl FnMut(isize)) {
        if let Some(stride) = self.stride() {
            for i in 0..self.size() as isize {
                f(self.offset + i * stride);
            }
            return;
        }
        walk(&self.axes(), self.offset, &mut f);
    }
}

fn walk<F: FnMut(isize)>(axes: &[Axis<'_>], base: isize, f: &mut F) {
    match axes {
        [] => f(base),
        [axis] => match axis.indexer.step() {
            Some(step) => {
                let step = step * axis.stride;
                for i in 0..axis.size as isize {
                    f(base + i * step);
                }
            }
            None => {
                for i in 0..axis.size {
                    f(base + axis.indexer.get(i) * axis.stride);
                }
            }
        },
        [axis, rest @ ..] => {
            for i in 0..axis.size {
                walk(rest, base + axis.indexer.get(i) * axis.stride, f);
            }
        }
    }
}
