/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Aliasing-aware copies.
//!
//! A copy must behave as if the whole source had been read before
//! the first destination element is written, even when both operands
//! share one buffer (`a(All, 0) = a(All, 3)`). [`plan_copy`] decides
//! from the operands alone whether a direct element-by-element copy
//! is safe or whether the source must be staged through a temporary
//! buffer first:
//!
//! 1. Different arrays never overlap: copy directly.
//! 2. An array assigned to itself is a no-op.
//! 3. A whole array on either side, or an irregular operand, is
//!    staged: overlap is not analyzed.
//! 4. Two strided views of one array are copied directly when they
//!    provably share no element. With equal strides this holds when
//!    their starting offsets differ by a non-multiple of the stride;
//!    otherwise the address ranges they span must be disjoint.
//!
//! Staged elements are converted to the destination element type
//! once, while staging.

use crate::array::Array;
use crate::array::ArrayError;
use crate::array::ArrayId;
use crate::iter::Iter;
use crate::iter::Offsets;
use crate::kind::ViewKind;
use crate::layout::ViewLayout;
use crate::view::ArrayView;
use crate::view::ArrayViewMut;

pub(crate) mod sealed {
    // Only arrays and views of this crate can be copy sources.
    pub trait Sealed {}
}

/// The storage class of a copy operand.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OperandKind {
    /// A whole array, in order.
    Array,
    Simple,
    Regular,
    Irregular,
}

/// What [`plan_copy`] needs to know about one side of a copy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Operand {
    pub id: ArrayId,
    pub kind: OperandKind,
    /// Offset of the first element.
    pub offset: isize,
    /// Distance between consecutive elements; meaningful for strided
    /// kinds only.
    pub stride: isize,
    pub len: usize,
}

impl Operand {
    /// A whole array of `len` elements.
    pub fn array(id: ArrayId, len: usize) -> Self {
        Self {
            id,
            kind: OperandKind::Array,
            offset: 0,
            stride: 1,
            len,
        }
    }

    /// The operand described by a view layout.
    pub fn of_layout(layout: &ViewLayout) -> Self {
        let len = layout.size();
        if layout.is_full() {
            return Self::array(layout.id(), len);
        }
        let (kind, stride) = match (layout.kind(), layout.stride()) {
            (ViewKind::Simple, _) => (OperandKind::Simple, 1),
            (ViewKind::Regular, Some(stride)) => (OperandKind::Regular, stride),
            _ => (OperandKind::Irregular, 0),
        };
        Self {
            id: layout.id(),
            kind,
            offset: layout.offset(),
            stride,
            len,
        }
    }

    fn is_strided(&self) -> bool {
        matches!(self.kind, OperandKind::Simple | OperandKind::Regular)
    }

    /// Lowest and highest offsets touched; `None` when empty.
    fn extent(&self) -> Option<(isize, isize)> {
        if self.len == 0 {
            return None;
        }
        let last = self.offset + (self.len as isize - 1) * self.stride;
        Some((self.offset.min(last), self.offset.max(last)))
    }
}

/// How to carry out a copy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CopyPlan {
    /// Nothing to do.
    Skip,
    /// Read and write element by element.
    Direct,
    /// Read the whole source into a temporary, then write.
    Staged,
}

/// Decide how to copy `src` into `dst`.
pub fn plan_copy(src: &Operand, dst: &Operand) -> CopyPlan {
    if src.id != dst.id {
        return CopyPlan::Direct;
    }
    if src.kind == OperandKind::Array && dst.kind == OperandKind::Array {
        return CopyPlan::Skip;
    }
    if !src.is_strided() || !dst.is_strided() {
        return CopyPlan::Staged;
    }

    let (Some((src_lo, src_hi)), Some((dst_lo, dst_hi))) = (src.extent(), dst.extent()) else {
        return CopyPlan::Direct;
    };
    if src.stride == dst.stride && src.stride != 0 && (src.offset - dst.offset) % src.stride != 0 {
        return CopyPlan::Direct;
    }
    if src_hi < dst_lo || dst_hi < src_lo {
        return CopyPlan::Direct;
    }
    CopyPlan::Staged
}

/// Something elements can be copied out of: an array or a view.
pub trait Source: sealed::Sealed {
    type Elem;

    /// Identity of the underlying array.
    fn id(&self) -> ArrayId;

    /// Dimensions of the elements produced.
    fn dims(&self) -> Vec<usize>;

    /// Description for [`plan_copy`].
    fn operand(&self) -> Operand;

    /// The elements, in element order.
    fn elements(&self) -> Iter<'_, Self::Elem>;
}

impl<T, const D: usize> sealed::Sealed for Array<T, D> {}

impl<T, const D: usize> Source for Array<T, D> {
    type Elem = T;

    fn id(&self) -> ArrayId {
        Array::id(self)
    }

    fn dims(&self) -> Vec<usize> {
        Array::dims(self).to_vec()
    }

    fn operand(&self) -> Operand {
        Operand::array(Array::id(self), self.size())
    }

    fn elements(&self) -> Iter<'_, T> {
        Iter::new(self.as_slice(), self.layout())
    }
}

impl<T> sealed::Sealed for ArrayView<'_, T> {}

impl<T> Source for ArrayView<'_, T> {
    type Elem = T;

    fn id(&self) -> ArrayId {
        self.layout().id()
    }

    fn dims(&self) -> Vec<usize> {
        self.layout().dims()
    }

    fn operand(&self) -> Operand {
        Operand::of_layout(self.layout())
    }

    fn elements(&self) -> Iter<'_, T> {
        self.iter()
    }
}

impl<T> sealed::Sealed for ArrayViewMut<'_, T> {}

impl<T> Source for ArrayViewMut<'_, T> {
    type Elem = T;

    fn id(&self) -> ArrayId {
        self.layout().id()
    }

    fn dims(&self) -> Vec<usize> {
        self.layout().dims()
    }

    fn operand(&self) -> Operand {
        Operand::of_layout(self.layout())
    }

    fn elements(&self) -> Iter<'_, T> {
        self.as_view().iter()
    }
}

fn check_dims(expected: Vec<usize>, actual: Vec<usize>) -> Result<(), ArrayError> {
    if expected != actual {
        return Err(ArrayError::ShapeMismatch { expected, actual });
    }
    Ok(())
}

/// Copy the `src` region of `data` onto its `dst` region.
pub(crate) fn copy_within<T: Clone>(
    data: &mut [T],
    src: &ViewLayout,
    dst: &ViewLayout,
) -> Result<(), ArrayError> {
    check_dims(dst.dims(), src.dims())?;

    let (src_op, dst_op) = (Operand::of_layout(src), Operand::of_layout(dst));
    let plan = plan_copy(&src_op, &dst_op);
    if plan != CopyPlan::Direct {
        tracing::debug!("{:?} copy from {:?} to {:?}", plan, src_op, dst_op);
    }

    match plan {
        CopyPlan::Skip => {}
        CopyPlan::Direct => {
            for (from, to) in Offsets::new(src.clone()).zip(Offsets::new(dst.clone())) {
                data[to as usize] = data[from as usize].clone();
            }
        }
        CopyPlan::Staged => {
            let staged: Vec<T> = Iter::new(data, src.clone()).cloned().collect();
            write_all(data, dst, staged);
        }
    }
    Ok(())
}

/// Copy the elements of `src`, converted, onto the `dst` region of
/// `data`. `data` must not be borrowed by `src`.
pub(crate) fn copy_from_source<S, T>(
    src: &S,
    data: &mut [T],
    dst: &ViewLayout,
) -> Result<(), ArrayError>
where
    S: Source + ?Sized,
    S::Elem: Clone + Into<T>,
{
    check_dims(dst.dims(), src.dims())?;

    let (src_op, dst_op) = (src.operand(), Operand::of_layout(dst));
    match plan_copy(&src_op, &dst_op) {
        CopyPlan::Skip => {}
        CopyPlan::Direct => {
            for (value, to) in src.elements().zip(Offsets::new(dst.clone())) {
                data[to as usize] = value.clone().into();
            }
        }
        CopyPlan::Staged => {
            tracing::debug!("staged copy from {:?} to {:?}", src_op, dst_op);
            let staged: Vec<T> = src.elements().map(|value| value.clone().into()).collect();
            write_all(data, dst, staged);
        }
    }
    Ok(())
}

fn write_all<T>(data: &mut [T], dst: &ViewLayout, values: Vec<T>) {
    for (value, to) in values.into_iter().zip(Offsets::new(dst.clone())) {
        data[to as usize] = value;
    }
}
