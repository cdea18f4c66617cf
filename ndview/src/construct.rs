/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Convenience constructors built on [`Array`].

use num_traits::Bounded;
use num_traits::Num;

use crate::array::Array;
use crate::array::ArrayError;
use crate::copy::Source;
use crate::span::SpanError;

/// The values `first, first + 1, ...` strictly before `last`. Empty
/// when `last <= first`.
///
/// ```
/// let r = ndview::range(2, 6);
/// assert_eq!(r.as_slice(), &[2, 3, 4, 5]);
/// ```
pub fn range<T>(first: T, last: T) -> Array<T, 1>
where
    T: Num + PartialOrd + Copy,
{
    let mut values = Vec::new();
    let mut value = first;
    while value < last {
        values.push(value);
        value = value + T::one();
    }
    Array::from(values)
}

/// The values `first + k * step` that lie strictly before `last` in
/// the direction of `step`. Never steps past the bounds of `T`.
///
/// ```
/// let r = ndview::range_step(250u8, 255, 2).unwrap();
/// assert_eq!(r.as_slice(), &[250, 252, 254]);
/// ```
pub fn range_step<T>(first: T, last: T, step: T) -> Result<Array<T, 1>, ArrayError>
where
    T: Num + Bounded + PartialOrd + Copy,
{
    if step == T::zero() {
        return Err(SpanError::ZeroStep.into());
    }
    let ascending = step > T::zero();
    let inside = |value: T| if ascending { value < last } else { value > last };

    let mut values = Vec::new();
    if !inside(first) {
        return Ok(Array::from(values));
    }
    let mut value = first;
    loop {
        values.push(value);
        // `value + step` stays inside exactly when `value` lies
        // before `last - step`, which must itself be representable.
        let has_next = if ascending {
            last >= T::min_value() + step && value < last - step
        } else {
            last <= T::max_value() + step && value > last - step
        };
        if !has_next {
            break;
        }
        value = value + step;
    }
    Ok(Array::from(values))
}

/// An array holding `value` at every position.
pub fn table_const<T: Clone, const D: usize>(value: T, dims: [usize; D]) -> Array<T, D> {
    Array::from_elem(dims, value)
}

/// `result[i] = f(a[i])`, over the elements of `a` in element order.
pub fn table<A, R>(mut f: impl FnMut(&A::Elem) -> R, a: &A) -> Array<R, 1>
where
    A: Source + ?Sized,
{
    Array::from(a.elements().map(|x| f(x)).collect::<Vec<_>>())
}

/// `result[i, j] = f(a[i], b[j])`.
pub fn table2<A, B, R>(mut f: impl FnMut(&A::Elem, &B::Elem) -> R, a: &A, b: &B) -> Array<R, 2>
where
    A: Source + ?Sized,
    B: Source + ?Sized,
{
    let (na, nb) = (a.elements().len(), b.elements().len());
    let mut data = Vec::with_capacity(na * nb);
    for x in a.elements() {
        for y in b.elements() {
            data.push(f(x, y));
        }
    }
    Array::from_raw(data, [na, nb])
}

/// `result[i, j, k] = f(a[i], b[j], c[k])`.
pub fn table3<A, B, C, R>(
    mut f: impl FnMut(&A::Elem, &B::Elem, &C::Elem) -> R,
    a: &A,
    b: &B,
    c: &C,
) -> Array<R, 3>
where
    A: Source + ?Sized,
    B: Source + ?Sized,
    C: Source + ?Sized,
{
    let dims = [a.elements().len(), b.elements().len(), c.elements().len()];
    let mut data = Vec::with_capacity(dims.iter().product());
    for x in a.elements() {
        for y in b.elements() {
            for z in c.elements() {
                data.push(f(x, y, z));
            }
        }
    }
    Array::from_raw(data, dims)
}
