/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Positions within a view.
//!
//! Strided views locate their `i`th element directly, so a position
//! is just `i`. Irregular views carry an [`IndexCounter`]: one digit
//! per surviving axis, innermost axis least significant.
//!
//! ```text
//!   dims = [2, 3]
//!
//!   [0,0] → [0,1] → [0,2] → [1,0] → [1,1] → [1,2] → [2,0]
//!                        carry                      end
//! ```
//!
//! Stepping by one touches the innermost digit and carries (or
//! borrows) outward only on wraparound, which is O(1) amortized.
//! Advancing by `n` and measuring distances are O(depth). The
//! outermost digit may reach its dimension; that state is the
//! past-the-end position.

use std::cmp::Ordering;

/// A fixed-radix positional counter over the coordinates of a view.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct IndexCounter {
    digits: Vec<usize>,
    dims: Vec<usize>,
    size: usize,
}

impl IndexCounter {
    /// A counter at the first element of a view with dimensions
    /// `dims`. An empty `dims` describes a single element.
    pub fn new(dims: &[usize]) -> Self {
        let dims = if dims.is_empty() {
            vec![1]
        } else {
            dims.to_vec()
        };
        Self {
            digits: vec![0; dims.len()],
            size: dims.iter().product(),
            dims,
        }
    }

    /// A counter one past the last element.
    pub fn end(dims: &[usize]) -> Self {
        let mut counter = Self::new(dims);
        if counter.size > 0 {
            counter.digits[0] = counter.dims[0];
        }
        counter
    }

    /// Current coordinates, outermost first.
    pub fn coords(&self) -> &[usize] {
        &self.digits
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Whether the counter is past the last element.
    pub fn is_end(&self) -> bool {
        self.size == 0 || self.digits[0] >= self.dims[0]
    }

    /// The flat position in element order.
    pub fn linear(&self) -> isize {
        self.digits
            .iter()
            .zip(&self.dims)
            .fold(0isize, |acc, (&digit, &dim)| {
                acc * dim as isize + digit as isize
            })
    }

    /// Step to the next element. Returns false, leaving the counter
    /// unchanged, when already at the end.
    pub fn increment(&mut self) -> bool {
        if self.is_end() {
            return false;
        }
        for k in (1..self.digits.len()).rev() {
            self.digits[k] += 1;
            if self.digits[k] < self.dims[k] {
                return true;
            }
            self.digits[k] = 0;
        }
        self.digits[0] += 1;
        true
    }

    /// Step to the previous element. Returns false, leaving the
    /// counter unchanged, when already at the first element.
    pub fn decrement(&mut self) -> bool {
        let Some(k) = self.digits.iter().rposition(|&digit| digit > 0) else {
            return false;
        };
        self.digits[k] -= 1;
        for j in k + 1..self.digits.len() {
            self.digits[j] = self.dims[j] - 1;
        }
        true
    }

    /// Move by `n` elements. Returns false, leaving the counter
    /// unchanged, if the target lies outside `[begin, end]`.
    pub fn advance(&mut self, n: isize) -> bool {
        let target = self.linear() + n;
        if target < 0 || target > self.size as isize {
            return false;
        }
        let mut carry = n;
        for k in (1..self.digits.len()).rev() {
            if carry == 0 {
                return true;
            }
            let dim = self.dims[k] as isize;
            let value = self.digits[k] as isize + carry;
            self.digits[k] = value.rem_euclid(dim) as usize;
            carry = value.div_euclid(dim);
        }
        self.digits[0] = (self.digits[0] as isize + carry) as usize;
        true
    }

    /// The number of elements from `other` to `self`, computed digit
    /// by digit: `dim · diff(outer) + diff`.
    pub fn distance(&self, other: &IndexCounter) -> isize {
        self.digits
            .iter()
            .zip(&other.digits)
            .zip(&self.dims)
            .fold(0isize, |acc, ((&a, &b), &dim)| {
                acc * dim as isize + (a as isize - b as isize)
            })
    }
}

impl PartialOrd for IndexCounter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexCounter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits.cmp(&other.digits)
    }
}

/// A position within a view, in the representation suited to its
/// storage kind.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ElementCursor {
    /// Flat element index of a strided view; the element lives at
    /// `offset + index · stride`.
    Linear(usize),
    /// Coordinates within an irregular view.
    Counter(IndexCounter),
}

impl ElementCursor {
    pub(crate) fn step_forward(&mut self) {
        match self {
            ElementCursor::Linear(index) => *index += 1,
            ElementCursor::Counter(counter) => {
                counter.increment();
            }
        }
    }

    pub(crate) fn step_back(&mut self) {
        match self {
            ElementCursor::Linear(index) => *index -= 1,
            ElementCursor::Counter(counter) => {
                counter.decrement();
            }
        }
    }

    pub(crate) fn advance(&mut self, n: isize) {
        match self {
            ElementCursor::Linear(index) => *index = (*index as isize + n) as usize,
            ElementCursor::Counter(counter) => {
                counter.advance(n);
            }
        }
    }

    /// Flat element index of this position.
    pub fn linear(&self) -> isize {
        match self {
            ElementCursor::Linear(index) => *index as isize,
            ElementCursor::Counter(counter) => counter.linear(),
        }
    }
}
