/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Resolved per-axis access descriptors.
//!
//! Every view keeps one [`Indexer`] per axis of its base array. An
//! indexer maps a coordinate along the surviving axis to a base
//! coordinate *relative to the view's offset*. Applying a new span to
//! an axis ([`Indexer::collapse`]) yields a replacement indexer plus a
//! scalar offset in the old indexer's coordinate space:
//!
//! ```text
//!   span ↓ / indexer →   All, Simple        Regular            Irregular
//!   All                  unchanged          unchanged          unchanged
//!   Scalar               Scalar             Scalar             Scalar
//!   Simple               Simple             Regular(step)      Irregular(sub-list)
//!   Regular              Regular(k)         Regular(k·step)    Irregular(gathered)
//!   Irregular            Irregular(mapped)  Irregular(mapped)  Irregular(mapped)
//! ```
//!
//! Irregular results carry their positions explicitly and report an
//! offset of zero.

use serde::Deserialize;
use serde::Serialize;

use crate::config::CheckMode;
use crate::span::Resolved;
use crate::span::Span;
use crate::span::SpanError;

/// Storage-facing descriptor for one base axis.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Indexer {
    /// The axis is fixed; it contributes only an offset.
    Scalar,
    /// The whole base axis, in order.
    All,
    /// A contiguous run of `size` positions.
    Simple { size: usize },
    /// `size` positions `0, step, 2·step, ...`; `step` may be negative.
    Regular { size: usize, step: isize },
    /// Explicit relative base positions. Values may be negative when
    /// gathered through a reversed axis, and may repeat.
    Irregular(Vec<isize>),
}

/// The variant of an [`Indexer`], without its payload.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IndexerKind {
    Scalar,
    All,
    Simple,
    Regular,
    Irregular,
}

impl Indexer {
    pub fn kind(&self) -> IndexerKind {
        match self {
            Indexer::Scalar => IndexerKind::Scalar,
            Indexer::All => IndexerKind::All,
            Indexer::Simple { .. } => IndexerKind::Simple,
            Indexer::Regular { .. } => IndexerKind::Regular,
            Indexer::Irregular(_) => IndexerKind::Irregular,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Indexer::Scalar)
    }

    /// The axis length after slicing, given the base axis length. A
    /// collapsed axis counts as a single element.
    pub fn size(&self, base: usize) -> usize {
        match self {
            Indexer::Scalar => 1,
            Indexer::All => base,
            Indexer::Simple { size } | Indexer::Regular { size, .. } => *size,
            Indexer::Irregular(positions) => positions.len(),
        }
    }

    /// The distance between consecutive positions, if uniform.
    pub fn step(&self) -> Option<isize> {
        match self {
            Indexer::All | Indexer::Simple { .. } => Some(1),
            Indexer::Regular { step, .. } => Some(*step),
            Indexer::Scalar | Indexer::Irregular(_) => None,
        }
    }

    /// The relative base position of the `i`th surviving element.
    ///
    /// # Panics
    ///
    /// Panics if the indexer is irregular and `i` is past its end.
    pub fn get(&self, i: usize) -> isize {
        match self {
            Indexer::Scalar => 0,
            Indexer::All | Indexer::Simple { .. } => i as isize,
            Indexer::Regular { step, .. } => i as isize * step,
            Indexer::Irregular(positions) => positions[i],
        }
    }

    /// Like [`get`](Self::get), but `None` instead of panicking when
    /// an irregular list has no such entry.
    pub(crate) fn lookup(&self, i: isize) -> Option<isize> {
        match self {
            Indexer::Irregular(positions) => usize::try_from(i)
                .ok()
                .and_then(|i| positions.get(i))
                .copied(),
            Indexer::Regular { step, .. } => Some(i * step),
            Indexer::Scalar => Some(0),
            Indexer::All | Indexer::Simple { .. } => Some(i),
        }
    }

    /// Apply `span` to this axis. `base` is the length of the base
    /// axis. Returns the offset, in this indexer's relative base
    /// coordinates, together with the replacement indexer.
    pub fn collapse(
        &self,
        base: usize,
        span: &Span,
        mode: CheckMode,
    ) -> Result<(isize, Indexer), SpanError> {
        if self.is_scalar() {
            return Err(SpanError::CollapsedAxis);
        }
        let len = self.size(base);
        let resolved = span.resolve(len, mode)?;

        match (resolved, self) {
            (Resolved::All, _) => Ok((0, self.clone())),
            (Resolved::Scalar(position), _) => Ok((self.fetch(position, len)?, Indexer::Scalar)),

            (Resolved::Simple { first, size }, Indexer::All | Indexer::Simple { .. }) => {
                Ok((first, Indexer::Simple { size }))
            }
            (Resolved::Simple { first, size }, Indexer::Regular { step, .. }) => Ok((
                first * step,
                Indexer::Regular { size, step: *step },
            )),
            (Resolved::Simple { first, size }, _) => {
                let positions = self.gather((0..size as isize).map(|i| first + i), len)?;
                Ok((0, Indexer::Irregular(positions)))
            }

            (Resolved::Regular { first, size, step }, Indexer::All | Indexer::Simple { .. }) => {
                Ok((first, Indexer::Regular { size, step }))
            }
            (Resolved::Regular { first, size, step }, Indexer::Regular { step: inner, .. }) => Ok((
                first * inner,
                Indexer::Regular {
                    size,
                    step: step * inner,
                },
            )),
            (Resolved::Regular { first, size, step }, _) => {
                let positions = self.gather((0..size as isize).map(|i| first + i * step), len)?;
                Ok((0, Indexer::Irregular(positions)))
            }

            (Resolved::Irregular(indices), _) => {
                let positions = self.gather(indices.into_iter(), len)?;
                Ok((0, Indexer::Irregular(positions)))
            }
        }
    }

    fn fetch(&self, position: isize, len: usize) -> Result<isize, SpanError> {
        self.lookup(position).ok_or(SpanError::IndexOutOfBounds {
            index: position,
            len,
        })
    }

    fn gather(
        &self,
        positions: impl Iterator<Item = isize>,
        len: usize,
    ) -> Result<Vec<isize>, SpanError> {
        positions.map(|p| self.fetch(p, len)).collect()
    }
}
