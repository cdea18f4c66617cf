/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Storage classification of views.
//!
//! A view is classified by folding over its per-axis indexer kinds
//! from the outermost axis inward. The fold answers one question:
//! can the surviving elements still be reached from one base offset
//! with one stride?
//!
//! ```text
//!   state \ next   Scalar     All        Simple     Regular    Irregular
//!   (scalar)       (scalar)   Simple     Simple     Regular    Irregular
//!   Simple         Regular    Simple     Irregular  Irregular  Irregular
//!   Regular        Regular    Irregular  Irregular  Irregular  Irregular
//!   Irregular      Irregular  Irregular  Irregular  Irregular  Irregular
//! ```
//!
//! A `Simple` prefix followed by a fixed axis leaves a gap between
//! runs, which turns it `Regular`; any further surviving axis after
//! that point breaks the single-stride property. A fold that never
//! leaves the initial state (every axis fixed) describes one element
//! and is `Simple`.

use serde::Deserialize;
use serde::Serialize;

use crate::indexer::IndexerKind;

/// How the elements of a view are laid out in their base storage.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ViewKind {
    /// One contiguous run; stride 1.
    Simple,
    /// One run with a fixed, possibly negative, stride.
    Regular,
    /// No single stride describes the element sequence.
    Irregular,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum State {
    Scalar,
    Simple,
    Regular,
    Irregular,
}

impl State {
    fn next(self, kind: IndexerKind) -> State {
        use IndexerKind as K;
        match (self, kind) {
            (State::Scalar, K::Scalar) => State::Scalar,
            (State::Scalar, K::All | K::Simple) => State::Simple,
            (State::Scalar, K::Regular) => State::Regular,
            (State::Scalar, K::Irregular) => State::Irregular,

            (State::Simple, K::Scalar) => State::Regular,
            (State::Simple, K::All) => State::Simple,
            (State::Simple, _) => State::Irregular,

            (State::Regular, K::Scalar) => State::Regular,
            (State::Regular, _) => State::Irregular,

            (State::Irregular, _) => State::Irregular,
        }
    }
}

impl ViewKind {
    /// Classify a sequence of indexer kinds, outermost axis first.
    pub fn classify<I>(kinds: I) -> ViewKind
    where
        I: IntoIterator<Item = IndexerKind>,
    {
        match kinds.into_iter().fold(State::Scalar, State::next) {
            State::Scalar | State::Simple => ViewKind::Simple,
            State::Regular => ViewKind::Regular,
            State::Irregular => ViewKind::Irregular,
        }
    }

    /// Classify the sub-views obtained by fixing the outer `level`
    /// surviving axes.
    pub fn classify_prefix<I>(kinds: I, level: usize) -> ViewKind
    where
        I: IntoIterator<Item = IndexerKind>,
    {
        let mut fixed = 0;
        ViewKind::classify(kinds.into_iter().map(|kind| {
            if kind != IndexerKind::Scalar && fixed < level {
                fixed += 1;
                IndexerKind::Scalar
            } else {
                kind
            }
        }))
    }

    /// Whether a single stride describes the element sequence.
    pub fn is_strided(self) -> bool {
        !matches!(self, ViewKind::Irregular)
    }
}
