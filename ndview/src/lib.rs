/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Fixed-rank multi-dimensional arrays with zero-copy views.
//!
//! An [`Array<T, D>`] owns row-major storage for rank `D`. Slicing it
//! with one [`Span`] per axis produces a view: the storage is
//! borrowed, and a [`ViewLayout`] records how to reach the selected
//! elements.
//!
//! ```text
//!   spans ──▶ Span::resolve ──▶ Indexer::collapse (per axis)
//!                                     │
//!                                     ▼
//!              ViewLayout { id, base dims, indexers, offset }
//!                │            │             │
//!                ▼            ▼             ▼
//!             ViewKind     position      traverse / Iter
//!         (Simple, Regular,  (O(depth))   (element order)
//!            Irregular)
//! ```
//!
//! Re-slicing a view composes the new spans with the existing
//! indexers, so any chain of slices addresses the base storage
//! directly. Copies between views of the same array are planned
//! ([`plan_copy`]) so that overlapping source and destination behave
//! as if the source were read in full first.
//!
//! ```
//! use ndview::Span;
//! use ndview::range;
//! use ndview::reshape;
//!
//! let mut a = reshape(range(0, 100), [10, 10]).unwrap();
//! assert_eq!(*a.at([3, 4]).unwrap(), 34);
//!
//! a.assign((.., 1), (.., 3)).unwrap();
//! let col: Vec<i32> = a.view((.., 1)).unwrap().to_vec();
//! assert_eq!(col[..3], [3, 13, 23]);
//!
//! let back = a.view((Span::stepped(-1, -1, -1), 0)).unwrap();
//! assert_eq!(back.to_vec()[0], 90);
//! ```
//!
//! Logical validation of spans and coordinates follows the process
//! wide [`CheckMode`], configured through [`config`].

pub mod array;
pub mod config;
pub mod construct;
pub mod copy;
pub mod cursor;
pub mod indexer;
pub mod iter;
pub mod kind;
pub mod layout;
pub mod rearrange;
pub mod span;
pub mod view;

#[cfg(test)]
mod strategy;

pub use array::Array;
pub use array::ArrayError;
pub use array::ArrayId;
pub use config::CheckMode;
pub use config::Config;
pub use construct::range;
pub use construct::range_step;
pub use construct::table;
pub use construct::table2;
pub use construct::table3;
pub use construct::table_const;
pub use copy::CopyPlan;
pub use copy::Operand;
pub use copy::OperandKind;
pub use copy::Source;
pub use copy::plan_copy;
pub use cursor::ElementCursor;
pub use cursor::IndexCounter;
pub use indexer::Indexer;
pub use indexer::IndexerKind;
pub use iter::Iter;
pub use iter::Offsets;
pub use iter::OuterIter;
pub use kind::ViewKind;
pub use layout::ViewLayout;
pub use rearrange::IntoStorage;
pub use rearrange::flatten;
pub use rearrange::make_array;
pub use rearrange::partition;
pub use rearrange::reshape;
pub use span::ALL;
pub use span::IntoSpans;
pub use span::REVERSED;
pub use span::Span;
pub use span::SpanError;
pub use span::SpanList;
pub use view::ArrayView;
pub use view::ArrayViewMut;
pub use view::Part;
