/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for [`Span`]s and array dimensions.
//!
//! Every span produced here is valid under [`CheckMode::Strict`] for
//! the axis length it was generated against, so property tests can
//! `unwrap` the views they build and concentrate on comparing
//! results.
//!
//! Example usage:
//!
//! ```ignore
//! use proptest::prelude::*;
//!
//! use crate::strategy::gen_span;
//!
//! proptest! {
//!     #[test]
//!     fn test_span(s in gen_span(8)) {
//!         // Apply `s` to an axis of length 8.
//!     }
//! }
//! ```
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::array::ArrayId;
use crate::config::CheckMode;
use crate::layout::ViewLayout;
use crate::span::Span;

/// Dimensions of rank `rank`, each in `1..=max`.
pub fn gen_dims(rank: usize, max: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1..=max, rank)
}

/// Any span that survives as an axis (everything but `Scalar`),
/// valid for an axis of length `len`. Bounds are randomly written
/// in their negative (from the end) form.
pub fn gen_nonscalar_span(len: usize) -> BoxedStrategy<Span> {
    let n = len as isize;
    if len == 0 {
        return prop_oneof![Just(Span::All), Just(Span::list(Vec::new()))].boxed();
    }

    let simple = (1..=n)
        .prop_flat_map(move |last| (0..=last, Just(last), any::<bool>(), any::<bool>()))
        .prop_map(move |(first, last, neg_first, neg_last)| Span::Simple {
            first: if neg_first && first < n { first - n } else { first },
            last: if neg_last { last - n } else { last },
        })
        .boxed();

    let forward = (1..=n, 1..=3isize)
        .prop_flat_map(|(last, step)| (0..=last, Just(last), Just(step)))
        .prop_map(|(first, last, step)| Span::Regular { first, last, step })
        .boxed();

    let backward = (0..n, 1..=3isize)
        .prop_flat_map(|(first, step)| (Just(first), -1..=first, Just(step)))
        .prop_map(|(first, last, step)| Span::Regular {
            first,
            last,
            step: -step,
        })
        .boxed();

    let list = prop::collection::vec(0..n, 0..=4)
        .prop_map(Span::list)
        .boxed();

    prop_oneof![
        1 => Just(Span::All),
        3 => simple,
        2 => forward,
        2 => backward,
        2 => list,
    ]
    .boxed()
}

/// Like [`gen_nonscalar_span`], but may also fix the axis with a
/// (possibly negative) scalar.
pub fn gen_span(len: usize) -> BoxedStrategy<Span> {
    if len == 0 {
        return gen_nonscalar_span(len);
    }
    let n = len as isize;
    prop_oneof![
        4 => gen_nonscalar_span(len),
        1 => (-n..n).prop_map(Span::Scalar),
    ]
    .boxed()
}

/// One span per axis of `dims`.
pub fn gen_spans(dims: &[usize], scalars: bool) -> BoxedStrategy<Vec<Span>> {
    dims.iter()
        .map(|&len| {
            if scalars {
                gen_span(len)
            } else {
                gen_nonscalar_span(len)
            }
        })
        .collect::<Vec<_>>()
        .boxed()
}

/// A span selecting exactly `size` elements of an axis of length
/// `len`: a contiguous or strided run in either direction, or an
/// index list. Requires `1 <= size <= len`.
pub fn gen_sized_span(len: usize, size: usize) -> BoxedStrategy<Span> {
    let n = len as isize;
    let k = size as isize;
    let max_step = if k == 1 { 3 } else { ((n - 1) / (k - 1)).min(3) };

    let forward = (1..=max_step)
        .prop_flat_map(move |step| (0..n - (k - 1) * step, Just(step)))
        .prop_map(move |(first, step)| Span::Regular {
            first,
            last: first + (k - 1) * step + 1,
            step,
        });

    let backward = (1..=max_step)
        .prop_flat_map(move |step| ((k - 1) * step..n, Just(step)))
        .prop_map(move |(first, step)| Span::Regular {
            first,
            last: first - (k - 1) * step - 1,
            step: -step,
        });

    let list = prop::collection::vec(0..n, size).prop_map(Span::list);

    prop_oneof![forward, backward, list].boxed()
}

/// Two span pairs selecting equally shaped regions of one `[rows,
/// cols]` array: blocks, single columns or single rows. Columns and
/// rows of a 2-D array are strided views at depth one, blocks are
/// depth two.
pub fn gen_matching_regions(
    rows: usize,
    cols: usize,
) -> BoxedStrategy<(Vec<Span>, Vec<Span>)> {
    let (r, c) = (rows as isize, cols as isize);
    let blocks = (1..=rows, 1..=cols)
        .prop_flat_map(move |(kr, kc)| {
            (
                gen_sized_span(rows, kr),
                gen_sized_span(cols, kc),
                gen_sized_span(rows, kr),
                gen_sized_span(cols, kc),
            )
        })
        .prop_map(|(sr, sc, dr, dc)| (vec![sr, sc], vec![dr, dc]));
    let column_pairs = (1..=rows)
        .prop_flat_map(move |kr| {
            (
                gen_sized_span(rows, kr),
                0..c,
                gen_sized_span(rows, kr),
                0..c,
            )
        })
        .prop_map(|(sr, sc, dr, dc)| {
            (vec![sr, Span::Scalar(sc)], vec![dr, Span::Scalar(dc)])
        });
    let row_pairs = (1..=cols)
        .prop_flat_map(move |kc| {
            (
                0..r,
                gen_sized_span(cols, kc),
                0..r,
                gen_sized_span(cols, kc),
            )
        })
        .prop_map(|(sr, sc, dr, dc)| {
            (vec![Span::Scalar(sr), sc], vec![Span::Scalar(dr), dc])
        });
    prop_oneof![blocks, column_pairs, row_pairs].boxed()
}

/// Dimensions together with one span per axis.
pub fn gen_sliced(rank: usize, max: usize, scalars: bool) -> BoxedStrategy<(Vec<usize>, Vec<Span>)> {
    gen_dims(rank, max)
        .prop_flat_map(move |dims| {
            let spans = gen_spans(&dims, scalars);
            (Just(dims), spans)
        })
        .boxed()
}

/// Dimensions of the view produced by applying `spans` to an array
/// of `dims`.
pub fn sliced_dims(dims: &[usize], spans: &[Span]) -> Vec<usize> {
    ViewLayout::full(ArrayId::next(), dims)
        .collapse(spans, CheckMode::Strict)
        .map(|layout| layout.dims())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::Config;
    use proptest::test_runner::TestRunner;

    use super::*;
    use crate::array::Array;
    use crate::config::global;
    use crate::iter::Offsets;
    use crate::rearrange::flatten;
    use crate::rearrange::make_array;
    use crate::rearrange::reshape;

    #[test]
    fn sample_many() {
        let mut runner = TestRunner::new(Config::default());

        for _ in 0..256 {
            let strat = gen_span(5);
            let span = strat.new_tree(&mut runner).unwrap().current();
            assert!(span.resolve(5, CheckMode::Strict).is_ok(), "{:?}", span);
        }
    }

    #[test]
    fn sized_spans_have_their_size() {
        let mut runner = TestRunner::new(Config::default());

        for len in 1..8 {
            for size in 1..=len {
                for _ in 0..16 {
                    let span = gen_sized_span(len, size)
                        .new_tree(&mut runner)
                        .unwrap()
                        .current();
                    let resolved = span.resolve(len, CheckMode::Strict).unwrap();
                    assert_eq!(resolved.size(len), Some(size), "{:?}", span);
                }
            }
        }
    }

    fn numbered(dims: &[usize]) -> Array<usize, 3> {
        let dims: [usize; 3] = dims.try_into().unwrap();
        Array::from_shape_fn(dims, |[i, j, k]| i * 100 + j * 10 + k)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256, ..ProptestConfig::default()
        })]

        // Slicing a view agrees with slicing a materialized copy of
        // that view: composing the layouts never changes which
        // elements are selected or their order.
        #[test]
        fn slice_composition_matches_materialized(
            (dims, first, second) in gen_sliced(3, 5, false).prop_flat_map(|(dims, first)| {
                let inner = sliced_dims(&dims, &first);
                (Just(dims), Just(first), gen_spans(&inner, true))
            })
        ) {
            let lock = global::lock();
            let _guard = lock.override_check_mode(CheckMode::Strict);

            let a = numbered(&dims);
            let outer = a.as_view().view(first).unwrap();
            let composed = outer.view(second.clone()).unwrap();

            let copy: Array<usize, 3> = make_array(outer).unwrap();
            let reference = copy.as_view().view(second).unwrap();

            prop_assert_eq!(composed.dims(), reference.dims());
            prop_assert_eq!(composed.to_vec(), reference.to_vec());
        }

        // Negative coordinates address the same element as their
        // wrapped counterparts.
        #[test]
        fn negative_index_equivalence(
            (dims, coords) in gen_dims(3, 6).prop_flat_map(|dims| {
                let coords = (0..dims[0], 0..dims[1], 0..dims[2]);
                (Just(dims), coords)
            })
        ) {
            let lock = global::lock();
            let _guard = lock.override_check_mode(CheckMode::Strict);

            let a = numbered(&dims);
            let (i, j, k) = coords;
            let [d0, d1, d2] = [dims[0], dims[1], dims[2]].map(|d| d as isize);
            let (i, j, k) = (i as isize, j as isize, k as isize);
            prop_assert_eq!(a.at([i, j, k]).unwrap(), a.at([i - d0, j - d1, k - d2]).unwrap());
            prop_assert_eq!(
                a.as_view().at(&[i, j, k]).unwrap(),
                a.as_view().at(&[i - d0, j - d1, k - d2]).unwrap()
            );
        }

        // Flattening and reshaping back restores the array.
        #[test]
        fn reshape_flatten_roundtrip(dims in gen_dims(3, 5)) {
            let a = numbered(&dims);
            let flat = flatten(&a);
            prop_assert_eq!(flat.size(), a.size());
            let back = reshape(flat, *a.dims()).unwrap();
            prop_assert_eq!(back, a);
        }

        // An in-place assignment between possibly overlapping views
        // of one array behaves as if the source were read completely
        // before any element was written.
        #[test]
        fn aliasing_copy_matches_staged_reference(
            (len, src, dst) in (1..=12usize)
                .prop_flat_map(|len| (Just(len), 1..=len))
                .prop_flat_map(|(len, size)| {
                    (Just(len), gen_sized_span(len, size), gen_sized_span(len, size))
                })
        ) {
            let lock = global::lock();
            let _guard = lock.override_check_mode(CheckMode::Strict);

            let mut a = Array::from((0..len as i32).collect::<Vec<_>>());
            let values = a.view(src.clone()).unwrap().to_vec();
            let mut expected = a.as_slice().to_vec();
            let dst_layout = a.layout_of(dst.clone()).unwrap();
            for (offset, value) in Offsets::new(dst_layout).zip(values) {
                expected[offset as usize] = value;
            }

            a.assign(dst, src).unwrap();
            prop_assert_eq!(a.as_slice(), expected.as_slice());
        }

        // The same holds for two-dimensional regions, where overlap
        // between strided views at depth one and two is decided from
        // their strides and address ranges.
        #[test]
        fn aliasing_copy_2d_matches_staged_reference(
            (rows, cols, (src, dst)) in (1..=5usize, 1..=5usize)
                .prop_flat_map(|(rows, cols)| {
                    (Just(rows), Just(cols), gen_matching_regions(rows, cols))
                })
        ) {
            let lock = global::lock();
            let _guard = lock.override_check_mode(CheckMode::Strict);

            let mut a = Array::from_shape_fn([rows, cols], |[i, j]| (i * 10 + j) as i32);
            let values = a.as_view().view(src.clone()).unwrap().to_vec();
            let mut expected = a.as_slice().to_vec();
            let dst_layout = a.layout_of(dst.clone()).unwrap();
            for (offset, value) in Offsets::new(dst_layout).zip(values) {
                expected[offset as usize] = value;
            }

            a.assign(dst, src).unwrap();
            prop_assert_eq!(a.as_slice(), expected.as_slice());
        }
    }
}
