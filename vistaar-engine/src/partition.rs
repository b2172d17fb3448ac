// SPDX-License-Identifier: AGPL-3.0-or-later
// Vistaar - Influence Maximization Engine
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Parallel In-Place Partition
//!
//! Reorders a slice so that every element satisfying a predicate precedes
//! every element that does not, returning the partition point. The
//! parallel form splits the slice into one sub-range per thread, runs a
//! sequential partition on each, then folds adjacent
//! [`PartitionIndices`] triples with a cross-slice [`swap_ranges`]:
//!
//! ```text
//! [ keep | cov ][ keep | cov ]     adjacent partitioned sub-ranges
//!          \________/
//!           swap the smaller of {left-cov, right-keep}
//! [ keep         keep | cov  cov ] merged partition
//! ```
//!
//! The merge is associative: either branch re-establishes the partition
//! property over the union, so any fold shape (and any thread count)
//! yields the same pivot and the same element multiset.

use rayon::prelude::*;
use std::ops::Range;

/// Swap `slice[left]` with `slice[right]` element-wise in parallel.
///
/// The ranges must not overlap, have equal length, and `left` must start
/// before `right`. Applying the same swap twice restores the slice.
pub fn swap_ranges<T: Send>(slice: &mut [T], left: Range<usize>, right: Range<usize>) {
    debug_assert_eq!(left.len(), right.len());
    debug_assert!(left.end <= right.start);
    let (head, tail) = slice.split_at_mut(right.start);
    head[left.start..left.end]
        .par_iter_mut()
        .zip(tail[..right.len()].par_iter_mut())
        .for_each(|(a, b)| std::mem::swap(a, b));
}

/// A partitioned sub-range: `[begin, pivot)` satisfies the predicate,
/// `[pivot, end)` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionIndices {
    pub begin: usize,
    pub pivot: usize,
    pub end: usize,
}

impl PartitionIndices {
    /// Merge with the adjacent sub-range to the right, moving the smaller
    /// of the two mismatched regions across the seam.
    pub fn merge<T: Send>(self, right: PartitionIndices, slice: &mut [T]) -> PartitionIndices {
        debug_assert_eq!(self.end, right.begin);

        // Both sides entirely violate the predicate.
        if self.pivot == self.begin && right.pivot == right.begin {
            return PartitionIndices {
                begin: self.begin,
                pivot: self.begin,
                end: right.end,
            };
        }
        // Left side entirely satisfies it: adopt the right pivot.
        if self.pivot == self.end {
            return PartitionIndices {
                begin: self.begin,
                pivot: right.pivot,
                end: right.end,
            };
        }

        let left_cov = self.end - self.pivot;
        let right_keep = right.pivot - right.begin;
        if left_cov < right_keep {
            swap_ranges(
                slice,
                self.pivot..self.end,
                right.pivot - left_cov..right.pivot,
            );
            PartitionIndices {
                begin: self.begin,
                pivot: right.pivot - left_cov,
                end: right.end,
            }
        } else {
            swap_ranges(
                slice,
                right.begin..right.pivot,
                self.pivot..self.pivot + right_keep,
            );
            PartitionIndices {
                begin: self.begin,
                pivot: self.pivot + right_keep,
                end: right.end,
            }
        }
    }
}

/// Sequential two-pointer partition (unstable). Returns the local pivot.
fn sequential_partition<T, P: Fn(&T) -> bool>(slice: &mut [T], pred: &P) -> usize {
    let mut first = 0;
    while first < slice.len() && pred(&slice[first]) {
        first += 1;
    }
    let mut next = first + 1;
    while next < slice.len() {
        if pred(&slice[next]) {
            slice.swap(first, next);
            first += 1;
        }
        next += 1;
    }
    first
}

/// Partition `slice` in place across `num_threads` sub-ranges; returns the
/// global partition point.
///
/// The pivot and the element multiset are identical for every thread
/// count; only the arrangement within each side may differ.
pub fn partition_in_place<T, P>(slice: &mut [T], pred: P, num_threads: usize) -> usize
where
    T: Send,
    P: Fn(&T) -> bool + Sync,
{
    let len = slice.len();
    let t = num_threads.max(1);
    if t == 1 || len < 2 {
        return sequential_partition(slice, &pred);
    }

    let mut rest = &mut *slice;
    let mut parts: Vec<(usize, &mut [T])> = Vec::with_capacity(t);
    let mut offset = 0;
    for i in 0..t {
        let end = len * (i + 1) / t;
        let (head, tail) = rest.split_at_mut(end - offset);
        parts.push((offset, head));
        rest = tail;
        offset = end;
    }
    debug_assert!(rest.is_empty());
    debug_assert_eq!(offset, len);

    let mut indices: Vec<PartitionIndices> = parts
        .into_par_iter()
        .map(|(begin, part)| {
            let local = sequential_partition(part, &pred);
            PartitionIndices {
                begin,
                pivot: begin + local,
                end: begin + part.len(),
            }
        })
        .collect();

    let mut step = 1;
    while step < t {
        let mut i = 0;
        while i + step < t {
            indices[i] = indices[i].merge(indices[i + step], slice);
            i += step * 2;
        }
        step <<= 1;
    }
    indices[0].pivot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitioned<T, P: Fn(&T) -> bool>(slice: &[T], pivot: usize, pred: P) {
        for x in &slice[..pivot] {
            assert!(pred(x));
        }
        for x in &slice[pivot..] {
            assert!(!pred(x));
        }
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_swap_ranges_is_an_involution() {
        let original: Vec<u32> = (0..32).collect();
        let mut v = original.clone();
        swap_ranges(&mut v, 2..7, 20..25);
        assert_ne!(v, original);
        swap_ranges(&mut v, 2..7, 20..25);
        assert_eq!(v, original);
    }

    #[test]
    fn test_sequential_partition_basic() {
        let mut v = vec![5u32, 2, 8, 1, 9, 4];
        let pivot = sequential_partition(&mut v, &|x| *x < 5);
        assert_eq!(pivot, 3);
        assert_partitioned(&v, pivot, |x| *x < 5);
    }

    #[test]
    fn test_partition_preserves_multiset() {
        let input: Vec<u32> = (0..1000).map(|i| (i * 7919) % 613).collect();
        let mut v = input.clone();
        let pivot = partition_in_place(&mut v, |x| x % 3 == 0, 4);
        assert_partitioned(&v, pivot, |x| x % 3 == 0);
        assert_eq!(sorted(v), sorted(input));
    }

    #[test]
    fn test_partition_pivot_stable_across_thread_counts() {
        let input: Vec<u32> = (0..501).map(|i| (i * 31) % 97).collect();
        let mut pivots = Vec::new();
        for threads in [1, 2, 4, 8] {
            let mut v = input.clone();
            let pivot = partition_in_place(&mut v, |x| x % 2 == 0, threads);
            assert_partitioned(&v, pivot, |x| x % 2 == 0);
            assert_eq!(sorted(v), sorted(input.clone()));
            pivots.push(pivot);
        }
        assert!(pivots.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_partition_all_keep_and_all_covered() {
        let mut all_keep: Vec<u32> = vec![1; 64];
        assert_eq!(partition_in_place(&mut all_keep, |x| *x == 1, 4), 64);
        let mut all_cov: Vec<u32> = vec![2; 64];
        assert_eq!(partition_in_place(&mut all_cov, |x| *x == 1, 4), 0);
    }

    /// Build a slice made of pre-partitioned segments with the given
    /// (keep, covered) sizes; keeps are odd, covered are even.
    fn segments(shape: &[(usize, usize)]) -> (Vec<u32>, Vec<PartitionIndices>) {
        let mut v = Vec::new();
        let mut triples = Vec::new();
        for &(keep, cov) in shape {
            let begin = v.len();
            v.extend(std::iter::repeat(1u32).take(keep));
            let pivot = v.len();
            v.extend(std::iter::repeat(2u32).take(cov));
            triples.push(PartitionIndices {
                begin,
                pivot,
                end: v.len(),
            });
        }
        (v, triples)
    }

    #[test]
    fn test_merge_moves_smaller_left_covered_region() {
        // left covered (2) < right keep (5)
        let (mut v, t) = segments(&[(3, 2), (5, 4)]);
        let merged = t[0].merge(t[1], &mut v);
        assert_eq!(merged, PartitionIndices { begin: 0, pivot: 8, end: 14 });
        assert_partitioned(&v, merged.pivot, |x| *x == 1);
    }

    #[test]
    fn test_merge_moves_smaller_right_keep_region() {
        // left covered (6) >= right keep (2)
        let (mut v, t) = segments(&[(3, 6), (2, 4)]);
        let merged = t[0].merge(t[1], &mut v);
        assert_eq!(merged, PartitionIndices { begin: 0, pivot: 5, end: 15 });
        assert_partitioned(&v, merged.pivot, |x| *x == 1);
    }

    #[test]
    fn test_merge_degenerate_sides() {
        // Both sides entirely covered.
        let (mut v, t) = segments(&[(0, 4), (0, 3)]);
        let merged = t[0].merge(t[1], &mut v);
        assert_eq!(merged.pivot, 0);
        // Left side entirely keep.
        let (mut v, t) = segments(&[(4, 0), (2, 3)]);
        let merged = t[0].merge(t[1], &mut v);
        assert_eq!(merged.pivot, 6);
        assert_partitioned(&v, merged.pivot, |x| *x == 1);
    }

    #[test]
    fn test_merge_is_associative() {
        for shape in [
            [(3, 2), (5, 4), (1, 6)],
            [(0, 3), (4, 0), (2, 2)],
            [(6, 1), (1, 5), (3, 3)],
        ] {
            let (mut left_first, t) = segments(&shape);
            let mut right_first = left_first.clone();
            let u = t.clone();

            let ab = t[0].merge(t[1], &mut left_first);
            let ab_c = ab.merge(t[2], &mut left_first);

            let bc = u[1].merge(u[2], &mut right_first);
            let a_bc = u[0].merge(bc, &mut right_first);

            assert_eq!(ab_c, a_bc);
            assert_partitioned(&left_first, ab_c.pivot, |x| *x == 1);
            assert_partitioned(&right_first, a_bc.pivot, |x| *x == 1);
        }
    }
}
