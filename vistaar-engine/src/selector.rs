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

//! Greedy Seed Selection over Raw RR Pools
//!
//! Lazy-greedy max coverage: a max-heap of `(vertex, coverage)` entries
//! where the stored coverage is an upper bound that is corrected on pop
//! (push-and-recheck), an in-place partition that retires covered RR sets
//! to the tail of the live prefix, and a coverage-counter update that
//! takes whichever direction is cheaper: decrement from the newly
//! covered range, or zero and recount the surviving range.
//!
//! Heap ties break toward the smallest vertex id, making selection
//! deterministic for a fixed pool.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use tracing::debug;
use vistaar_core::{Graph, Result, RrrSet, Vertex, VistaarError};

use crate::config::SelectionConfig;
use crate::generator::RrrPool;
use crate::partition::partition_in_place;

/// Max-heap entry; ties on coverage prefer the smaller vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    coverage: u32,
    vertex: Vertex,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coverage
            .cmp(&other.coverage)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dedicated thread pool honoring the selection thread-count knob.
pub(crate) fn rayon_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .build()
        .map_err(|e| VistaarError::Config(format!("thread pool: {e}")))
}

pub(crate) fn validate_selection(num_nodes: usize, k: usize) -> Result<()> {
    if k == 0 {
        return Err(VistaarError::InvalidInput(
            "seed set size must be at least 1".into(),
        ));
    }
    if k > num_nodes {
        return Err(VistaarError::InvalidInput(format!(
            "seed set size {k} exceeds vertex count {num_nodes}"
        )));
    }
    Ok(())
}

/// Populate per-vertex counters from `sets`, in parallel over disjoint
/// vertex ranges. Each task binary-search-clips every sorted RR set to
/// its own range, so no two tasks touch the same counter.
fn count_occurrences(sets: &[RrrSet], coverage: &mut [u32], num_threads: usize) {
    let n = coverage.len();
    let t = num_threads.max(1);

    let mut rest = &mut *coverage;
    let mut parts: Vec<(usize, &mut [u32])> = Vec::with_capacity(t);
    let mut offset = 0;
    for i in 0..t {
        let end = n * (i + 1) / t;
        let (head, tail) = rest.split_at_mut(end - offset);
        parts.push((offset, head));
        rest = tail;
        offset = end;
    }
    debug_assert!(rest.is_empty());
    debug_assert_eq!(offset, n);

    parts.into_par_iter().for_each(|(lo, part)| {
        let hi = lo + part.len();
        for set in sets {
            let from = set.partition_point(|&v| (v as usize) < lo);
            for &v in &set[from..] {
                let v = v as usize;
                if v >= hi {
                    break;
                }
                part[v - lo] += 1;
            }
        }
    });
}

/// Select up to `k` seeds greedily from `pool`.
///
/// Returns the covered fraction and the chosen seeds. The pool is
/// partitioned in place: covered sets migrate behind the live prefix but
/// none are dropped. An empty pool yields `(0.0, [])`.
pub fn find_most_influential(
    graph: &Graph,
    k: usize,
    pool: &mut RrrPool,
    config: &SelectionConfig,
) -> Result<(f64, Vec<Vertex>)> {
    let n = graph.num_nodes();
    validate_selection(n, k)?;
    if pool.is_empty() {
        return Ok((0.0, Vec::new()));
    }

    let threads = config.num_threads.max(1);
    let workers = rayon_pool(threads)?;
    Ok(workers.install(|| select(n, k, pool, threads)))
}

fn select(n: usize, k: usize, pool: &mut RrrPool, threads: usize) -> (f64, Vec<Vertex>) {
    let mut coverage = vec![0u32; n];
    count_occurrences(pool, &mut coverage, threads);

    let storage: Vec<HeapEntry> = coverage
        .par_iter()
        .enumerate()
        .map(|(v, &c)| HeapEntry {
            coverage: c,
            vertex: v as Vertex,
        })
        .collect();
    let mut heap = BinaryHeap::from(storage);

    let mut seeds = Vec::with_capacity(k);
    let mut uncovered = pool.len();
    let mut end = pool.len();

    while seeds.len() < k && uncovered != 0 {
        let Some(entry) = heap.pop() else { break };

        // Lazy refresh: the stored coverage may be stale; correct and
        // recheck instead of trusting it.
        let current = coverage[entry.vertex as usize];
        if entry.coverage > current {
            heap.push(HeapEntry {
                coverage: current,
                vertex: entry.vertex,
            });
            continue;
        }

        let v = entry.vertex;
        uncovered -= entry.coverage as usize;

        let pivot = partition_in_place(
            &mut pool[..end],
            |set: &RrrSet| set.binary_search(&v).is_err(),
            threads,
        );

        // `[pivot, end)` is newly covered; update counters from whichever
        // side is smaller.
        if end - pivot < pivot {
            for set in &pool[pivot..end] {
                for &u in set.iter() {
                    coverage[u as usize] -= 1;
                }
            }
        } else {
            coverage.par_iter_mut().for_each(|c| *c = 0);
            count_occurrences(&pool[..pivot], &mut coverage, threads);
        }

        end = pivot;
        seeds.push(v);
        debug!(seed = v, covered = pool.len() - uncovered, "selected");
    }

    let f = (pool.len() - uncovered) as f64 / pool.len() as f64;
    (f, seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn nodes_only(n: usize) -> Graph {
        Graph::from_edges(n, &[])
    }

    fn pool_of(sets: &[&[Vertex]]) -> RrrPool {
        sets.iter().map(|s| RrrSet::from_slice(s)).collect()
    }

    fn covered_count(pool: &RrrPool, seeds: &[Vertex]) -> usize {
        pool.iter()
            .filter(|set| seeds.iter().any(|s| set.binary_search(s).is_ok()))
            .count()
    }

    #[test]
    fn test_count_occurrences_matches_naive() {
        let sets: Vec<RrrSet> = (0..100u32)
            .map(|i| {
                let mut s: Vec<Vertex> = vec![i % 17, (i * 5 + 1) % 17, (i * 11 + 3) % 17];
                s.sort_unstable();
                s.dedup();
                RrrSet::from_vec(s)
            })
            .collect();

        let mut naive = vec![0u32; 17];
        for set in &sets {
            for &v in set.iter() {
                naive[v as usize] += 1;
            }
        }

        for threads in [1, 2, 4, 8] {
            let mut coverage = vec![0u32; 17];
            count_occurrences(&sets, &mut coverage, threads);
            assert_eq!(coverage, naive, "threads={threads}");
        }
        // Counter mass equals total pool cardinality.
        let total: u32 = naive.iter().sum();
        let expected: u32 = sets.iter().map(|s| s.len() as u32).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_two_seeds_cover_everything() {
        let g = nodes_only(4);
        let mut pool = pool_of(&[&[0], &[0, 1], &[0, 1, 2], &[3]]);
        let (f, seeds) =
            find_most_influential(&g, 2, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![0, 3]);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_overlapping_pool_greedy_order() {
        let g = nodes_only(5);
        let sets: &[&[Vertex]] = &[&[0, 1, 2], &[1, 2, 3], &[2, 3, 4], &[0, 4]];

        let mut pool = pool_of(sets);
        let (f, seeds) =
            find_most_influential(&g, 2, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![2, 0]);
        assert_eq!(f, 1.0);

        let mut pool = pool_of(sets);
        let (f, seeds) =
            find_most_influential(&g, 1, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![2]);
        assert_eq!(f, 0.75);
    }

    #[test]
    fn test_empty_pool_returns_zero_coverage() {
        let g = nodes_only(6);
        let mut pool = RrrPool::new();
        let (f, seeds) =
            find_most_influential(&g, 3, &mut pool, &SelectionConfig::default()).unwrap();
        assert_eq!(f, 0.0);
        assert!(seeds.is_empty());
    }

    #[test]
    fn test_invalid_k_rejected() {
        let g = nodes_only(4);
        let mut pool = pool_of(&[&[0]]);
        assert!(matches!(
            find_most_influential(&g, 0, &mut pool, &SelectionConfig::default()),
            Err(VistaarError::InvalidInput(_))
        ));
        assert!(matches!(
            find_most_influential(&g, 5, &mut pool, &SelectionConfig::default()),
            Err(VistaarError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_loop_exits_when_pool_exhausted_before_k() {
        // Every set contains vertex 5: one pick covers everything.
        let g = nodes_only(8);
        let mut pool = pool_of(&[&[1, 5], &[5], &[2, 5, 7], &[0, 5]]);
        let (f, seeds) =
            find_most_influential(&g, 3, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![5]);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_stale_heap_entries_are_repushed() {
        // After picking 0 (coverage 3), entries (1, cov 2) and (2, cov 2)
        // are both stale; each must be corrected before 2 wins.
        let g = nodes_only(3);
        let mut pool = pool_of(&[&[0, 1], &[0, 1], &[0, 2], &[2]]);
        let (f, seeds) =
            find_most_influential(&g, 2, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![0, 2]);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_coverage_fraction_is_exact() {
        let g = nodes_only(10);
        let original = pool_of(&[&[0, 3], &[1, 4], &[2, 5], &[0, 6], &[7, 8], &[9]]);
        let mut pool = original.clone();
        let (f, seeds) =
            find_most_influential(&g, 3, &mut pool, &SelectionConfig::default()).unwrap();
        let covered = covered_count(&original, &seeds);
        assert_eq!(f, covered as f64 / original.len() as f64);
    }

    #[test]
    fn test_seeds_distinct_and_bounded() {
        let g = nodes_only(20);
        let sets: Vec<RrrSet> = (0..200u32)
            .map(|i| {
                let a = (i * 7) % 20;
                let b = (i * 13 + 3) % 20;
                let mut s: RrrSet = smallvec![a.min(b)];
                if a != b {
                    s.push(a.max(b));
                }
                s
            })
            .collect();
        for k in [1, 5, 20] {
            let mut pool = sets.clone();
            let (_, seeds) =
                find_most_influential(&g, k, &mut pool, &SelectionConfig::default()).unwrap();
            assert!(seeds.len() <= k);
            let mut dedup = seeds.clone();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(dedup.len(), seeds.len());
        }
    }

    #[test]
    fn test_thread_counts_agree() {
        let g = nodes_only(50);
        let sets: Vec<RrrSet> = (0..400u32)
            .map(|i| {
                let mut s: Vec<Vertex> = vec![(i * 3) % 50, (i * 11 + 1) % 50, (i * 29 + 7) % 50];
                s.sort_unstable();
                s.dedup();
                RrrSet::from_vec(s)
            })
            .collect();
        let mut baseline = sets.clone();
        let expected = find_most_influential(
            &g,
            8,
            &mut baseline,
            &SelectionConfig::sequential(),
        )
        .unwrap();
        for threads in [2, 4, 8] {
            let mut pool = sets.clone();
            let got = find_most_influential(
                &g,
                8,
                &mut pool,
                &SelectionConfig::sequential().with_threads(threads),
            )
            .unwrap();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_adding_redundant_sets_keeps_coverage() {
        // A pool extended with sets already covered by the chosen seeds
        // can only hold or improve the covered fraction.
        let g = nodes_only(6);
        let base: &[&[Vertex]] = &[&[0, 1], &[1, 2], &[3]];
        let mut pool = pool_of(base);
        let (f, seeds) =
            find_most_influential(&g, 2, &mut pool, &SelectionConfig::sequential()).unwrap();

        let mut extended = pool_of(base);
        extended.push(RrrSet::from_slice(&[1, 4]));
        extended.push(RrrSet::from_slice(&[1, 5]));
        let (f2, seeds2) =
            find_most_influential(&g, 2, &mut extended, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds2, seeds);
        assert!(f2 >= f);
    }
}
