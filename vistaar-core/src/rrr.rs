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

//! Reverse Reachable Sets
//!
//! An RR set is the set of vertices from which a sampled live-edge
//! subgraph could reach a random root under a diffusion model. The engine
//! treats an RR set as an ordered sequence of distinct vertex ids, sorted
//! ascending; it is mutated only during construction and read-only
//! afterwards.
//!
//! `add_rrr_set` is the producer microkernel: given a root and an RNG
//! sub-stream it appends one RR set, deterministically for that stream.
//!
//! - **Linear Threshold**: reverse live-edge walk. Each vertex activates
//!   through at most one incoming edge, chosen with probability equal to
//!   its weight (residual mass = no live in-edge). The walk stops on a
//!   stop-event or on revisiting a vertex.
//! - **Independent Cascade**: reverse BFS. Each incoming edge is live
//!   independently with probability equal to its weight; the RR set is
//!   everything reached through live edges.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::{Graph, Vertex};
use crate::rng::StreamRng;

/// Walk-length cap for the LT accelerator path (mask words per walk).
/// Doubles as the inline capacity of [`RrrSet`]: most LT sets fit the cap.
pub const LT_WALK_CAP: usize = 8;

/// One Reverse Reachable set: sorted, duplicate-free vertex ids.
pub type RrrSet = SmallVec<[Vertex; LT_WALK_CAP]>;

/// Diffusion model under which RR sets are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffusionModel {
    LinearThreshold,
    IndependentCascade,
}

/// Append one RR set for `root` to `out`, consuming entropy from `rng`.
///
/// `out` is cleared first. On return it is sorted ascending with no
/// duplicates and always contains `root`.
pub fn add_rrr_set(
    graph: &Graph,
    root: Vertex,
    rng: &mut StreamRng,
    out: &mut RrrSet,
    model: DiffusionModel,
) {
    out.clear();
    match model {
        DiffusionModel::LinearThreshold => lt_walk(graph, root, rng, out),
        DiffusionModel::IndependentCascade => ic_traverse(graph, root, rng, out),
    }
    out.sort_unstable();
    out.dedup();
}

/// Reverse live-edge walk: follow at most one live in-edge per vertex.
fn lt_walk(graph: &Graph, root: Vertex, rng: &mut StreamRng, out: &mut RrrSet) {
    let mut current = root;
    out.push(current);
    loop {
        let neighbors = graph.in_neighbors(current);
        if neighbors.is_empty() {
            return;
        }
        let weights = graph.in_weights(current);
        let x: f32 = rng.gen_range(0.0..1.0);
        let mut acc = 0.0f32;
        let mut chosen = None;
        for (&u, &w) in neighbors.iter().zip(weights) {
            acc += w;
            if x < acc {
                chosen = Some(u);
                break;
            }
        }
        // Residual probability mass: no in-edge is live.
        let Some(next) = chosen else { return };
        if out.contains(&next) {
            return;
        }
        out.push(next);
        current = next;
    }
}

/// Reverse BFS where each in-edge is live independently.
fn ic_traverse(graph: &Graph, root: Vertex, rng: &mut StreamRng, out: &mut RrrSet) {
    let mut visited = VisitedSet::new(graph.num_nodes());
    let mut frontier: SmallVec<[Vertex; LT_WALK_CAP]> = SmallVec::new();

    visited.insert(root);
    out.push(root);
    frontier.push(root);

    while let Some(v) = frontier.pop() {
        let neighbors = graph.in_neighbors(v);
        let weights = graph.in_weights(v);
        for (&u, &w) in neighbors.iter().zip(weights) {
            if visited.contains(u) {
                continue;
            }
            let x: f32 = rng.gen_range(0.0..1.0);
            if x < w {
                visited.insert(u);
                out.push(u);
                frontier.push(u);
            }
        }
    }
}

/// Flat bit array for visited-vertex tracking during one traversal.
struct VisitedSet {
    words: Vec<u64>,
}

impl VisitedSet {
    fn new(num_nodes: usize) -> Self {
        Self {
            words: vec![0u64; num_nodes.div_ceil(64)],
        }
    }

    #[inline]
    fn insert(&mut self, v: Vertex) {
        self.words[v as usize / 64] |= 1u64 << (v as usize % 64);
    }

    #[inline]
    fn contains(&self, v: Vertex) -> bool {
        (self.words[v as usize / 64] >> (v as usize % 64)) & 1 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize, w: f32) -> Graph {
        let edges: Vec<(Vertex, Vertex, f32)> = (0..n as Vertex - 1)
            .map(|v| (v, v + 1, w))
            .collect();
        Graph::from_edges(n, &edges)
    }

    fn assert_valid_rrr(set: &RrrSet, n: usize) {
        assert!(!set.is_empty());
        for w in set.windows(2) {
            assert!(w[0] < w[1], "not strictly increasing: {set:?}");
        }
        assert!((*set.last().unwrap() as usize) < n);
    }

    #[test]
    fn test_lt_walk_contains_root_and_is_sorted() {
        let g = chain(6, 1.0);
        let mut rng = StreamRng::from_seed(3).split(1, 0);
        let mut out = RrrSet::new();
        for root in 0..6 {
            add_rrr_set(&g, root, &mut rng, &mut out, DiffusionModel::LinearThreshold);
            assert_valid_rrr(&out, 6);
            assert!(out.contains(&root));
        }
    }

    #[test]
    fn test_lt_walk_follows_certain_edges() {
        // Weight 1.0 on every edge: the walk from root v deterministically
        // collects every ancestor on the chain.
        let g = chain(5, 1.0);
        let mut rng = StreamRng::from_seed(9).split(1, 0);
        let mut out = RrrSet::new();
        add_rrr_set(&g, 4, &mut rng, &mut out, DiffusionModel::LinearThreshold);
        assert_eq!(out.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_ic_traverse_zero_weight_is_singleton() {
        let g = chain(5, 0.0);
        let mut rng = StreamRng::from_seed(5).split(1, 0);
        let mut out = RrrSet::new();
        add_rrr_set(&g, 3, &mut rng, &mut out, DiffusionModel::IndependentCascade);
        assert_eq!(out.as_slice(), &[3]);
    }

    #[test]
    fn test_ic_traverse_full_weight_reaches_all_ancestors() {
        let g = chain(5, 1.0);
        let mut rng = StreamRng::from_seed(5).split(1, 0);
        let mut out = RrrSet::new();
        add_rrr_set(&g, 4, &mut rng, &mut out, DiffusionModel::IndependentCascade);
        assert_eq!(out.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_ic_traverse_visits_each_vertex_once() {
        // Diamond: 0 -> {1, 2} -> 3, all live. Vertex 0 is reachable twice
        // but must appear once.
        let g = Graph::from_edges(
            4,
            &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)],
        );
        let mut rng = StreamRng::from_seed(2).split(1, 0);
        let mut out = RrrSet::new();
        add_rrr_set(&g, 3, &mut rng, &mut out, DiffusionModel::IndependentCascade);
        assert_eq!(out.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_same_stream_reproduces_same_sets() {
        let g = chain(16, 0.5);
        let master = StreamRng::from_seed(42);
        let mut a = master.split(2, 0);
        let mut b = master.split(2, 0);
        let mut out_a = RrrSet::new();
        let mut out_b = RrrSet::new();
        for root in 0..16 {
            add_rrr_set(&g, root, &mut a, &mut out_a, DiffusionModel::IndependentCascade);
            add_rrr_set(&g, root, &mut b, &mut out_b, DiffusionModel::IndependentCascade);
            assert_eq!(out_a, out_b);
        }
    }
}
