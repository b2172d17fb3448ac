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

//! CSR-Transpose Graph Layout
//!
//! Compact directed graph stored as the transpose: for every vertex the
//! contiguous list of *incoming* neighbors plus the activation weight of
//! each incoming edge. Reverse-reachability sampling walks edges backwards
//! exclusively, so the transpose is the only adjacency the engine keeps.
//!
//! ## Memory Layout
//!
//! ```text
//! in_offsets:   [0, d(0), d(0)+d(1), ..., m]        (n + 1 entries)
//! in_neighbors: [src, src, ...]                     (m entries)
//! in_weights:   [w, w, ...]                         (m entries, parallel)
//! ```
//!
//! Vertex ids are dense `u32` in `[0, n)`; `NO_VERTEX` is the invalid
//! sentinel. The on-disk loader lives outside this crate; `from_edges` is
//! the in-memory construction contract.

use serde::{Deserialize, Serialize};

/// Vertex identifier (compact 32-bit, densely numbered)
pub type Vertex = u32;

/// Invalid vertex sentinel
pub const NO_VERTEX: Vertex = u32::MAX;

/// Directed graph in transposed CSR form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    num_nodes: usize,
    num_edges: usize,
    in_offsets: Vec<usize>,
    in_neighbors: Vec<Vertex>,
    in_weights: Vec<f32>,
}

impl Graph {
    /// Build a graph from `(src, dst, weight)` edge triples.
    ///
    /// Edges are grouped by destination; relative order of a vertex's
    /// in-edges follows the input order. Weights are activation
    /// probabilities in `[0, 1]`.
    pub fn from_edges(num_nodes: usize, edges: &[(Vertex, Vertex, f32)]) -> Self {
        let mut degree = vec![0usize; num_nodes];
        for &(_, dst, _) in edges {
            degree[dst as usize] += 1;
        }

        let mut in_offsets = Vec::with_capacity(num_nodes + 1);
        let mut acc = 0usize;
        in_offsets.push(0);
        for d in &degree {
            acc += d;
            in_offsets.push(acc);
        }

        let mut cursor = in_offsets[..num_nodes].to_vec();
        let mut in_neighbors = vec![NO_VERTEX; edges.len()];
        let mut in_weights = vec![0.0f32; edges.len()];
        for &(src, dst, w) in edges {
            let slot = cursor[dst as usize];
            in_neighbors[slot] = src;
            in_weights[slot] = w;
            cursor[dst as usize] += 1;
        }

        Self {
            num_nodes,
            num_edges: edges.len(),
            in_offsets,
            in_neighbors,
            in_weights,
        }
    }

    /// Build a graph where every in-edge of a vertex carries weight
    /// `1 / in_degree` (the classic weighted-cascade assignment).
    pub fn from_edges_weighted_cascade(num_nodes: usize, edges: &[(Vertex, Vertex)]) -> Self {
        let mut degree = vec![0usize; num_nodes];
        for &(_, dst) in edges {
            degree[dst as usize] += 1;
        }
        let weighted: Vec<(Vertex, Vertex, f32)> = edges
            .iter()
            .map(|&(src, dst)| (src, dst, 1.0 / degree[dst as usize] as f32))
            .collect();
        Self::from_edges(num_nodes, &weighted)
    }

    /// Number of vertices.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of directed edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Incoming neighbors of `v` (sources of edges into `v`).
    #[inline]
    pub fn in_neighbors(&self, v: Vertex) -> &[Vertex] {
        let v = v as usize;
        &self.in_neighbors[self.in_offsets[v]..self.in_offsets[v + 1]]
    }

    /// Activation weights parallel to [`in_neighbors`](Self::in_neighbors).
    #[inline]
    pub fn in_weights(&self, v: Vertex) -> &[f32] {
        let v = v as usize;
        &self.in_weights[self.in_offsets[v]..self.in_offsets[v + 1]]
    }

    /// In-degree of `v`.
    #[inline]
    pub fn in_degree(&self, v: Vertex) -> usize {
        let v = v as usize;
        self.in_offsets[v + 1] - self.in_offsets[v]
    }
}
