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

//! Vistaar Core Layer
//!
//! Shared foundation for the influence maximization engine:
//!
//! - **Graph** (`graph`): CSR-transpose directed graph. Reverse-reachability
//!   sampling only ever walks *incoming* edges, so the adjacency is stored
//!   transposed with per-edge activation weights.
//!
//! - **RR sets** (`rrr`): the Reverse Reachable set data model plus the
//!   diffusion microkernels that build one RR set from a random root under
//!   the Linear Threshold or Independent Cascade model.
//!
//! - **RNG streams** (`rng`): seedable counter-based RNG with a
//!   split-by-stream discipline so every worker (host or device thread)
//!   owns an independent sub-stream.

pub mod error;
pub mod graph;
pub mod rng;
pub mod rrr;

pub use error::{Result, VistaarError};
pub use graph::{Graph, Vertex, NO_VERTEX};
pub use rng::StreamRng;
pub use rrr::{add_rrr_set, DiffusionModel, RrrSet, LT_WALK_CAP};
