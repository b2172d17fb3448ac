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

//! Vistaar Engine Layer
//!
//! The three coupled subsystems of the influence maximization core:
//!
//! ```text
//! [worker pool] --batches--> [RR-set pool] --+--> [greedy selector]
//!  CPU + device                              |
//!  (generator)                               +--> [compressed store] --> [compressed selector]
//!                                                  (Huffman codec)
//! ```
//!
//! - **Sampling** (`worker`, `generator`, `device`): a heterogeneous
//!   worker pool fills a pool of θ RR sets under dynamic batch
//!   scheduling. Device kernels sit behind the traits in `device`; a
//!   deviceless build keeps only the CPU path.
//!
//! - **Selection** (`selector`, `partition`): lazy-greedy max coverage
//!   over the raw pool, built on a stale-tolerant max-heap and a parallel
//!   in-place partition with an associative merge.
//!
//! - **Compression** (`huffman`, `store`): a frequency-adaptive code book
//!   lets selection run decompress-and-probe over compressed sets,
//!   trading decode time for peak memory.
//!
//! Both selectors implement the same contract and return the same seeds
//! for the same pool; `SelectionConfig::num_threads` is the single
//! parallelism knob for counting, partitioning, probing, and encoding.

pub mod config;
pub mod device;
pub mod generator;
pub mod huffman;
pub mod partition;
pub mod selector;
pub mod store;
pub mod worker;

pub use config::{EngineConfig, SelectionConfig, IC_MAX_BATCH, LT_MAX_BATCH};
pub use device::{MaskWalkConfig, MaskWalkDevice, TraverseDevice, NO_PREDECESSOR};
pub use generator::{Generator, RrrPool};
pub use huffman::{Code, EncodedSet, HuffmanCodec, MAX_ENCODED_BITS};
pub use partition::{partition_in_place, swap_ranges, PartitionIndices};
pub use selector::find_most_influential;
pub use store::{huffman_find, CompressStats, CompressedPool, CompressedRrr};
pub use worker::{
    CpuWorker, MaskWalkWorker, PredecessorWorker, Worker, WorkerStats, WorkerStatsSnapshot,
};
