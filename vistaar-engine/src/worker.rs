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

//! Sampling Workers
//!
//! A worker fills a batch of RR-set slots. One worker instance is
//! single-threaded; distinct instances run concurrently from different
//! generator tasks. Each worker owns a private RNG sub-stream fixed at
//! pool construction.
//!
//! Three variants:
//!
//! - [`CpuWorker`] draws a root per slot and runs the diffusion
//!   microkernel on the host.
//! - [`MaskWalkWorker`] (LT) launches a bounded-walk device batch and
//!   decodes the fixed-width mask report; walks that overflowed the cap
//!   are resampled on the host and tallied.
//! - [`PredecessorWorker`] (IC) runs one device traversal per slot and
//!   emits every vertex with a predecessor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use vistaar_core::{add_rrr_set, DiffusionModel, Graph, Result, RrrSet, StreamRng, Vertex};

use crate::device::{MaskWalkConfig, MaskWalkDevice, TraverseDevice, NO_PREDECESSOR};

/// Per-worker sampling counters (relaxed; read for diagnostics only).
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// RR sets written into slots.
    pub sets_built: AtomicU64,
    /// Batches dispatched to this worker.
    pub batches: AtomicU64,
    /// LT device walks that exceeded the cap and fell back to the host.
    pub walks_overflowed: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            sets_built: self.sets_built.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            walks_overflowed: self.walks_overflowed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerStatsSnapshot {
    pub sets_built: u64,
    pub batches: u64,
    pub walks_overflowed: u64,
}

/// A sampling worker: fills the given slots with freshly sampled RR sets.
pub trait Worker: Send {
    /// Fill every slot in `slots`. Must only be invoked from one thread at
    /// a time per instance.
    fn batch(&mut self, slots: &mut [RrrSet]) -> Result<()>;

    /// Diagnostic counters for this worker.
    fn stats(&self) -> Arc<WorkerStats>;
}

/// Host sampling worker.
pub struct CpuWorker {
    graph: Arc<Graph>,
    rng: StreamRng,
    model: DiffusionModel,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(graph: Arc<Graph>, rng: StreamRng, model: DiffusionModel) -> Self {
        Self {
            graph,
            rng,
            model,
            stats: WorkerStats::new(),
        }
    }
}

impl Worker for CpuWorker {
    fn batch(&mut self, slots: &mut [RrrSet]) -> Result<()> {
        let n = self.graph.num_nodes() as Vertex;
        for slot in slots.iter_mut() {
            let root = self.rng.gen_range(0..n);
            add_rrr_set(&self.graph, root, &mut self.rng, slot, self.model);
        }
        self.stats
            .sets_built
            .fetch_add(slots.len() as u64, Ordering::Relaxed);
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }
}

/// Accelerator worker for the LT model: bounded walks reported as
/// fixed-width mask windows.
pub struct MaskWalkWorker<D: MaskWalkDevice> {
    graph: Arc<Graph>,
    conf: MaskWalkConfig,
    device: D,
    /// Host-side mask buffer, `max_batch_size * mask_words` words.
    masks: Vec<Vertex>,
    /// Host fallback stream for overflowed walks.
    rng: StreamRng,
    stats: Arc<WorkerStats>,
}

impl<D: MaskWalkDevice> MaskWalkWorker<D> {
    pub fn new(graph: Arc<Graph>, conf: MaskWalkConfig, device: D, rng: StreamRng) -> Self {
        let masks = vec![graph.num_nodes() as Vertex; conf.max_batch_size * conf.mask_words];
        Self {
            graph,
            conf,
            device,
            masks,
            rng,
            stats: WorkerStats::new(),
        }
    }
}

impl<D: MaskWalkDevice> Worker for MaskWalkWorker<D> {
    fn batch(&mut self, slots: &mut [RrrSet]) -> Result<()> {
        let n = self.graph.num_nodes() as Vertex;
        let mask_words = self.conf.mask_words;
        let words = slots.len() * mask_words;
        self.device.walk_batch(slots.len(), &mut self.masks[..words])?;

        for (i, slot) in slots.iter_mut().enumerate() {
            let mask = &self.masks[i * mask_words..(i + 1) * mask_words];
            slot.clear();
            if mask[0] != n {
                // Valid walk: vertex ids up to the sentinel.
                for &v in mask {
                    if v == n {
                        break;
                    }
                    slot.push(v);
                }
                slot.sort();
                slot.dedup();
            } else {
                // Walk overflowed the cap; the root survives in slot 1.
                self.stats.walks_overflowed.fetch_add(1, Ordering::Relaxed);
                add_rrr_set(
                    &self.graph,
                    mask[1],
                    &mut self.rng,
                    slot,
                    DiffusionModel::LinearThreshold,
                );
            }
        }
        self.stats
            .sets_built
            .fetch_add(slots.len() as u64, Ordering::Relaxed);
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }
}

/// Accelerator worker for the IC model: one randomized traversal per
/// slot, reported as a predecessor array.
pub struct PredecessorWorker<D: TraverseDevice> {
    graph: Arc<Graph>,
    device: D,
    predecessors: Vec<i32>,
    rng: StreamRng,
    stats: Arc<WorkerStats>,
}

impl<D: TraverseDevice> PredecessorWorker<D> {
    pub fn new(graph: Arc<Graph>, device: D, rng: StreamRng) -> Self {
        let predecessors = vec![NO_PREDECESSOR; graph.num_nodes()];
        Self {
            graph,
            device,
            predecessors,
            rng,
            stats: WorkerStats::new(),
        }
    }
}

impl<D: TraverseDevice> Worker for PredecessorWorker<D> {
    fn batch(&mut self, slots: &mut [RrrSet]) -> Result<()> {
        let n = self.graph.num_nodes() as Vertex;
        for slot in slots.iter_mut() {
            let root = self.rng.gen_range(0..n);
            self.device.traverse(root, &mut self.predecessors)?;
            slot.clear();
            // Ascending scan keeps the set sorted by construction.
            for (v, &pred) in self.predecessors.iter().enumerate() {
                if pred != NO_PREDECESSOR {
                    slot.push(v as Vertex);
                }
            }
        }
        self.stats
            .sets_built
            .fetch_add(slots.len() as u64, Ordering::Relaxed);
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }
}
