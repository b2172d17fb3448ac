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

//! Streaming RR-Set Generator
//!
//! Splits a request for θ RR sets into batches and distributes them to a
//! heterogeneous worker pool under dynamic scheduling:
//!
//! ```text
//! [θ slots] → chunk(max_batch_size) → Mutex<chunk queue>
//!                                        ↑ pull     ↑ pull
//!                                  [worker 0] ... [worker W-1]
//! ```
//!
//! Every task greedily pulls the next batch, so fast accelerator workers
//! naturally absorb more batches than the host fallback. Slot positions
//! are deterministic (batch index × batch size + offset); the batch →
//! worker mapping is not, which downstream selection tolerates because it
//! is invariant under pool permutation.
//!
//! Sub-stream layout over one master seed: host worker `i` holds stream
//! `i`; device worker `j`'s host fallback holds stream `C + j`; the
//! device-side per-thread states of worker `j` start at
//! `C + D + j × threads_per_device`. No stream is shared.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::debug;
use vistaar_core::{DiffusionModel, Graph, Result, RrrSet, StreamRng, VistaarError};

use crate::config::EngineConfig;
use crate::device::{MaskWalkConfig, MaskWalkDevice, TraverseDevice};
use crate::worker::{CpuWorker, MaskWalkWorker, PredecessorWorker, Worker, WorkerStatsSnapshot};

/// An indexed pool of RR sets with stable positions.
pub type RrrPool = Vec<RrrSet>;

/// Streaming generator over a fixed worker pool.
pub struct Generator {
    workers: Vec<Box<dyn Worker>>,
    max_batch_size: usize,
}

fn validate_graph(graph: &Graph) -> Result<()> {
    if graph.num_nodes() == 0 {
        return Err(VistaarError::Config(
            "cannot sample an empty graph".into(),
        ));
    }
    Ok(())
}

impl Generator {
    /// Host-only pool: `num_cpu_workers` CPU workers on streams `0..C`.
    pub fn host_pool(graph: Arc<Graph>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        validate_graph(&graph)?;
        let master = StreamRng::from_seed(config.seed);
        let total = config.num_cpu_workers as u64;
        let workers = (0..config.num_cpu_workers)
            .map(|i| {
                Box::new(CpuWorker::new(
                    Arc::clone(&graph),
                    master.split(total, i as u64),
                    config.model,
                )) as Box<dyn Worker>
            })
            .collect();
        Ok(Self {
            workers,
            max_batch_size: config.max_batch_size(),
        })
    }

    /// Heterogeneous pool for the LT model: CPU workers plus one
    /// bounded-walk worker per device.
    pub fn with_mask_devices<D: MaskWalkDevice + 'static>(
        graph: Arc<Graph>,
        config: &EngineConfig,
        mut devices: Vec<D>,
    ) -> Result<Self> {
        config.validate()?;
        validate_graph(&graph)?;
        if config.model != DiffusionModel::LinearThreshold {
            return Err(VistaarError::Config(
                "mask-walk devices sample the LT model only".into(),
            ));
        }
        let conf = MaskWalkConfig::for_batch(config.max_batch_size());
        if let Some(device) = devices.first() {
            conf.validate(devices.len(), device.max_blocks())?;
        }

        let num_cpu = config.num_cpu_workers as u64;
        let num_dev = devices.len() as u64;
        let threads_per = conf.num_device_threads() as u64;
        let total = num_cpu + num_dev * (threads_per + 1);
        let master = StreamRng::from_seed(config.seed);

        let mut workers: Vec<Box<dyn Worker>> = (0..config.num_cpu_workers)
            .map(|i| {
                Box::new(CpuWorker::new(
                    Arc::clone(&graph),
                    master.split(total, i as u64),
                    config.model,
                )) as Box<dyn Worker>
            })
            .collect();
        for (j, device) in devices.iter_mut().enumerate() {
            let first = num_cpu + num_dev + j as u64 * threads_per;
            device.rng_setup(config.seed, total, first);
        }
        for (j, device) in devices.into_iter().enumerate() {
            let rng = master.split(total, num_cpu + j as u64);
            workers.push(Box::new(MaskWalkWorker::new(
                Arc::clone(&graph),
                conf,
                device,
                rng,
            )));
        }
        Ok(Self {
            workers,
            max_batch_size: config.max_batch_size(),
        })
    }

    /// Heterogeneous pool for the IC model: CPU workers plus one
    /// traversal worker per device.
    pub fn with_traverse_devices<D: TraverseDevice + 'static>(
        graph: Arc<Graph>,
        config: &EngineConfig,
        mut devices: Vec<D>,
    ) -> Result<Self> {
        config.validate()?;
        validate_graph(&graph)?;
        if config.model != DiffusionModel::IndependentCascade {
            return Err(VistaarError::Config(
                "traverse devices sample the IC model only".into(),
            ));
        }

        let num_cpu = config.num_cpu_workers as u64;
        let num_dev = devices.len() as u64;
        let threads_per = devices
            .first()
            .map(|d| d.num_device_threads() as u64)
            .unwrap_or(0);
        let total = num_cpu + num_dev * (threads_per + 1);
        let master = StreamRng::from_seed(config.seed);

        let mut workers: Vec<Box<dyn Worker>> = (0..config.num_cpu_workers)
            .map(|i| {
                Box::new(CpuWorker::new(
                    Arc::clone(&graph),
                    master.split(total, i as u64),
                    config.model,
                )) as Box<dyn Worker>
            })
            .collect();
        for (j, device) in devices.iter_mut().enumerate() {
            let first = num_cpu + num_dev + j as u64 * threads_per;
            device.rng_setup(config.seed, total, first);
        }
        for (j, device) in devices.into_iter().enumerate() {
            let rng = master.split(total, num_cpu + j as u64);
            workers.push(Box::new(PredecessorWorker::new(
                Arc::clone(&graph),
                device,
                rng,
            )));
        }
        Ok(Self {
            workers,
            max_batch_size: config.max_batch_size(),
        })
    }

    /// Number of workers in the pool.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Snapshot of every worker's counters, pool order.
    pub fn worker_stats(&self) -> Vec<WorkerStatsSnapshot> {
        self.workers.iter().map(|w| w.stats().snapshot()).collect()
    }

    /// Produce a pool of `theta` RR sets.
    ///
    /// Errors from any worker abandon the whole run; a partial pool is
    /// never returned.
    pub fn generate(&mut self, theta: usize) -> Result<RrrPool> {
        if self.workers.is_empty() {
            return Err(VistaarError::Config("worker pool is empty".into()));
        }
        let mut pool: RrrPool = vec![RrrSet::new(); theta];
        let num_batches = theta.div_ceil(self.max_batch_size);
        debug!(
            theta,
            num_batches,
            workers = self.workers.len(),
            "generating RR sets"
        );

        let queue = Mutex::new(pool.chunks_mut(self.max_batch_size));
        let outcome: Result<()> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .workers
                .iter_mut()
                .map(|worker| {
                    let queue = &queue;
                    scope.spawn(move || -> Result<()> {
                        loop {
                            let chunk = { queue.lock().next() };
                            let Some(chunk) = chunk else { break };
                            worker.batch(chunk)?;
                        }
                        Ok(())
                    })
                })
                .collect();
            for handle in handles {
                match handle.join() {
                    Ok(result) => result?,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(())
        });
        outcome?;
        drop(queue);

        debug!(theta, "pool complete");
        Ok(pool)
    }
}
