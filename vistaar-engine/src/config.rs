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

//! Engine configuration

use serde::{Deserialize, Serialize};
use vistaar_core::{DiffusionModel, Result, VistaarError};

/// Batch size for LT sampling: large, to amortize accelerator launches.
pub const LT_MAX_BATCH: usize = 1 << 15;

/// Batch size for IC sampling: each walk is a full device traversal.
pub const IC_MAX_BATCH: usize = 32;

/// Configuration for the sampling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master seed; every worker sub-stream derives from it.
    pub seed: u64,

    /// Number of host sampling workers.
    pub num_cpu_workers: usize,

    /// Number of accelerator workers (0 = host-only pool).
    pub num_device_workers: usize,

    /// Diffusion model sampled by the pool.
    pub model: DiffusionModel,
}

impl EngineConfig {
    /// Host-only configuration for `model` with one worker per core.
    pub fn for_model(model: DiffusionModel) -> Self {
        Self {
            seed: 0,
            num_cpu_workers: num_cpus::get().max(1),
            num_device_workers: 0,
            model,
        }
    }

    /// Override the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the host worker count.
    pub fn with_cpu_workers(mut self, workers: usize) -> Self {
        self.num_cpu_workers = workers;
        self
    }

    /// Model-dependent generator batch size.
    pub fn max_batch_size(&self) -> usize {
        match self.model {
            DiffusionModel::LinearThreshold => LT_MAX_BATCH,
            DiffusionModel::IndependentCascade => IC_MAX_BATCH,
        }
    }

    /// Fail fast on configurations that cannot build a worker pool.
    pub fn validate(&self) -> Result<()> {
        if self.num_cpu_workers + self.num_device_workers == 0 {
            return Err(VistaarError::Config(
                "worker pool needs at least one worker".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_model(DiffusionModel::IndependentCascade)
    }
}

/// Configuration for both seed selectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Parallelism for counting, partitioning, probing, and reduction.
    pub num_threads: usize,

    /// Discard overflow vertices at encode time instead of storing them
    /// verbatim (compressed selector only; trades accuracy for memory).
    pub lossy: bool,

    /// Free the bitstream and overflow buffers of an RR set as soon as it
    /// is covered (compressed selector only).
    pub eager_release: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get().max(1),
            lossy: false,
            eager_release: false,
        }
    }
}

impl SelectionConfig {
    /// Single-threaded configuration (deterministic baseline in tests).
    pub fn sequential() -> Self {
        Self {
            num_threads: 1,
            ..Default::default()
        }
    }

    /// Override the thread count.
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_tracks_model() {
        let lt = EngineConfig::for_model(DiffusionModel::LinearThreshold);
        let ic = EngineConfig::for_model(DiffusionModel::IndependentCascade);
        assert_eq!(lt.max_batch_size(), 32768);
        assert_eq!(ic.max_batch_size(), 32);
    }

    #[test]
    fn test_empty_pool_config_rejected() {
        let cfg = EngineConfig::for_model(DiffusionModel::IndependentCascade)
            .with_cpu_workers(0);
        assert!(cfg.validate().is_err());
    }
}
