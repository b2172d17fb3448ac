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

//! Accelerator ABI
//!
//! The device kernels are external collaborators; this module pins down
//! the boundary the sampling workers program against. A build without
//! accelerators simply never constructs a device worker: the host worker
//! path is complete on its own, and core tests run deviceless against
//! in-process fakes of these traits.
//!
//! A mask-walk device runs bounded LT walks and reports each walk as a
//! fixed-width window of `mask_words` vertex slots; a traverse device
//! runs one randomized reverse BFS and reports an `n`-length predecessor
//! array. Host-side decoding of both report formats lives in
//! [`crate::worker`].

use serde::{Deserialize, Serialize};
use vistaar_core::{Result, Vertex, VistaarError};

/// Predecessor value for vertices the traversal did not reach.
pub const NO_PREDECESSOR: i32 = -1;

/// Launch geometry for the bounded-walk (LT) kernel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaskWalkConfig {
    /// Walks per launch; one device thread per walk.
    pub max_batch_size: usize,

    /// Device thread-block size.
    pub block_size: usize,

    /// Walk-length cap: mask slots reported per walk.
    pub mask_words: usize,
}

impl MaskWalkConfig {
    /// Geometry matching the generator's LT batch size.
    pub fn for_batch(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            block_size: 256,
            mask_words: vistaar_core::LT_WALK_CAP,
        }
    }

    /// Thread blocks required per launch.
    pub fn max_blocks(&self) -> usize {
        self.max_batch_size / self.block_size
    }

    /// Device threads per worker (one per concurrent walk).
    pub fn num_device_threads(&self) -> usize {
        self.max_batch_size
    }

    /// Fail fast on geometry the kernel cannot launch.
    pub fn validate(&self, num_workers: usize, device_max_blocks: usize) -> Result<()> {
        if self.block_size == 0 || self.max_batch_size % self.block_size != 0 {
            return Err(VistaarError::Config(format!(
                "batch size {} not divisible by block size {}",
                self.max_batch_size, self.block_size
            )));
        }
        if self.max_blocks() * num_workers > device_max_blocks {
            return Err(VistaarError::Config(format!(
                "{} blocks x {} workers exceeds device limit {}",
                self.max_blocks(),
                num_workers,
                device_max_blocks
            )));
        }
        if self.mask_words == 0 {
            return Err(VistaarError::Config("mask_words must be positive".into()));
        }
        Ok(())
    }
}

/// Bounded-walk kernel interface (LT model).
///
/// `walk_batch` launches `batch_size` walks and synchronously fills
/// `masks` with `batch_size * mask_words` host-side words. Per walk:
/// a slot equal to `n` is the end-of-walk sentinel; a *first* slot equal
/// to `n` flags a walk that overflowed the cap, with the drawn root
/// preserved in the second slot for host resampling.
pub trait MaskWalkDevice: Send {
    /// Device-wide thread-block budget shared by all workers.
    fn max_blocks(&self) -> usize;

    /// Seat the device-side RNG states on their reserved sub-streams.
    fn rng_setup(&mut self, seed: u64, total_streams: u64, first_stream: u64);

    /// Run `batch_size` bounded walks; fills `masks` and blocks until the
    /// device stream has synchronized.
    fn walk_batch(&mut self, batch_size: usize, masks: &mut [Vertex]) -> Result<()>;
}

/// Randomized reverse-BFS kernel interface (IC model).
pub trait TraverseDevice: Send {
    /// Seat the device-side RNG states on their reserved sub-streams.
    fn rng_setup(&mut self, seed: u64, total_streams: u64, first_stream: u64);

    /// Device threads backing one traversal.
    fn num_device_threads(&self) -> usize;

    /// Traverse from `root`; fills the `n`-length `predecessors` array
    /// with [`NO_PREDECESSOR`] for unreached vertices and blocks until the
    /// device stream has synchronized.
    fn traverse(&mut self, root: Vertex, predecessors: &mut [i32]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_divisibility_enforced() {
        let cfg = MaskWalkConfig {
            max_batch_size: 1000,
            block_size: 256,
            mask_words: 8,
        };
        assert!(cfg.validate(1, usize::MAX).is_err());
    }

    #[test]
    fn test_block_budget_enforced() {
        let cfg = MaskWalkConfig::for_batch(32768);
        // 128 blocks per worker; 4 workers need 512.
        assert_eq!(cfg.max_blocks(), 128);
        assert!(cfg.validate(4, 512).is_ok());
        assert!(cfg.validate(4, 511).is_err());
    }
}
