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

//! Splittable RNG Streams
//!
//! Every sampling worker owns a private RNG sub-stream fixed at pool
//! construction: given a master generator and the total number of
//! independent sub-streams, worker `i` takes sub-stream `i`, and
//! device-side per-thread states are offset past all host workers so no
//! sub-stream is ever shared.
//!
//! ChaCha's 64-bit stream counter gives the split for free: sub-stream
//! `i` is the master keyed generator positioned on stream `i`. Results
//! are deterministic given `(seed, stream_index)`.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable RNG with an independent-sub-stream split discipline.
#[derive(Debug, Clone)]
pub struct StreamRng(ChaCha8Rng);

impl StreamRng {
    /// Master generator for the given seed (stream 0).
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Derive the independent sub-stream `stream_index` out of
    /// `total_streams`.
    ///
    /// The bound only guards against layout bugs; any index below `2^64`
    /// yields a valid independent stream.
    pub fn split(&self, total_streams: u64, stream_index: u64) -> Self {
        debug_assert!(
            stream_index < total_streams,
            "stream index {stream_index} out of {total_streams}"
        );
        let mut sub = self.0.clone();
        sub.set_stream(stream_index);
        Self(sub)
    }
}

impl RngCore for StreamRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}
