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

//! Compressed RR Store
//!
//! Holds the pool in Huffman-compressed form and runs seed selection
//! directly on it: every iteration decompress-probes each live set for
//! the current candidate instead of materializing the raw pool. Raw
//! storage is released block-by-block as sets are encoded, which is what
//! caps peak memory for very large sampled populations.
//!
//! ## Record layout (per RR set)
//!
//! ```text
//! u32 code_count | u32 byte_len | u32 overflow_count
//! byte_len bytes (codes, big-endian MSB-first)
//! overflow_count x u32
//! ```
//!
//! Header fields are little-endian; only the bitstream itself is
//! big-endian.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use tracing::debug;
use vistaar_core::{Graph, Result, RrrSet, Vertex};

use crate::config::SelectionConfig;
use crate::generator::RrrPool;
use crate::huffman::HuffmanCodec;
use crate::selector::{rayon_pool, validate_selection};

/// One RR set in compressed form.
#[derive(Debug)]
pub struct CompressedRrr {
    bytes: Vec<u8>,
    code_count: u32,
    overflow: Vec<Vertex>,
    /// Still uncovered. Written at most once per iteration, by the one
    /// task that finds the current seed inside this set; relaxed is
    /// enough, the fork-join barrier orders rounds.
    live: AtomicBool,
}

impl CompressedRrr {
    fn new(bytes: Vec<u8>, code_count: u32, overflow: Vec<Vertex>) -> Self {
        Self {
            bytes,
            code_count,
            overflow,
            live: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn code_count(&self) -> u32 {
        self.code_count
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn overflow(&self) -> &[Vertex] {
        &self.overflow
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    /// Drop the payload buffers (covered sets are never probed again).
    fn release(&mut self) {
        self.bytes = Vec::new();
        self.overflow = Vec::new();
    }

    /// Serialize in the on-wire record layout.
    pub fn write_record<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.code_count)?;
        writer.write_u32::<LittleEndian>(self.bytes.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.overflow.len() as u32)?;
        writer.write_all(&self.bytes)?;
        for &v in &self.overflow {
            writer.write_u32::<LittleEndian>(v)?;
        }
        Ok(())
    }

    /// Deserialize one on-wire record; the set comes back live.
    pub fn read_record<R: Read>(reader: &mut R) -> Result<Self> {
        let code_count = reader.read_u32::<LittleEndian>()?;
        let byte_len = reader.read_u32::<LittleEndian>()? as usize;
        let overflow_count = reader.read_u32::<LittleEndian>()? as usize;
        let mut bytes = vec![0u8; byte_len];
        reader.read_exact(&mut bytes)?;
        let mut overflow = Vec::with_capacity(overflow_count);
        for _ in 0..overflow_count {
            overflow.push(reader.read_u32::<LittleEndian>()?);
        }
        Ok(Self::new(bytes, code_count, overflow))
    }
}

/// Aggregate encode counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressStats {
    /// Vertices scanned across all encoded sets.
    pub input_vertices: u64,
    /// Vertices that received a code in the bitstream.
    pub encoded_vertices: u64,
    /// Vertices stored verbatim (or dropped, in lossy mode).
    pub overflow_vertices: u64,
    /// Total bitstream payload bytes.
    pub payload_bytes: u64,
}

impl CompressStats {
    /// Raw u32 pool bytes over compressed payload bytes.
    pub fn compression_ratio(&self) -> f64 {
        let overflow_bytes = self.overflow_vertices * std::mem::size_of::<Vertex>() as u64;
        let out = self.payload_bytes + overflow_bytes;
        if out == 0 {
            return 1.0;
        }
        (self.input_vertices * std::mem::size_of::<Vertex>() as u64) as f64 / out as f64
    }
}

/// The pool in compressed form, plus its code book.
pub struct CompressedPool {
    codec: HuffmanCodec,
    num_nodes: usize,
    sets: Vec<CompressedRrr>,
    stats: CompressStats,
}

/// Thread-local accumulator for one probe round.
struct RoundTally {
    counts: Vec<u32>,
    freq: usize,
    covered: Vec<usize>,
    scratch: Vec<Vertex>,
}

impl RoundTally {
    fn new(num_nodes: usize) -> Self {
        Self {
            counts: vec![0; num_nodes],
            freq: 0,
            covered: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

struct RoundOutcome {
    freq: usize,
    covered: Vec<usize>,
    next_max: Option<Vertex>,
}

impl CompressedPool {
    /// Empty store around an existing code book; sets arrive through
    /// [`encode_block`](Self::encode_block).
    pub fn with_codec(codec: HuffmanCodec, num_nodes: usize) -> Self {
        Self {
            codec,
            num_nodes,
            sets: Vec::new(),
            stats: CompressStats::default(),
        }
    }

    /// Build the code book from `pool` and encode all of it, releasing
    /// the raw storage of every set.
    pub fn from_pool(num_nodes: usize, pool: &mut RrrPool, config: &SelectionConfig) -> Result<Self> {
        let codec = HuffmanCodec::from_pool(num_nodes, pool);
        let mut store = Self::with_codec(codec, num_nodes);
        store.encode_block(pool, 0, config)?;
        Ok(store)
    }

    /// Encode `pool[offset..]` in parallel and append it to the store.
    /// Each raw set's storage is released once encoded.
    pub fn encode_block(
        &mut self,
        pool: &mut RrrPool,
        offset: usize,
        config: &SelectionConfig,
    ) -> Result<()> {
        let workers = rayon_pool(config.num_threads)?;
        let input_vertices: u64 = pool[offset..].iter().map(|s| s.len() as u64).sum();

        let codec = &self.codec;
        let lossy = config.lossy;
        let block: Vec<CompressedRrr> = workers.install(|| {
            pool[offset..]
                .par_iter_mut()
                .map(|set| {
                    let encoded = codec.encode_set(set.as_mut_slice(), lossy);
                    *set = RrrSet::new();
                    CompressedRrr::new(encoded.bytes, encoded.code_count, encoded.overflow)
                })
                .collect()
        });

        let mut encoded_vertices = 0u64;
        let mut overflow_vertices = 0u64;
        let mut payload_bytes = 0u64;
        for set in &block {
            encoded_vertices += set.code_count as u64;
            overflow_vertices += set.overflow.len() as u64;
            payload_bytes += set.bytes.len() as u64;
        }
        self.stats.input_vertices += input_vertices;
        self.stats.encoded_vertices += encoded_vertices;
        self.stats.overflow_vertices += if lossy {
            input_vertices - encoded_vertices
        } else {
            overflow_vertices
        };
        self.stats.payload_bytes += payload_bytes;
        debug!(
            block = block.len(),
            encoded_vertices,
            overflow_vertices,
            payload_bytes,
            "block encoded"
        );
        self.sets.extend(block);
        Ok(())
    }

    /// Number of compressed sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sets still uncovered.
    pub fn live_count(&self) -> usize {
        self.sets.iter().filter(|s| s.is_live()).count()
    }

    pub fn stats(&self) -> CompressStats {
        self.stats
    }

    pub fn codec(&self) -> &HuffmanCodec {
        &self.codec
    }

    pub fn get(&self, index: usize) -> Option<&CompressedRrr> {
        self.sets.get(index)
    }

    /// Greedy selection over the compressed sets.
    ///
    /// Every iteration probes each live set for the current pick: a hit
    /// retires the set, a miss tallies its full decode (plus overflow)
    /// toward the next argmax. Ties prefer the smaller vertex id.
    pub fn select(&mut self, k: usize, config: &SelectionConfig) -> Result<(f64, Vec<Vertex>)> {
        validate_selection(self.num_nodes, k)?;
        if self.sets.is_empty() {
            return Ok((0.0, Vec::new()));
        }

        let workers = rayon_pool(config.num_threads)?;
        let total = self.sets.len();
        let mut uncovered = total;
        let mut seeds = Vec::with_capacity(k);
        let mut maxvtx = self.codec.maxvtx();

        while seeds.len() < k && uncovered != 0 {
            seeds.push(maxvtx);
            let outcome = workers.install(|| self.probe_round(maxvtx));
            uncovered -= outcome.freq;
            debug!(seed = maxvtx, freq = outcome.freq, uncovered, "probe round");

            if config.eager_release {
                for &i in &outcome.covered {
                    self.sets[i].release();
                }
            }
            // No live set contains any vertex: nothing left to gain.
            let Some(next) = outcome.next_max else { break };
            maxvtx = next;
        }

        let f = (total - uncovered) as f64 / total as f64;
        Ok((f, seeds))
    }

    fn probe_round(&self, maxvtx: Vertex) -> RoundOutcome {
        let tally = self
            .sets
            .par_iter()
            .enumerate()
            .fold(
                || RoundTally::new(self.num_nodes),
                |mut acc, (i, set)| {
                    if !set.live.load(Ordering::Relaxed) {
                        return acc;
                    }
                    acc.scratch.clear();
                    let mut found = self.codec.decode_and_probe(
                        &set.bytes,
                        set.code_count,
                        maxvtx,
                        &mut acc.scratch,
                    );
                    if !found {
                        found = set.overflow.contains(&maxvtx);
                    }
                    if found {
                        set.live.store(false, Ordering::Relaxed);
                        acc.freq += 1;
                        acc.covered.push(i);
                    } else {
                        // Miss: the scratch now holds the full decode.
                        for &v in &acc.scratch {
                            acc.counts[v as usize] += 1;
                        }
                        for &v in &set.overflow {
                            acc.counts[v as usize] += 1;
                        }
                    }
                    acc
                },
            )
            .reduce(
                || RoundTally::new(self.num_nodes),
                |mut a, b| {
                    for (x, &y) in a.counts.iter_mut().zip(&b.counts) {
                        *x += y;
                    }
                    a.freq += b.freq;
                    a.covered.extend(b.covered);
                    a
                },
            );

        let mut next_max = None;
        let mut best = 0u32;
        for (v, &c) in tally.counts.iter().enumerate() {
            if c > best {
                best = c;
                next_max = Some(v as Vertex);
            }
        }
        RoundOutcome {
            freq: tally.freq,
            covered: tally.covered,
            next_max,
        }
    }
}

/// Compress `pool` and select up to `k` seeds directly on the compressed
/// form. Returns the covered fraction and the seeds; matches
/// [`find_most_influential`](crate::selector::find_most_influential) on
/// the same pool and tie-break rule.
pub fn huffman_find(
    graph: &Graph,
    k: usize,
    mut pool: RrrPool,
    config: &SelectionConfig,
) -> Result<(f64, Vec<Vertex>)> {
    validate_selection(graph.num_nodes(), k)?;
    if pool.is_empty() {
        return Ok((0.0, Vec::new()));
    }
    let mut store = CompressedPool::from_pool(graph.num_nodes(), &mut pool, config)?;
    store.select(k, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::find_most_influential;
    use smallvec::smallvec;

    fn nodes_only(n: usize) -> Graph {
        Graph::from_edges(n, &[])
    }

    fn pool_of(sets: &[&[Vertex]]) -> RrrPool {
        sets.iter().map(|s| RrrSet::from_slice(s)).collect()
    }

    #[test]
    fn test_record_roundtrip() {
        let set = CompressedRrr::new(vec![0xAB, 0xCD, 0x80], 5, vec![7, 99]);
        let mut buf = Vec::new();
        set.write_record(&mut buf).unwrap();
        let back = CompressedRrr::read_record(&mut buf.as_slice()).unwrap();
        assert_eq!(back.code_count(), 5);
        assert_eq!(back.bytes(), &[0xAB, 0xCD, 0x80]);
        assert_eq!(back.overflow(), &[7, 99]);
        assert!(back.is_live());
    }

    #[test]
    fn test_record_layout_is_stable() {
        let set = CompressedRrr::new(vec![0xFF], 1, vec![2]);
        let mut buf = Vec::new();
        set.write_record(&mut buf).unwrap();
        assert_eq!(
            buf,
            vec![
                1, 0, 0, 0, // code_count
                1, 0, 0, 0, // byte_len
                1, 0, 0, 0, // overflow_count
                0xFF, // bitstream
                2, 0, 0, 0, // overflow
            ]
        );
    }

    #[test]
    fn test_encode_releases_raw_storage() {
        let mut pool = pool_of(&[&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[0, 1]]);
        let store =
            CompressedPool::from_pool(10, &mut pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(store.len(), 2);
        for set in &pool {
            assert!(set.is_empty());
        }
        let stats = store.stats();
        assert_eq!(stats.input_vertices, 11);
        assert_eq!(stats.encoded_vertices + stats.overflow_vertices, 11);
    }

    #[test]
    fn test_block_encode_appends() {
        let full = pool_of(&[&[0, 1], &[1, 2], &[0, 2], &[2]]);
        let codec = HuffmanCodec::from_pool(3, &full);

        let mut store = CompressedPool::with_codec(codec, 3);
        let mut pool = full.clone();
        store
            .encode_block(&mut pool, 0, &SelectionConfig::sequential())
            .unwrap();
        assert_eq!(store.len(), 4);

        // Appending a later block reuses the same book.
        let mut more = pool_of(&[&[1], &[0, 1, 2]]);
        store
            .encode_block(&mut more, 0, &SelectionConfig::sequential())
            .unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(store.live_count(), 6);
    }

    #[test]
    fn test_compressed_selection_matches_expected_order() {
        let g = nodes_only(5);
        let pool = pool_of(&[&[0, 1, 2], &[1, 2, 3], &[2, 3, 4], &[0, 4]]);
        let (f, seeds) =
            huffman_find(&g, 2, pool.clone(), &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![2, 0]);
        assert_eq!(f, 1.0);

        let (f, seeds) = huffman_find(&g, 1, pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![2]);
        assert_eq!(f, 0.75);
    }

    #[test]
    fn test_compressed_matches_raw_selector() {
        let g = nodes_only(30);
        let sets: Vec<RrrSet> = (0..300u32)
            .map(|i| {
                let mut s: Vec<Vertex> =
                    vec![(i * 7) % 30, (i * 13 + 2) % 30, (i * 23 + 11) % 30];
                s.sort_unstable();
                s.dedup();
                RrrSet::from_vec(s)
            })
            .collect();

        for k in [1, 4, 10] {
            let mut raw = sets.clone();
            let expected =
                find_most_influential(&g, k, &mut raw, &SelectionConfig::default()).unwrap();
            let got = huffman_find(&g, k, sets.clone(), &SelectionConfig::default()).unwrap();
            assert_eq!(got, expected, "k={k}");
        }
    }

    #[test]
    fn test_pool_exhausted_before_k() {
        let g = nodes_only(8);
        let pool = pool_of(&[&[1, 5], &[5], &[2, 5, 7], &[0, 5]]);
        let (f, seeds) = huffman_find(&g, 3, pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![5]);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_empty_pool() {
        let g = nodes_only(4);
        let (f, seeds) =
            huffman_find(&g, 2, RrrPool::new(), &SelectionConfig::default()).unwrap();
        assert_eq!(f, 0.0);
        assert!(seeds.is_empty());
    }

    #[test]
    fn test_eager_release_frees_covered_buffers() {
        let config = SelectionConfig {
            eager_release: true,
            ..SelectionConfig::sequential()
        };
        let mut pool = pool_of(&[&[0, 1], &[0, 2], &[3]]);
        let mut store = CompressedPool::from_pool(4, &mut pool, &config).unwrap();
        let (_, seeds) = store.select(1, &config).unwrap();
        assert_eq!(seeds, vec![0]);
        for i in 0..store.len() {
            let set = store.get(i).unwrap();
            if !set.is_live() {
                assert!(set.bytes().is_empty());
                assert!(set.overflow().is_empty());
            }
        }
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_overflow_only_sets_are_probed() {
        // A one-symbol book assigns a zero-length code, pushing every
        // vertex to the overflow list; probing must still cover the sets.
        let g = nodes_only(6);
        let pool: RrrPool = vec![smallvec![4u32], smallvec![4u32], smallvec![4u32]];
        let (f, seeds) = huffman_find(&g, 1, pool, &SelectionConfig::sequential()).unwrap();
        assert_eq!(seeds, vec![4]);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_lossy_mode_still_selects_on_encoded_symbols() {
        let config = SelectionConfig {
            lossy: true,
            ..SelectionConfig::sequential()
        };
        let mut pool = pool_of(&[&[0, 1, 2], &[1, 2], &[2, 3], &[3]]);
        let mut store = CompressedPool::from_pool(4, &mut pool, &config).unwrap();
        let (_, seeds) = store.select(2, &config).unwrap();
        assert_eq!(seeds[0], 2);
        for i in 0..store.len() {
            assert!(store.get(i).unwrap().overflow().is_empty());
        }
    }
}
