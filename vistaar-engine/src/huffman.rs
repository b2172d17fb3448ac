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

//! Frequency-Adaptive Huffman Codec for RR Sets
//!
//! One scan over the pool accumulates per-vertex frequencies; the code
//! tree is built from a binary heap of `(frequency, node)` pairs and
//! lives in a flat arena with index links, so dropping the codec frees
//! every node at once. Codes are assigned left=0 / right=1 and stored
//! left-aligned in a `u128` with their bit length.
//!
//! Encoding packs codes big-endian MSB-first with no delimiters; a
//! `lack_bits` remainder in `[0, 8)` carries the partial trailing byte
//! between appends, and the final byte is zero-padded in its low bits.
//! Vertices whose code is longer than [`MAX_ENCODED_BITS`] (or absent
//! from the book) take the overflow path and are stored verbatim.
//!
//! `decode_and_probe` is the primitive that lets selection run on
//! compressed sets: it walks the bitstream through the tree and exits as
//! soon as the probed vertex is emitted.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;
use vistaar_core::{RrrSet, Vertex};

/// Codes longer than this spill to the overflow list, even though the
/// code word itself could hold 128 bits. Tunable.
pub const MAX_ENCODED_BITS: u8 = 32;

const NO_CHILD: u32 = u32::MAX;

/// Arena node; leaves carry a vertex, internal nodes carry children.
#[derive(Debug, Clone, Copy)]
struct HuffNode {
    freq: u64,
    vertex: Vertex,
    left: u32,
    right: u32,
}

impl HuffNode {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.left == NO_CHILD
    }
}

/// One code-book entry: bits left-aligned in the word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Code {
    pub bits: u128,
    pub len: u8,
}

/// An RR set after encoding.
#[derive(Debug, Clone, Default)]
pub struct EncodedSet {
    /// Concatenated variable-length codes, big-endian MSB-first.
    pub bytes: Vec<u8>,
    /// Number of vertices encoded into `bytes`.
    pub code_count: u32,
    /// Vertices stored verbatim (no code, or code too long).
    pub overflow: Vec<Vertex>,
}

/// Huffman code book over a vertex universe.
pub struct HuffmanCodec {
    nodes: Vec<HuffNode>,
    root: Option<u32>,
    codes: Vec<Code>,
    maxvtx: Vertex,
    max_code_len: u8,
}

impl HuffmanCodec {
    /// Build the code book from one scan over `sets`.
    pub fn from_pool(num_nodes: usize, sets: &[RrrSet]) -> Self {
        let mut freq = vec![0u64; num_nodes];
        for set in sets {
            for &v in set.iter() {
                freq[v as usize] += 1;
            }
        }
        Self::from_frequencies(freq)
    }

    /// Build the code book from explicit per-vertex frequencies.
    pub fn from_frequencies(freq: Vec<u64>) -> Self {
        let num_nodes = freq.len();
        let mut nodes: Vec<HuffNode> = Vec::new();
        let mut queue: BinaryHeap<Reverse<(u64, u32)>> = BinaryHeap::new();

        let mut maxvtx = 0;
        let mut max_freq = 0u64;
        for (v, &f) in freq.iter().enumerate() {
            if f == 0 {
                continue;
            }
            // Strict comparison keeps the smallest id among ties, matching
            // the selector's tie-break rule.
            if f > max_freq {
                max_freq = f;
                maxvtx = v as Vertex;
            }
            let idx = nodes.len() as u32;
            nodes.push(HuffNode {
                freq: f,
                vertex: v as Vertex,
                left: NO_CHILD,
                right: NO_CHILD,
            });
            queue.push(Reverse((f, idx)));
        }
        let num_leaves = nodes.len();

        while queue.len() > 1 {
            let (Reverse((fa, a)), Reverse((fb, b))) = match (queue.pop(), queue.pop()) {
                (Some(x), Some(y)) => (x, y),
                _ => break,
            };
            let idx = nodes.len() as u32;
            nodes.push(HuffNode {
                freq: fa + fb,
                vertex: 0,
                left: a,
                right: b,
            });
            queue.push(Reverse((fa + fb, idx)));
        }
        let root = queue.pop().map(|Reverse((_, idx))| idx);

        let mut codec = Self {
            nodes,
            root,
            codes: vec![Code::default(); num_nodes],
            maxvtx,
            max_code_len: 0,
        };
        if let Some(root) = codec.root {
            codec.assign_codes(root, 0, 0);
        }
        debug!(
            leaves = num_leaves,
            max_code_len = codec.max_code_len,
            maxvtx = codec.maxvtx,
            "code book built"
        );
        codec
    }

    /// Walk the tree assigning codes: left appends 0, right appends 1.
    /// With 64-bit frequencies the deepest code fits well inside 128 bits.
    fn assign_codes(&mut self, idx: u32, len: u8, bits: u128) {
        let node = self.nodes[idx as usize];
        if node.is_leaf() {
            self.codes[node.vertex as usize] = Code { bits, len };
            self.max_code_len = self.max_code_len.max(len);
            return;
        }
        debug_assert!(len < 127);
        self.assign_codes(node.left, len + 1, bits);
        self.assign_codes(node.right, len + 1, bits | (1u128 << (127 - len)));
    }

    /// Globally most frequent vertex: the first seed candidate.
    #[inline]
    pub fn maxvtx(&self) -> Vertex {
        self.maxvtx
    }

    /// Code-book entry for `v` (`len == 0` means absent).
    #[inline]
    pub fn code(&self, v: Vertex) -> Code {
        self.codes[v as usize]
    }

    /// Longest assigned code, in bits.
    #[inline]
    pub fn max_code_len(&self) -> u8 {
        self.max_code_len
    }

    /// Encode one RR set. The occurrence of [`maxvtx`](Self::maxvtx) (if
    /// present) is swapped to the front first so the hottest vertex lands
    /// at the head of the bitstream, where the probe finds it earliest.
    /// In lossy mode overflow vertices are discarded instead of stored.
    pub fn encode_set(&self, set: &mut [Vertex], lossy: bool) -> EncodedSet {
        if let Some(pos) = set.iter().position(|&v| v == self.maxvtx) {
            set.swap(0, pos);
        }

        let mut writer = BitWriter::with_capacity(set.len());
        let mut code_count = 0u32;
        let mut overflow = Vec::new();
        for &v in set.iter() {
            let code = self.codes[v as usize];
            if code.len > 0 && code.len <= MAX_ENCODED_BITS {
                writer.append(code.bits, code.len);
                code_count += 1;
            } else if !lossy {
                overflow.push(v);
            }
        }
        EncodedSet {
            bytes: writer.finish(),
            code_count,
            overflow,
        }
    }

    /// Fully decompress `code_count` vertices from `bytes` into `out`.
    pub fn decode(&self, bytes: &[u8], code_count: u32, out: &mut Vec<Vertex>) {
        self.walk(bytes, code_count, None, out);
    }

    /// Decompress with a target probe: emits vertices into `out` until
    /// `target` appears (returns `true`, leaving the tail undecoded) or
    /// `code_count` vertices have been emitted (returns `false`).
    pub fn decode_and_probe(
        &self,
        bytes: &[u8],
        code_count: u32,
        target: Vertex,
        out: &mut Vec<Vertex>,
    ) -> bool {
        self.walk(bytes, code_count, Some(target), out)
    }

    fn walk(
        &self,
        bytes: &[u8],
        code_count: u32,
        target: Option<Vertex>,
        out: &mut Vec<Vertex>,
    ) -> bool {
        if code_count == 0 {
            return false;
        }
        let Some(root) = self.root else { return false };
        let root_node = self.nodes[root as usize];
        if root_node.is_leaf() {
            // Degenerate one-symbol tree: the stream is all one vertex.
            for _ in 0..code_count {
                out.push(root_node.vertex);
            }
            return target == Some(root_node.vertex);
        }

        let mut idx = root;
        let mut emitted = 0u32;
        for &byte in bytes {
            for bit in (0..8u32).rev() {
                let node = &self.nodes[idx as usize];
                idx = if (byte >> bit) & 1 == 0 {
                    node.left
                } else {
                    node.right
                };
                let next = &self.nodes[idx as usize];
                if next.is_leaf() {
                    out.push(next.vertex);
                    if target == Some(next.vertex) {
                        return true;
                    }
                    emitted += 1;
                    if emitted == code_count {
                        return false;
                    }
                    idx = root;
                }
            }
        }
        false
    }
}

/// Big-endian MSB-first bit packer. `lack_bits` counts the unused low
/// bits of the trailing byte, always in `[0, 8)`.
struct BitWriter {
    buf: Vec<u8>,
    lack_bits: u8,
}

impl BitWriter {
    fn with_capacity(codes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(codes * MAX_ENCODED_BITS as usize / 8),
            lack_bits: 0,
        }
    }

    /// Append the top `len` bits of the left-aligned `code`.
    fn append(&mut self, mut code: u128, len: u8) {
        let mut remaining = len as u32;
        if remaining == 0 {
            return;
        }
        if self.lack_bits > 0 {
            let lack = self.lack_bits as u32;
            if let Some(last) = self.buf.last_mut() {
                *last |= (code >> (128 - lack)) as u8;
            }
            if remaining <= lack {
                self.lack_bits = (lack - remaining) as u8;
                return;
            }
            code <<= lack;
            remaining -= lack;
            self.lack_bits = 0;
        }
        while remaining >= 8 {
            self.buf.push((code >> 120) as u8);
            code <<= 8;
            remaining -= 8;
        }
        if remaining > 0 {
            // Low bits of the new trailing byte are zero padding.
            self.buf.push((code >> 120) as u8);
            self.lack_bits = (8 - remaining) as u8;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}
