//! `Bitlist`: packs bits into 256-bit (32-byte) chunks of a zero-padded
//! binary tree, then mixes in the bit length — the tree shape for `Code`
//! (spec.md §3, §4.B). Bits are packed MSB-first within each byte, matching
//! the big-endian convention used everywhere else on the wire.

use crate::hash::zero_hash;
use crate::node::Node;
use crate::tree::TreeNode;
use std::rc::Rc;

const BITS_PER_CHUNK: usize = 256;

fn chunk_count(capacity_bits: usize) -> usize {
    capacity_bits.div_ceil(BITS_PER_CHUNK).max(1)
}

fn data_depth(chunks: usize) -> u32 {
    if chunks <= 1 {
        0
    } else {
        (usize::BITS - (chunks - 1).leading_zeros()) as u32
    }
}

/// Pack `bits` (length `<= capacity_bits`) into 32-byte chunks, MSB-first.
fn pack_bits(bits: &[bool]) -> Vec<[u8; 32]> {
    bits.chunks(BITS_PER_CHUNK)
        .map(|group| {
            let mut chunk = [0u8; 32];
            for (i, &bit) in group.iter().enumerate() {
                if bit {
                    chunk[i / 8] |= 0x80 >> (i % 8);
                }
            }
            chunk
        })
        .collect()
}

/// Merkleize `bits` as a length-mixed-in bitlist.
///
/// # Panics
/// Panics if `bits.len() > capacity_bits`.
#[must_use]
pub fn merkleize_bitlist(bits: &[bool], capacity_bits: usize) -> Rc<dyn TreeNode> {
    assert!(bits.len() <= capacity_bits);
    let chunks = chunk_count(capacity_bits);
    let depth = data_depth(chunks);
    let width = 1usize << depth;

    let mut leaves: Vec<Rc<dyn TreeNode>> =
        pack_bits(bits).into_iter().map(Node::leaf).collect();
    leaves.resize_with(width, || Node::leaf(zero_hash(0)));

    let mut level = leaves;
    let mut d = depth;
    while d > 0 {
        level = level
            .chunks(2)
            .map(|pair| Node::pair(Rc::clone(&pair[0]), Rc::clone(&pair[1])))
            .collect();
        d -= 1;
    }
    let data_root = level.into_iter().next().unwrap_or_else(|| Node::leaf(zero_hash(0)));

    let mut len_bytes = [0u8; 32];
    len_bytes[24..].copy_from_slice(&(bits.len() as u64).to_be_bytes());
    let len_leaf = Node::leaf(len_bytes);

    Node::pair(data_root, len_leaf)
}

/// Local gindex of the bit chunk containing bit `i`, within the data
/// subtree (`crate::bytelist::DATA_ROOT_GINDEX` within the bitlist root).
#[must_use]
pub fn chunk_gindex(capacity_bits: usize, i: usize) -> u64 {
    let depth = data_depth(chunk_count(capacity_bits));
    let chunk_index = i / BITS_PER_CHUNK;
    (crate::bytelist::DATA_ROOT_GINDEX << depth) + chunk_index as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_nonempty_bitlists_differ() {
        let empty = merkleize_bitlist(&[], 2048);
        let one = merkleize_bitlist(&[true], 2048);
        assert_ne!(empty.merkle_root(), one.merkle_root());
    }

    #[test]
    fn deterministic_for_same_bits() {
        let bits = vec![true, false, true, true, false, false, true, false, true];
        let a = merkleize_bitlist(&bits, 2048);
        let b = merkleize_bitlist(&bits, 2048);
        assert_eq!(a.merkle_root(), b.merkle_root());
    }

    #[test]
    fn msb_first_packing_sets_the_top_bit_of_the_first_byte() {
        let chunks = pack_bits(&[true]);
        assert_eq!(chunks[0][0], 0x80);
    }
}
