//! `ByteList`: a runtime-capacity byte buffer, merkleized the SSZ way —
//! bytes are packed 32 to a chunk, the chunks form a zero-padded binary tree
//! up to the capacity depth, and that data tree is mixed with a length leaf
//! so two lists of different length never collide on root (spec.md §3's
//! `Cells`/`PayloadData` fields).

use crate::hash::zero_hash;
use crate::node::Node;
use crate::tree::TreeNode;
use std::rc::Rc;

/// Number of 32-byte chunks needed to hold `capacity_bytes`.
#[must_use]
fn capacity_chunks(capacity_bytes: usize) -> usize {
    capacity_bytes.div_ceil(32).max(1)
}

/// `ceil(log2(chunks))`, the depth of the data subtree.
#[must_use]
fn data_depth(chunks: usize) -> u32 {
    if chunks <= 1 {
        0
    } else {
        (usize::BITS - (chunks - 1).leading_zeros()) as u32
    }
}

/// Merkleize `data` (length `<= capacity_bytes`) as a length-mixed-in
/// byte list, per the scheme above.
///
/// # Panics
/// Panics if `data.len() > capacity_bytes`.
#[must_use]
pub fn merkleize_bytelist(data: &[u8], capacity_bytes: usize) -> Rc<dyn TreeNode> {
    assert!(data.len() <= capacity_bytes);
    let chunks = capacity_chunks(capacity_bytes);
    let depth = data_depth(chunks);
    let width = 1usize << depth;

    let mut leaves: Vec<Rc<dyn TreeNode>> = data
        .chunks(32)
        .map(|chunk| {
            let mut buf = [0u8; 32];
            buf[..chunk.len()].copy_from_slice(chunk);
            Node::leaf(buf)
        })
        .collect();
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
    len_bytes[24..].copy_from_slice(&(data.len() as u64).to_be_bytes());
    let len_leaf = Node::leaf(len_bytes);

    Node::pair(data_root, len_leaf)
}

/// The local generalized index of the length mixin leaf (always the right
/// child of the top pair built by [`merkleize_bytelist`]).
pub const LENGTH_GINDEX: u64 = 3;

/// The local generalized index of the data subtree's root.
pub const DATA_ROOT_GINDEX: u64 = 2;

/// Local gindex of chunk `i` within the data subtree, for a list whose
/// capacity yields `chunks` total chunk slots.
#[must_use]
pub fn chunk_gindex(capacity_bytes: usize, i: usize) -> u64 {
    let depth = data_depth(capacity_chunks(capacity_bytes));
    let chunk_index = i / 32;
    (DATA_ROOT_GINDEX << depth) + chunk_index as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_roots_are_capacity_dependent_but_deterministic() {
        let r1 = merkleize_bytelist(&[], 64);
        let r2 = merkleize_bytelist(&[], 64);
        assert_eq!(r1.merkle_root(), r2.merkle_root());
    }

    #[test]
    fn different_lengths_produce_different_roots() {
        let empty = merkleize_bytelist(&[], 64);
        let one_byte = merkleize_bytelist(&[7u8], 64);
        assert_ne!(empty.merkle_root(), one_byte.merkle_root());
    }

    #[test]
    fn same_bytes_same_capacity_same_root() {
        let a = merkleize_bytelist(b"hello", 128);
        let b = merkleize_bytelist(b"hello", 128);
        assert_eq!(a.merkle_root(), b.merkle_root());
    }
}
