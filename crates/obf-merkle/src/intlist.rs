//! `List<uint32, N>`: a length-prefixed sequence of big-endian `u32`s,
//! packed 8 per 32-byte chunk (spec.md §3's `stack: List<uint32, 1024>`).

use crate::hash::zero_hash;
use crate::node::Node;
use crate::tree::TreeNode;
use std::rc::Rc;

const ITEMS_PER_CHUNK: usize = 8;

fn chunk_count(capacity_items: usize) -> usize {
    capacity_items.div_ceil(ITEMS_PER_CHUNK).max(1)
}

fn data_depth(chunks: usize) -> u32 {
    if chunks <= 1 {
        0
    } else {
        (usize::BITS - (chunks - 1).leading_zeros()) as u32
    }
}

/// Merkleize `items` (length `<= capacity_items`) as a length-mixed-in
/// `u32` list.
///
/// # Panics
/// Panics if `items.len() > capacity_items`.
#[must_use]
pub fn merkleize_u32_list(items: &[u32], capacity_items: usize) -> Rc<dyn TreeNode> {
    assert!(items.len() <= capacity_items);
    let chunks = chunk_count(capacity_items);
    let depth = data_depth(chunks);
    let width = 1usize << depth;

    let mut leaves: Vec<Rc<dyn TreeNode>> = items
        .chunks(ITEMS_PER_CHUNK)
        .map(|group| {
            let mut chunk = [0u8; 32];
            for (i, v) in group.iter().enumerate() {
                chunk[i * 4..i * 4 + 4].copy_from_slice(&v.to_be_bytes());
            }
            Node::leaf(chunk)
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
    len_bytes[24..].copy_from_slice(&(items.len() as u64).to_be_bytes());
    let len_leaf = Node::leaf(len_bytes);

    Node::pair(data_root, len_leaf)
}

/// Local gindex of the chunk containing item `i`, within the data subtree.
#[must_use]
pub fn chunk_gindex(capacity_items: usize, i: usize) -> u64 {
    let depth = data_depth(chunk_count(capacity_items));
    let chunk_index = i / ITEMS_PER_CHUNK;
    (crate::bytelist::DATA_ROOT_GINDEX << depth) + chunk_index as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_occupies_the_first_four_bytes_big_endian() {
        let r1 = merkleize_u32_list(&[0x0102_0304], 8);
        let r2 = merkleize_u32_list(&[0x0102_0304], 8);
        assert_eq!(r1.merkle_root(), r2.merkle_root());
        let empty = merkleize_u32_list(&[], 8);
        assert_ne!(r1.merkle_root(), empty.merkle_root());
    }

    #[test]
    fn length_is_mixed_into_the_root() {
        let a = merkleize_u32_list(&[1, 2], 1024);
        let b = merkleize_u32_list(&[1, 2, 0], 1024);
        assert_ne!(a.merkle_root(), b.merkle_root());
    }
}
