//! Fixed-arity container merkleization (spec.md §3's `Container` shape).
//!
//! A container with `n` fields is merkleized as a perfect binary tree of
//! depth `ceil(log2(n))`, field `i` living at local gindex `2^depth + i`;
//! slots past `n` (when `n` isn't a power of two) are padded with zero
//! hashes at the matching depth, exactly like `brainfuck.py`'s typed views
//! (backed by `remerkleable.Container`).

use crate::hash::zero_hash;
use crate::node::Node;
use crate::tree::TreeNode;
use std::rc::Rc;

/// `ceil(log2(n))`, the depth of an `n`-field container (`n >= 1`).
#[must_use]
pub fn container_depth(n: usize) -> u32 {
    assert!(n >= 1, "a container needs at least one field");
    if n == 1 {
        return 0;
    }
    (usize::BITS - (n - 1).leading_zeros()) as u32
}

/// Build a container's root from its field leaves (already-hashed 32-byte
/// chunks, or subtree roots for nested containers/lists), padding unused
/// slots up to `2^depth` with zero hashes.
///
/// # Panics
/// Panics if `fields.len()` exceeds `2^depth`.
#[must_use]
pub fn build_container(fields: &[Rc<dyn TreeNode>]) -> Rc<dyn TreeNode> {
    let depth = container_depth(fields.len());
    let width = 1usize << depth;
    assert!(fields.len() <= width);
    let mut level: Vec<Rc<dyn TreeNode>> = fields.to_vec();
    level.resize_with(width, || Node::leaf(zero_hash(0)));
    let mut d = depth;
    while d > 0 {
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            next.push(Node::pair(Rc::clone(&pair[0]), Rc::clone(&pair[1])));
        }
        level = next;
        d -= 1;
    }
    level.into_iter().next().unwrap_or_else(|| Node::leaf(zero_hash(0)))
}

/// The local generalized index of field `i` within its container, given the
/// container's depth.
#[must_use]
pub fn field_gindex(depth: u32, i: usize) -> u64 {
    (1u64 << depth) + i as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_matches_power_of_two_rounding() {
        assert_eq!(container_depth(1), 0);
        assert_eq!(container_depth(2), 1);
        assert_eq!(container_depth(3), 2);
        assert_eq!(container_depth(4), 2);
        assert_eq!(container_depth(5), 3);
    }

    #[test]
    fn single_field_container_is_just_that_field() {
        let leaf = Node::leaf([5u8; 32]);
        let root = build_container(&[Rc::clone(&leaf)]);
        assert_eq!(root.merkle_root(), [5u8; 32]);
    }

    #[test]
    fn padded_slots_use_the_zero_hash() {
        let a = Node::leaf([1u8; 32]);
        let b = Node::leaf([2u8; 32]);
        let c = Node::leaf([3u8; 32]);
        // 3 fields -> depth 2, width 4, last slot padded with zero_hash(0).
        let root = build_container(&[a, b, c]);
        let depth = container_depth(3);
        let padded_gindex = field_gindex(depth, 3);
        let node = crate::gindex::navigate(&root, padded_gindex).unwrap();
        assert_eq!(node.merkle_root(), zero_hash(0));
    }
}
