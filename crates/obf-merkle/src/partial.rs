//! Partial-tree reconstruction from a witness (spec.md §7, §9; grounded on
//! `original_source/obf/_cli.py`'s `construct_backing`).
//!
//! A [`StepWitness`]'s `node_by_gindex` map gives the verifier exactly the
//! nodes it declared it would need. Reconstruction turns that sparse map
//! back into a `TreeNode`: any gindex present in the map becomes an opaque
//! leaf (hash only, no children); any gindex whose *descendant* appears in
//! the map becomes an internal node whose children are reconstructed
//! recursively. Descending into an opaque leaf is a [`MerkleError`] — that's
//! the soundness mechanism that forces provers to declare a sufficient
//! witness.

use crate::error::MerkleError;
use crate::tree::TreeNode;
use std::collections::HashMap;
use std::rc::Rc;

/// Recursion past this depth means the witness map has no entry on this
/// path at all — treated as insufficient-witness, not an infinite loop
/// (spec.md §7's `2^60` cap, taken directly from `_cli.py`).
const MAX_GINDEX: u64 = 1u64 << 60;

/// A witness leaf: either the hash-only declaration the prover gave (opaque)
/// or materialized bytes the verifier can read directly. The wire format
/// (spec.md §6) only ever carries opaque 32-byte values; `Materialized`
/// exists so in-process callers can seed known leaves without a round trip.
pub enum PartialNode {
    Opaque([u8; 32]),
    Pair {
        left: Rc<dyn TreeNode>,
        right: Rc<dyn TreeNode>,
        root: [u8; 32],
    },
}

impl TreeNode for PartialNode {
    fn merkle_root(&self) -> [u8; 32] {
        match self {
            Self::Opaque(h) => *h,
            Self::Pair { root, .. } => *root,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    fn get_left(&self) -> Result<Rc<dyn TreeNode>, MerkleError> {
        match self {
            Self::Opaque(_) => Err(MerkleError::DescendIntoLeaf(2)),
            Self::Pair { left, .. } => Ok(Rc::clone(left)),
        }
    }

    fn get_right(&self) -> Result<Rc<dyn TreeNode>, MerkleError> {
        match self {
            Self::Opaque(_) => Err(MerkleError::DescendIntoLeaf(3)),
            Self::Pair { right, .. } => Ok(Rc::clone(right)),
        }
    }

    fn leaf_bytes(&self) -> Option<[u8; 32]> {
        None
    }
}

/// Reconstruct a tree from a gindex-keyed witness map, rooted at gindex 1.
///
/// # Errors
/// Returns [`MerkleError::DepthExceeded`] if a path descends past `2^60`
/// without hitting a declared node — the witness omitted a node on that path.
pub fn reconstruct(
    node_by_gindex: &HashMap<u64, [u8; 32]>,
) -> Result<Rc<dyn TreeNode>, MerkleError> {
    build(node_by_gindex, 1)
}

fn build(
    node_by_gindex: &HashMap<u64, [u8; 32]>,
    gindex: u64,
) -> Result<Rc<dyn TreeNode>, MerkleError> {
    if let Some(hash) = node_by_gindex.get(&gindex) {
        return Ok(Rc::new(PartialNode::Opaque(*hash)));
    }
    if gindex >= MAX_GINDEX {
        return Err(MerkleError::DepthExceeded(gindex));
    }
    let left = build(node_by_gindex, gindex * 2)?;
    let right = build(node_by_gindex, gindex * 2 + 1)?;
    let root = crate::hash::pair_hash(&left.merkle_root(), &right.merkle_root());
    Ok(Rc::new(PartialNode::Pair { left, right, root }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn reconstructs_matching_root_for_full_witness() {
        let a = Node::leaf([1u8; 32]);
        let b = Node::leaf([2u8; 32]);
        let full = Node::pair(a, b);

        let mut map = HashMap::new();
        map.insert(2u64, [1u8; 32]);
        map.insert(3u64, [2u8; 32]);
        let partial = reconstruct(&map).unwrap();
        assert_eq!(partial.merkle_root(), full.merkle_root());
    }

    #[test]
    fn declaring_only_the_root_hash_gives_an_opaque_leaf() {
        let mut map = HashMap::new();
        map.insert(1u64, [7u8; 32]);
        let partial = reconstruct(&map).unwrap();
        assert!(partial.is_leaf());
        assert!(partial.get_left().is_err());
    }

    #[test]
    fn missing_witness_on_a_path_hits_the_depth_cap() {
        let map: HashMap<u64, [u8; 32]> = HashMap::new();
        let err = reconstruct(&map).unwrap_err();
        assert!(matches!(err, MerkleError::DepthExceeded(_)));
    }
}
