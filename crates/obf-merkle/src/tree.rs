//! The tree view (spec.md §9): every concrete node kind — materialized,
//! access-tracking shim, or witness-reconstructed partial tree — implements
//! this one trait, so `gindex::navigate` and `obf_core::step::next_step` are
//! written once and run unmodified over all three.

use crate::error::MerkleError;
use std::rc::Rc;

/// A node in a binary Merkle tree addressable by generalized index.
///
/// Leaves return `true` from `is_leaf` and `Err(MerkleError::DescendIntoLeaf)`
/// from `get_left`/`get_right`; internal nodes do the reverse.
pub trait TreeNode {
    /// The Keccak-256 root of the subtree rooted at this node.
    fn merkle_root(&self) -> [u8; 32];

    /// Whether this node has no children (a data leaf or an opaque witness
    /// leaf, which are indistinguishable from the outside).
    fn is_leaf(&self) -> bool;

    /// The left child, if any.
    ///
    /// # Errors
    /// Returns [`MerkleError::DescendIntoLeaf`] if `self.is_leaf()`.
    fn get_left(&self) -> Result<Rc<dyn TreeNode>, MerkleError>;

    /// The right child, if any.
    ///
    /// # Errors
    /// Returns [`MerkleError::DescendIntoLeaf`] if `self.is_leaf()`.
    fn get_right(&self) -> Result<Rc<dyn TreeNode>, MerkleError>;

    /// Raw leaf bytes, if this is a materialized (non-opaque) leaf.
    /// Internal nodes and opaque witness leaves return `None`.
    fn leaf_bytes(&self) -> Option<[u8; 32]>;
}
