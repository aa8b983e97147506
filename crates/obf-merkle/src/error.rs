//! Tree-level error domain.
//!
//! These are the "proof-level fatal" errors of the step function's tree
//! abstraction: they never represent a transaction outcome (see
//! `obf_core::ExitCode` for that), only a malformed or insufficient tree.

use thiserror::Error;

/// Errors raised while navigating a [`crate::tree::TreeNode`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MerkleError {
    /// Attempted to descend (`get_left`/`get_right`) into a node that has no
    /// children: either a genuine data leaf, or an opaque witness leaf that
    /// only carries a hash. Descending into the latter is exactly how an
    /// under-declared access set is caught (spec.md §4.G).
    #[error("attempted to descend into a leaf at gindex {0}")]
    DescendIntoLeaf(u64),

    /// Partial-tree reconstruction recursed past the depth sanity cap
    /// (`2^60`) without finding a witness leaf; the witness is missing data.
    #[error("tree depth exceeded 2^60 at gindex {0}: witness data must be missing")]
    DepthExceeded(u64),
}
