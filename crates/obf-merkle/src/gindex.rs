//! Generalized-index arithmetic (spec.md §3, §4.G).
//!
//! The root is gindex 1; the left child of `g` is `2g`, the right is `2g+1`.
//! A path from the root to `g` is read from the high-order bit down, after
//! skipping the sentinel leading 1 bit.

use crate::error::MerkleError;
use crate::tree::TreeNode;
use std::rc::Rc;

/// Number of bits needed to represent `x` (Python's `int.bit_length`).
#[inline]
#[must_use]
pub fn bit_length(x: u64) -> u32 {
    64 - x.leading_zeros()
}

/// Depth of gindex `g` below the root (root has depth 0).
#[inline]
#[must_use]
pub fn depth_of(g: u64) -> u32 {
    bit_length(g) - 1
}

/// Navigate from `root` to the node at `gindex`, calling `get_left`/`get_right`
/// once per level. Works uniformly over a materialized [`crate::node::Node`],
/// a [`crate::shim::ShimNode`]-wrapped tree, or a
/// [`crate::partial::PartialNode`] reconstructed from a witness — the
/// "structural view reads through the tree view" design (spec.md §9).
///
/// # Errors
/// Propagates [`MerkleError::DescendIntoLeaf`] if the path runs into a leaf
/// before reaching `gindex`.
pub fn navigate(
    root: &Rc<dyn TreeNode>,
    gindex: u64,
) -> Result<Rc<dyn TreeNode>, MerkleError> {
    let depth = depth_of(gindex);
    let mut node = Rc::clone(root);
    for level in (0..depth).rev() {
        let go_right = (gindex >> level) & 1 == 1;
        node = if go_right { node.get_right()? } else { node.get_left()? };
    }
    Ok(node)
}

/// One step of the witness-slicer descent (spec.md §4.G, §9):
/// `pivot = 1 << (gindex.bit_length() - 2)`; `go_right = (gindex & pivot) != 0`;
/// the child gindex strips the top (sentinel) bit and sets the next one.
///
/// Returns `(go_right, child_gindex)`. Panics if `gindex == 1` (the root has
/// no parent direction); callers must special-case the root themselves.
#[inline]
#[must_use]
pub fn descend_step(gindex: u64) -> (bool, u64) {
    assert!(gindex > 1, "descend_step called on the root gindex");
    let pivot = 1u64 << (bit_length(gindex) - 2);
    let go_right = gindex & pivot != 0;
    let child = (gindex | pivot) - (pivot << 1);
    (go_right, child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_length_matches_python_semantics() {
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(2), 2);
        assert_eq!(bit_length(3), 2);
        assert_eq!(bit_length(8), 4);
    }

    #[test]
    fn descend_step_examples() {
        // gindex 2/3 are the direct children of the root: one more `navigate`
        // step bottoms out at gindex 1 (the node itself).
        assert_eq!(descend_step(2), (false, 1));
        assert_eq!(descend_step(3), (true, 1));

        // gindex 10 = 0b1010, bit_length=4, pivot=0b0100 (bit 2):
        // bit 2 of 10 is 0 -> go_right=false; child = (10|4) - 8 = 6.
        assert_eq!(descend_step(0b1010), (false, 0b110));

        // gindex 13 = 0b1101: bit 2 is 1 -> go_right=true; child = 5.
        assert_eq!(descend_step(0b1101), (true, 0b101));
    }
}
