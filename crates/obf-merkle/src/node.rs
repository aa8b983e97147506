//! A materialized tree node: either a 32-byte leaf or a pair with its root
//! cached at construction time. Grounded on `remerkleable`'s backing-node
//! model as used by `original_source/obf/brainfuck.py`'s typed views, minus
//! the Python library's generic container machinery.

use crate::error::MerkleError;
use crate::hash::pair_hash;
use crate::tree::TreeNode;
use std::rc::Rc;

/// An in-memory node. `Pair` caches its root so repeated `merkle_root()`
/// calls (e.g. while recording every step's roots) don't re-hash.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf([u8; 32]),
    Pair {
        left: Rc<dyn TreeNode>,
        right: Rc<dyn TreeNode>,
        root: [u8; 32],
    },
}

impl Node {
    #[must_use]
    pub fn leaf(bytes: [u8; 32]) -> Rc<dyn TreeNode> {
        Rc::new(Self::Leaf(bytes))
    }

    #[must_use]
    pub fn pair(left: Rc<dyn TreeNode>, right: Rc<dyn TreeNode>) -> Rc<dyn TreeNode> {
        let root = pair_hash(&left.merkle_root(), &right.merkle_root());
        Rc::new(Self::Pair { left, right, root })
    }
}

impl TreeNode for Node {
    fn merkle_root(&self) -> [u8; 32] {
        match self {
            Self::Leaf(b) => *b,
            Self::Pair { root, .. } => *root,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    fn get_left(&self) -> Result<Rc<dyn TreeNode>, MerkleError> {
        match self {
            Self::Leaf(_) => Err(MerkleError::DescendIntoLeaf(2)),
            Self::Pair { left, .. } => Ok(Rc::clone(left)),
        }
    }

    fn get_right(&self) -> Result<Rc<dyn TreeNode>, MerkleError> {
        match self {
            Self::Leaf(_) => Err(MerkleError::DescendIntoLeaf(3)),
            Self::Pair { right, .. } => Ok(Rc::clone(right)),
        }
    }

    fn leaf_bytes(&self) -> Option<[u8; 32]> {
        match self {
            Self::Leaf(b) => Some(*b),
            Self::Pair { .. } => None,
        }
    }
}

/// Rebuild the spine from `root` to `gindex`, replacing the subtree there
/// with `replacement` (a leaf for a scalar field, or a whole subtree for a
/// nested container/list) and recomputing every ancestor root on the way
/// back up. Used by typed setters (`Step::with_ptr`, ...) to produce the
/// post-state tree without mutating the pre-state tree (spec.md §9's
/// persistent-node note).
///
/// # Errors
/// Propagates [`MerkleError::DescendIntoLeaf`] if the path runs into a leaf
/// above `gindex`.
pub fn rebind(
    root: &Rc<dyn TreeNode>,
    gindex: u64,
    replacement: Rc<dyn TreeNode>,
) -> Result<Rc<dyn TreeNode>, MerkleError> {
    if gindex == 1 {
        return Ok(replacement);
    }
    let depth = crate::gindex::depth_of(gindex);

    // Walk root -> gindex top-down, recording the sibling at each level so
    // the spine can be rebuilt bottom-up without re-navigating.
    let mut siblings: Vec<(bool, Rc<dyn TreeNode>)> = Vec::with_capacity(depth as usize);
    let mut node = Rc::clone(root);
    for level in (0..depth).rev() {
        let go_right = (gindex >> level) & 1 == 1;
        if go_right {
            siblings.push((true, node.get_left()?));
            node = node.get_right()?;
        } else {
            siblings.push((false, node.get_right()?));
            node = node.get_left()?;
        }
    }

    let mut current = replacement;
    for (went_right, sibling) in siblings.into_iter().rev() {
        current = if went_right {
            Node::pair(sibling, current)
        } else {
            Node::pair(current, sibling)
        };
    }
    Ok(current)
}

/// Convenience wrapper for the common case of replacing a single 32-byte
/// leaf (a scalar field) rather than an arbitrary subtree.
///
/// # Errors
/// See [`rebind`].
pub fn rebind_leaf(
    root: &Rc<dyn TreeNode>,
    gindex: u64,
    new_leaf: [u8; 32],
) -> Result<Rc<dyn TreeNode>, MerkleError> {
    rebind(root, gindex, Node::leaf(new_leaf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_root_matches_hash_of_children() {
        let l = Node::leaf([1u8; 32]);
        let r = Node::leaf([2u8; 32]);
        let p = Node::pair(Rc::clone(&l), Rc::clone(&r));
        assert_eq!(p.merkle_root(), pair_hash(&[1u8; 32], &[2u8; 32]));
    }

    #[test]
    fn leaf_has_no_children() {
        let l = Node::leaf([0u8; 32]);
        assert!(l.is_leaf());
        assert!(l.get_left().is_err());
        assert!(l.get_right().is_err());
    }

    #[test]
    fn rebind_changes_only_the_targeted_leaf() {
        let a = Node::leaf([1u8; 32]);
        let b = Node::leaf([2u8; 32]);
        let root = Node::pair(a, b);
        let new_root = rebind_leaf(&root, 2, [9u8; 32]).unwrap();
        assert_eq!(new_root.get_left().unwrap().merkle_root(), [9u8; 32]);
        assert_eq!(new_root.get_right().unwrap().merkle_root(), [2u8; 32]);
        // the old root is untouched
        assert_eq!(root.get_left().unwrap().merkle_root(), [1u8; 32]);
    }
}
