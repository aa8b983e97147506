//! Keccak-256 generalized-index Merkle tree, typed containers, and the
//! access-tracking shim underpinning the fraud-proof engine's state model.

mod bitlist;
mod bytelist;
mod container;
mod error;
mod gindex;
mod hash;
mod intlist;
mod node;
mod partial;
mod shim;
mod tree;

pub use bitlist::{chunk_gindex as bit_chunk_gindex, merkleize_bitlist};
pub use bytelist::{chunk_gindex as byte_chunk_gindex, merkleize_bytelist, DATA_ROOT_GINDEX, LENGTH_GINDEX};
pub use container::{build_container, container_depth, field_gindex};
pub use error::MerkleError;
pub use gindex::{bit_length, depth_of, descend_step, navigate};
pub use hash::{hash_bytes, pair_hash, zero_hash};
pub use intlist::{chunk_gindex as int_chunk_gindex, merkleize_u32_list};
pub use node::{rebind, rebind_leaf, Node};
pub use partial::{reconstruct, PartialNode};
pub use shim::{ShimChild, ShimNode};
pub use tree::TreeNode;
