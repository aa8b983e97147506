//! Keccak-256 hashing and zero-hash padding.
//!
//! Grounded on `examples/original_source/obf/__init__.py`, which swaps the
//! SSZ-style hash function for Keccak-256 and the endianness for big-endian
//! so an EVM verifier can use native word order (spec.md §3, §4.A).

use std::sync::OnceLock;
use tiny_keccak::{Hasher, Keccak};

/// `keccak256(left || right)` over two 32-byte children (spec.md §4.A).
#[must_use]
pub fn pair_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut k = Keccak::v256();
    k.update(left);
    k.update(right);
    let mut out = [0u8; 32];
    k.finalize(&mut out);
    out
}

/// `keccak256(bytes)`, used for leaf chunk hashing of list/byte containers.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut k = Keccak::v256();
    k.update(bytes);
    let mut out = [0u8; 32];
    k.finalize(&mut out);
    out
}

/// Deepest zero-hash depth we ever need: `Cells` at 128 KiB / 32-byte chunks
/// is the deepest container in the schema (depth 12), so 64 gives ample
/// headroom without unbounded growth.
const MAX_ZERO_DEPTH: usize = 64;

static ZERO_HASHES: OnceLock<Vec<[u8; 32]>> = OnceLock::new();

fn zero_hashes() -> &'static [[u8; 32]] {
    ZERO_HASHES.get_or_init(|| {
        let mut z = Vec::with_capacity(MAX_ZERO_DEPTH);
        z.push([0u8; 32]);
        for d in 1..MAX_ZERO_DEPTH {
            let prev = z[d - 1];
            z.push(pair_hash(&prev, &prev));
        }
        z
    })
}

/// `Z[0] = 0x00..00`, `Z[d+1] = keccak(Z[d] || Z[d])`, materialized lazily
/// (spec.md §4.A). Used to pad short lists/bitlists to their full capacity
/// depth without materializing empty subtrees.
#[must_use]
pub fn zero_hash(depth: usize) -> [u8; 32] {
    let zh = zero_hashes();
    if depth < zh.len() {
        zh[depth]
    } else {
        // Extremely deep request; extend on the fly rather than panic.
        let mut cur = zh[zh.len() - 1];
        for _ in zh.len()..=depth {
            cur = pair_hash(&cur, &cur);
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_recurrence() {
        assert_eq!(zero_hash(0), [0u8; 32]);
        let z1 = zero_hash(1);
        assert_eq!(z1, pair_hash(&[0u8; 32], &[0u8; 32]));
        let z2 = zero_hash(2);
        assert_eq!(z2, pair_hash(&z1, &z1));
    }

    #[test]
    fn pair_hash_is_deterministic_and_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(pair_hash(&a, &b), pair_hash(&a, &b));
        assert_ne!(pair_hash(&a, &b), pair_hash(&b, &a));
    }
}
