//! JSON wire formats shared by the prover, verifier, and CLI (spec.md §6).
//! These are plain DTOs — hex (de)serialization lives here so downstream
//! crates only ever see `[u8; N]`/`u64` values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `0x`-prefix, lowercase hex encoding (spec.md §6).
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// Decode a (possibly `0x`-prefixed) hex string into bytes.
///
/// # Errors
/// Returns a message if the string has odd length or a non-hex digit.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex string {s:?}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

/// A 32-byte hash, hex-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexHash(pub [u8; 32]);

impl Serialize for HexHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex_encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        let arr = <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| serde::de::Error::custom("expected a 32-byte hash"))?;
        Ok(Self(arr))
    }
}

/// A gindex, hex-encoded as a 32-byte big-endian integer on the wire (the
/// full proof's `access` arrays, spec.md §6: `"<gindex hex, 32 bytes>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexGindex(pub u64);

impl Serialize for HexGindex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 32];
        buf[24..].copy_from_slice(&self.0.to_be_bytes());
        serializer.serialize_str(&hex_encode(&buf))
    }
}

impl<'de> Deserialize<'de> for HexGindex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() > 32 {
            return Err(serde::de::Error::custom("gindex hex exceeds 32 bytes"));
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(&bytes);
        if padded[..24] != [0u8; 24] {
            return Err(serde::de::Error::custom("gindex value exceeds 64 bits"));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&padded[24..]);
        Ok(Self(u64::from_be_bytes(buf)))
    }
}

/// One non-leaf node's two children, keyed by the node's own hash in
/// [`FullProof::nodes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeChildren(pub HexHash, pub HexHash);

/// `{ nodes, step_roots, access }` — the whole-trace proof emitted by the
/// generator (spec.md §4.F, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullProof {
    pub nodes: BTreeMap<HexHash, NodeChildren>,
    pub step_roots: Vec<HexHash>,
    pub access: Vec<Vec<HexGindex>>,
}

/// `{ pre_root, post_root, step, node_by_gindex }` — a single step's sliced
/// witness (spec.md §4.G, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepWitness {
    pub pre_root: HexHash,
    pub post_root: HexHash,
    pub step: u32,
    pub node_by_gindex: BTreeMap<HexGindex, HexHash>,
}

/// One entry of the initial-state file's `contracts` map (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub code: String,
    pub ptr: u32,
    pub cells: Vec<u8>,
}

/// `{ "contracts": { "<id>": ContractSnapshot } }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InitialState {
    pub contracts: BTreeMap<String, ContractSnapshot>,
}

/// A transition's inputs (spec.md §6): `sender`, `contract` slot, and raw
/// `tx` payload, all as hex on the wire except the slot index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub sender: String,
    pub contract: u8,
    pub tx: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_hash_roundtrips() {
        let h = HexHash([0xab; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        let back: HexHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn hex_gindex_roundtrips() {
        let g = HexGindex(0x0102_0304_0506_0708);
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, format!("\"0x{}0102030405060708\"", "00".repeat(24)));
        let back: HexGindex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }
}
