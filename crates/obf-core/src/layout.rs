//! Fixed generalized-index layout for the `Step` and `Contract` containers
//! (spec.md §3's field lists, §4.C's "canonicalize the field order" note).
//!
//! Each constant is the field's local gindex within its own container root;
//! `obf_merkle::navigate` is called once per level of nesting, so a nested
//! field (e.g. `contract.ptr`) is reached by navigating to `CONTRACT` first
//! and then, within that subtree, to `PTR`.

/// `Step` has 8 fields: `ceil(log2(8)) = 3`, so field `i` sits at `8 + i`.
pub mod step {
    pub const GAS: u64 = 8;
    pub const PC: u64 = 9;
    pub const STACK: u64 = 10;
    pub const INDENT: u64 = 11;
    pub const CONTRACT: u64 = 12;
    pub const INPUT_READ: u64 = 13;
    pub const INPUT_DATA: u64 = 14;
    pub const RESULT_CODE: u64 = 15;
    pub const FIELD_COUNT: usize = 8;
}

/// `Contract` has 3 fields: `ceil(log2(3)) = 2`, so field `i` sits at `4 + i`.
pub mod contract {
    pub const CODE: u64 = 4;
    pub const CELLS: u64 = 5;
    pub const PTR: u64 = 6;
    pub const FIELD_COUNT: usize = 3;
}
