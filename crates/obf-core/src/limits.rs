//! Published constants (spec.md §6's Limits table).

/// `Code`'s bit capacity: 64 KiB of 3-bit opcodes, ~175k ops.
pub const MAX_CODE_BITS: usize = 64 * 1024 * 8;
/// `Cells`'s byte capacity.
pub const MAX_CELL_COUNT: usize = 128 * 1024;
/// `PayloadData`'s byte capacity (includes the 20-byte sender prefix).
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;
/// `stack`'s item capacity.
pub const MAX_STACK_DEPTH: usize = 1024;
/// Number of addressable contract slots in a `WorldState`.
pub const MAX_CONTRACTS: usize = 256;
/// Flat gas stipend granted to every transition, on top of the per-byte gas.
pub const GAS_FREE_STIPEND: u64 = 1000;
/// Gas charged per byte of L1 calldata.
pub const L1_CALLDATA_TO_L2_GAS_MULTIPLIER: u64 = 128;
/// Hard ceiling on steps the generator (or `transition`) will run before
/// treating the trace as a fatal internal error.
pub const SANITY_LIMIT: u32 = 10_000;

/// The 8-character Brainfuck alphabet, indexed by 3-bit opcode (spec.md §4.C).
pub const BRAINFUCK_CHARS: [char; 8] = ['>', '<', '+', '-', '.', ',', '[', ']'];
