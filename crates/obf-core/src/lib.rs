//! The Merkleized state schema and single-step transition function for the
//! optimistic-brainfuck fraud-proof engine (spec.md §3, §4.C, §4.D).

mod artifact;
mod error;
mod layout;
mod limits;
mod scalar;
mod step;
mod types;

pub use artifact::{
    hex_decode, hex_encode, ContractSnapshot, FullProof, HexGindex, HexHash, InitialState,
    NodeChildren, StepWitness, TransactionInput,
};
pub use error::{ParseCodeError, ParseTxError};
pub use limits::{
    BRAINFUCK_CHARS, GAS_FREE_STIPEND, L1_CALLDATA_TO_L2_GAS_MULTIPLIER, MAX_CELL_COUNT,
    MAX_CODE_BITS, MAX_CONTRACTS, MAX_PAYLOAD_BYTES, MAX_STACK_DEPTH, SANITY_LIMIT,
};
pub use step::{next_step, parse_tx};
pub use types::{Address, ByteList, Code, Contract, ExitCode, OpCode, Stack, Step, TreeNode, RUNNING};
