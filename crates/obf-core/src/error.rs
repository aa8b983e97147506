//! Errors raised while parsing or decoding VM state — distinct from both
//! `ExitCode` (a transaction outcome) and `obf_merkle::MerkleError` (a
//! malformed tree), per spec.md §7's two-domain split.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseTxError {
    #[error("contract slot {0} is not populated in world state")]
    UnknownContract(u8),
    #[error("input_data ({0} bytes, including the 20-byte sender prefix) exceeds the payload capacity")]
    PayloadTooLarge(usize),
}

#[derive(Debug, Error)]
pub enum ParseCodeError {
    #[error("unrecognized brainfuck character {0:?}")]
    UnknownChar(char),
    #[error("code exceeds the {0}-bit capacity")]
    TooLarge(usize),
}
