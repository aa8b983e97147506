//! The Merkleized state schema: `Code`, `Cells`, `PayloadData`, `Contract`,
//! `Step` (spec.md §3, §4.C). Each wraps a tree-view root and exposes typed
//! accessors that navigate it — the "structural view reads through the tree
//! view" split called for in spec.md §9, generalized over any `TreeNode`
//! (materialized, shimmed, or reconstructed from a witness).

use crate::error::ParseCodeError;
use crate::layout::contract as contract_layout;
use crate::layout::step as step_layout;
use crate::limits::{
    BRAINFUCK_CHARS, MAX_CELL_COUNT, MAX_CODE_BITS, MAX_PAYLOAD_BYTES, MAX_STACK_DEPTH,
};
use crate::scalar::{decode_u32, decode_u64, decode_u8, encode_u32, encode_u64, encode_u8};
use obf_merkle::{
    bit_chunk_gindex, build_container, byte_chunk_gindex, container_depth, int_chunk_gindex,
    merkleize_bitlist, merkleize_bytelist, merkleize_u32_list, navigate, rebind, rebind_leaf,
    MerkleError, TreeNode as _, DATA_ROOT_GINDEX, LENGTH_GINDEX,
};
use std::rc::Rc;

pub type TreeNode = dyn obf_merkle::TreeNode;

/// A 20-byte L1 sender address. Plain data — not part of the Merkleized
/// schema, only used transiently while building `input_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(pub [u8; 20]);

impl Address {
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }
}

/// One of the 8 three-bit Brainfuck opcodes (spec.md §4.D's table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    MoveRight = 0b000,
    MoveLeft = 0b001,
    IncrCell = 0b010,
    DecrCell = 0b011,
    GetCell = 0b100,
    PutCell = 0b101,
    JumpCond = 0b110,
    JumpBack = 0b111,
}

impl OpCode {
    #[must_use]
    pub fn character(self) -> char {
        BRAINFUCK_CHARS[self as usize]
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0b000 => Ok(Self::MoveRight),
            0b001 => Ok(Self::MoveLeft),
            0b010 => Ok(Self::IncrCell),
            0b011 => Ok(Self::DecrCell),
            0b100 => Ok(Self::GetCell),
            0b101 => Ok(Self::PutCell),
            0b110 => Ok(Self::JumpCond),
            0b111 => Ok(Self::JumpBack),
            other => Err(other),
        }
    }
}

/// Transaction-level outcome (spec.md §7). `0xff` ("still running") is kept
/// as the raw `result_code` sentinel rather than a variant here, since it is
/// never a terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    StackOverflow = 1,
    StackUnderflow = 2,
    NegativePtr = 3,
    PtrTooHigh = 4,
    OutOfGas = 5,
}

/// Raw `result_code` value meaning "not yet terminal".
pub const RUNNING: u8 = 0xff;

impl TryFrom<u8> for ExitCode {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::Ok),
            1 => Ok(Self::StackOverflow),
            2 => Ok(Self::StackUnderflow),
            3 => Ok(Self::NegativePtr),
            4 => Ok(Self::PtrTooHigh),
            5 => Ok(Self::OutOfGas),
            other => Err(other),
        }
    }
}

/// `Code`: a bitlist of 3-bit-packed opcodes (spec.md §3).
#[derive(Clone)]
pub struct Code {
    backing: Rc<TreeNode>,
}

impl Code {
    #[must_use]
    pub fn from_backing(backing: Rc<TreeNode>) -> Self {
        Self { backing }
    }

    #[must_use]
    pub fn backing(&self) -> Rc<TreeNode> {
        Rc::clone(&self.backing)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_backing(merkleize_bitlist(&[], MAX_CODE_BITS))
    }

    /// # Errors
    /// Returns [`ParseCodeError`] for an unrecognized character or a
    /// program exceeding `MAX_CODE_BITS`.
    pub fn from_pretty_str(s: &str) -> Result<Self, ParseCodeError> {
        let mut bits = Vec::with_capacity(s.chars().count() * 3);
        for c in s.chars() {
            let idx = BRAINFUCK_CHARS
                .iter()
                .position(|&ch| ch == c)
                .ok_or(ParseCodeError::UnknownChar(c))?;
            for shift in (0..3).rev() {
                bits.push((idx >> shift) & 1 == 1);
            }
        }
        if bits.len() > MAX_CODE_BITS {
            return Err(ParseCodeError::TooLarge(MAX_CODE_BITS));
        }
        Ok(Self::from_backing(merkleize_bitlist(&bits, MAX_CODE_BITS)))
    }

    /// # Errors
    /// Propagates [`MerkleError`] if the backing is a partial tree missing
    /// the nodes needed to read every bit.
    pub fn to_pretty_str(&self) -> Result<String, MerkleError> {
        let bit_len = self.bit_len()?;
        let mut out = String::with_capacity(bit_len / 3);
        for op in 0..bit_len / 3 {
            out.push(self.get_op(op as u32)?.character());
        }
        Ok(out)
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn bit_len(&self) -> Result<usize, MerkleError> {
        let len_node = navigate(&self.backing, LENGTH_GINDEX)?;
        Ok(decode_u64(len_node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(LENGTH_GINDEX))?) as usize)
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn op_count(&self) -> Result<u64, MerkleError> {
        Ok((self.bit_len()? / 3) as u64)
    }

    fn bit_at(&self, i: usize) -> Result<bool, MerkleError> {
        let gindex = bit_chunk_gindex(MAX_CODE_BITS, i);
        let chunk_node = navigate(&self.backing, gindex)?;
        let chunk = chunk_node
            .leaf_bytes()
            .ok_or(MerkleError::DescendIntoLeaf(gindex))?;
        let bit_in_chunk = i % 256;
        let byte = chunk[bit_in_chunk / 8];
        Ok(byte & (0x80 >> (bit_in_chunk % 8)) != 0)
    }

    /// # Errors
    /// Propagates [`MerkleError`] if the witness is insufficient to read
    /// this opcode's 3 bits.
    pub fn get_op(&self, pc: u32) -> Result<OpCode, MerkleError> {
        let base = pc as usize * 3;
        let a = self.bit_at(base)?;
        let b = self.bit_at(base + 1)?;
        let c = self.bit_at(base + 2)?;
        let bits = ((a as u8) << 2) | ((b as u8) << 1) | (c as u8);
        Ok(OpCode::try_from(bits).expect("3-bit value always decodes"))
    }
}

/// `Cells` and `PayloadData` share the same shape: a capacity-bounded byte
/// list with a length mixin (spec.md §3).
#[derive(Clone)]
pub struct ByteList {
    backing: Rc<TreeNode>,
    capacity: usize,
}

impl ByteList {
    #[must_use]
    pub fn from_backing(backing: Rc<TreeNode>, capacity: usize) -> Self {
        Self { backing, capacity }
    }

    #[must_use]
    pub fn backing(&self) -> Rc<TreeNode> {
        Rc::clone(&self.backing)
    }

    #[must_use]
    pub fn from_bytes(data: &[u8], capacity: usize) -> Self {
        Self::from_backing(merkleize_bytelist(data, capacity), capacity)
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn len(&self) -> Result<usize, MerkleError> {
        let len_node = navigate(&self.backing, LENGTH_GINDEX)?;
        Ok(decode_u64(len_node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(LENGTH_GINDEX))?) as usize)
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn is_empty(&self) -> Result<bool, MerkleError> {
        Ok(self.len()? == 0)
    }

    /// # Errors
    /// Propagates [`MerkleError`] if `i` is out of the declared witness, or
    /// panics-in-spirit out of range callers should check against `len()`.
    pub fn get(&self, i: usize) -> Result<u8, MerkleError> {
        let gindex = byte_chunk_gindex(self.capacity, i);
        let chunk_node = navigate(&self.backing, gindex)?;
        let chunk = chunk_node
            .leaf_bytes()
            .ok_or(MerkleError::DescendIntoLeaf(gindex))?;
        Ok(chunk[i % 32])
    }

    /// Return a new `ByteList` with byte `i` set to `value`, growing the
    /// declared length to `i + 1` if needed (spec.md §3's "on the step that
    /// increments ptr past len(cells)-1, a zero cell is appended first").
    ///
    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn with_byte(&self, i: usize, value: u8) -> Result<Self, MerkleError> {
        let gindex = byte_chunk_gindex(self.capacity, i);
        let chunk_node = navigate(&self.backing, gindex)?;
        let mut chunk = chunk_node
            .leaf_bytes()
            .ok_or(MerkleError::DescendIntoLeaf(gindex))?;
        chunk[i % 32] = value;

        let local = local_gindex_within_data(gindex);
        let new_data_root = rebind_leaf(&self.backing.get_left()?, local, chunk)?;
        let mut backing = rebind(&self.backing, DATA_ROOT_GINDEX, new_data_root)?;

        let new_len = self.len()?.max(i + 1);
        if new_len != self.len()? {
            let mut len_bytes = [0u8; 32];
            len_bytes[24..].copy_from_slice(&(new_len as u64).to_be_bytes());
            backing = rebind_leaf(&backing, LENGTH_GINDEX, len_bytes)?;
        }
        Ok(Self::from_backing(backing, self.capacity))
    }
}

/// Convert a chunk gindex relative to a list's root (as returned by
/// `byte_chunk_gindex`/`int_chunk_gindex`, which embed the `DATA_ROOT_GINDEX`
/// prefix) into one relative to just the data subtree's own root, i.e. strip
/// the leading `10` bit pair.
fn local_gindex_within_data(full: u64) -> u64 {
    let data_root_depth = obf_merkle::depth_of(DATA_ROOT_GINDEX);
    let full_depth = obf_merkle::depth_of(full);
    let local_depth = full_depth - data_root_depth;
    let mask = (1u64 << local_depth) - 1;
    (1u64 << local_depth) | (full & mask)
}

/// `stack: List<uint32, MAX_STACK_DEPTH>`.
#[derive(Clone)]
pub struct Stack {
    backing: Rc<TreeNode>,
}

impl Stack {
    #[must_use]
    pub fn from_backing(backing: Rc<TreeNode>) -> Self {
        Self { backing }
    }

    #[must_use]
    pub fn backing(&self) -> Rc<TreeNode> {
        Rc::clone(&self.backing)
    }

    #[must_use]
    pub fn from_items(items: &[u32]) -> Self {
        Self::from_backing(merkleize_u32_list(items, MAX_STACK_DEPTH))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn len(&self) -> Result<usize, MerkleError> {
        let len_node = navigate(&self.backing, LENGTH_GINDEX)?;
        Ok(decode_u64(len_node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(LENGTH_GINDEX))?) as usize)
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn top(&self) -> Result<u32, MerkleError> {
        let len = self.len()?;
        self.get(len - 1)
    }

    fn get(&self, i: usize) -> Result<u32, MerkleError> {
        let gindex = int_chunk_gindex(MAX_STACK_DEPTH, i);
        let chunk_node = navigate(&self.backing, gindex)?;
        let chunk = chunk_node
            .leaf_bytes()
            .ok_or(MerkleError::DescendIntoLeaf(gindex))?;
        let slot = (i % 8) * 4;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&chunk[slot..slot + 4]);
        Ok(u32::from_be_bytes(buf))
    }

    /// # Errors
    /// Returns [`MerkleError`] (reused here as the overflow signal isn't a
    /// tree error; callers check `len()` against `MAX_STACK_DEPTH` before
    /// calling) or propagates a witness error.
    pub fn push(&self, value: u32) -> Result<Self, MerkleError> {
        let len = self.len()?;
        let gindex = int_chunk_gindex(MAX_STACK_DEPTH, len);
        let local = local_gindex_within_data(gindex);
        let mut chunk = navigate(&self.backing.get_left()?, local)
            .and_then(|n| n.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(local)))
            .unwrap_or([0u8; 32]);
        let slot = (len % 8) * 4;
        chunk[slot..slot + 4].copy_from_slice(&value.to_be_bytes());

        let new_data_root = rebind_leaf(&self.backing.get_left()?, local, chunk)?;
        let backing = rebind(&self.backing, DATA_ROOT_GINDEX, new_data_root)?;
        let mut len_bytes = [0u8; 32];
        len_bytes[24..].copy_from_slice(&((len + 1) as u64).to_be_bytes());
        let backing = rebind_leaf(&backing, LENGTH_GINDEX, len_bytes)?;
        Ok(Self::from_backing(backing))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn pop(&self) -> Result<Self, MerkleError> {
        let len = self.len()?;
        let mut len_bytes = [0u8; 32];
        len_bytes[24..].copy_from_slice(&((len - 1) as u64).to_be_bytes());
        let new_backing = rebind_leaf(&self.backing, LENGTH_GINDEX, len_bytes)?;
        Ok(Self::from_backing(new_backing))
    }
}

/// `Contract`: `{ code, cells, ptr }` (spec.md §3).
#[derive(Clone)]
pub struct Contract {
    backing: Rc<TreeNode>,
}

impl Contract {
    #[must_use]
    pub fn from_backing(backing: Rc<TreeNode>) -> Self {
        Self { backing }
    }

    #[must_use]
    pub fn backing(&self) -> Rc<TreeNode> {
        Rc::clone(&self.backing)
    }

    #[must_use]
    pub fn new(code: &Code, cells: &ByteList, ptr: u32) -> Self {
        let fields: Vec<Rc<TreeNode>> = vec![code.backing(), cells.backing(), obf_merkle::Node::leaf(encode_u32(ptr))];
        Self::from_backing(build_container(&fields))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn code(&self) -> Result<Code, MerkleError> {
        Ok(Code::from_backing(navigate(&self.backing, contract_layout::CODE)?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn cells(&self) -> Result<ByteList, MerkleError> {
        Ok(ByteList::from_backing(
            navigate(&self.backing, contract_layout::CELLS)?,
            MAX_CELL_COUNT,
        ))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn ptr(&self) -> Result<u32, MerkleError> {
        let node = navigate(&self.backing, contract_layout::PTR)?;
        Ok(decode_u32(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(contract_layout::PTR))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn with_cells(&self, cells: ByteList) -> Result<Self, MerkleError> {
        Ok(Self::from_backing(rebind(&self.backing, contract_layout::CELLS, cells.backing())?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn with_ptr(&self, ptr: u32) -> Result<Self, MerkleError> {
        Ok(Self::from_backing(rebind_leaf(&self.backing, contract_layout::PTR, encode_u32(ptr))?))
    }

    #[must_use]
    pub fn container_depth() -> u32 {
        container_depth(contract_layout::FIELD_COUNT)
    }
}

/// `Step`: one opcode's worth of execution state (spec.md §3).
#[derive(Clone)]
pub struct Step {
    backing: Rc<TreeNode>,
}

impl Step {
    #[must_use]
    pub fn from_backing(backing: Rc<TreeNode>) -> Self {
        Self { backing }
    }

    #[must_use]
    pub fn backing(&self) -> Rc<TreeNode> {
        Rc::clone(&self.backing)
    }

    /// Build the initial `Step` for a transaction (spec.md §3's lifecycle
    /// note, `parse_tx`'s construction).
    #[must_use]
    pub fn new(gas: u64, contract: &Contract, input_data: &ByteList) -> Self {
        let fields: Vec<Rc<TreeNode>> = vec![
            obf_merkle::Node::leaf(encode_u64(gas)),
            obf_merkle::Node::leaf(encode_u32(0)), // pc
            Stack::from_items(&[]).backing(),
            obf_merkle::Node::leaf(encode_u32(0)), // indent
            contract.backing(),
            obf_merkle::Node::leaf(encode_u32(0)), // input_read
            input_data.backing(),
            obf_merkle::Node::leaf(encode_u8(RUNNING)),
        ];
        Self::from_backing(build_container(&fields))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn gas(&self) -> Result<u64, MerkleError> {
        let node = navigate(&self.backing, step_layout::GAS)?;
        Ok(decode_u64(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(step_layout::GAS))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn pc(&self) -> Result<u32, MerkleError> {
        let node = navigate(&self.backing, step_layout::PC)?;
        Ok(decode_u32(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(step_layout::PC))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn indent(&self) -> Result<u32, MerkleError> {
        let node = navigate(&self.backing, step_layout::INDENT)?;
        Ok(decode_u32(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(step_layout::INDENT))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn stack(&self) -> Result<Stack, MerkleError> {
        Ok(Stack::from_backing(navigate(&self.backing, step_layout::STACK)?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn contract(&self) -> Result<Contract, MerkleError> {
        Ok(Contract::from_backing(navigate(&self.backing, step_layout::CONTRACT)?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn input_read(&self) -> Result<u32, MerkleError> {
        let node = navigate(&self.backing, step_layout::INPUT_READ)?;
        Ok(decode_u32(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(step_layout::INPUT_READ))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn input_data(&self) -> Result<ByteList, MerkleError> {
        Ok(ByteList::from_backing(
            navigate(&self.backing, step_layout::INPUT_DATA)?,
            MAX_PAYLOAD_BYTES,
        ))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn result_code(&self) -> Result<u8, MerkleError> {
        let node = navigate(&self.backing, step_layout::RESULT_CODE)?;
        Ok(decode_u8(node.leaf_bytes().ok_or(MerkleError::DescendIntoLeaf(step_layout::RESULT_CODE))?))
    }

    /// # Errors
    /// Propagates [`MerkleError`].
    pub fn is_terminal(&self) -> Result<bool, MerkleError> {
        Ok(self.result_code()? != RUNNING)
    }

    // -- Builders returning a fresh `Step` sharing structure with `self` --

    #[must_use]
    pub fn with_gas(&self, gas: u64) -> Self {
        Self::from_backing(rebind_leaf(&self.backing, step_layout::GAS, encode_u64(gas)).expect("scalar rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_pc(&self, pc: u32) -> Self {
        Self::from_backing(rebind_leaf(&self.backing, step_layout::PC, encode_u32(pc)).expect("scalar rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_indent(&self, indent: u32) -> Self {
        Self::from_backing(rebind_leaf(&self.backing, step_layout::INDENT, encode_u32(indent)).expect("scalar rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_stack(&self, stack: Stack) -> Self {
        Self::from_backing(rebind(&self.backing, step_layout::STACK, stack.backing()).expect("subtree rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_contract(&self, contract: Contract) -> Self {
        Self::from_backing(rebind(&self.backing, step_layout::CONTRACT, contract.backing()).expect("subtree rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_input_read(&self, input_read: u32) -> Self {
        Self::from_backing(rebind_leaf(&self.backing, step_layout::INPUT_READ, encode_u32(input_read)).expect("scalar rebind is infallible on a well-formed Step"))
    }

    #[must_use]
    pub fn with_result_code(&self, result_code: u8) -> Self {
        Self::from_backing(rebind_leaf(&self.backing, step_layout::RESULT_CODE, encode_u8(result_code)).expect("scalar rebind is infallible on a well-formed Step"))
    }
}
