//! The single-step transition function (spec.md §4.D) and the transaction
//! entry point (`parse_tx`, §6) that builds the initial `Step`.

use crate::error::ParseTxError;
use crate::limits::{GAS_FREE_STIPEND, L1_CALLDATA_TO_L2_GAS_MULTIPLIER, MAX_CELL_COUNT, MAX_PAYLOAD_BYTES, MAX_STACK_DEPTH};
use crate::types::{Address, ByteList, Contract, ExitCode, OpCode, Step};
use obf_merkle::MerkleError;

/// Run one opcode of `pre`, returning the resulting `Step`.
///
/// Pure and deterministic: reads only `pre`. Mirrors spec.md §4.D exactly,
/// including the three ordered preconditions, skip-mode bracket matching via
/// `indent`, and the 8-opcode execute-mode table.
///
/// # Errors
/// Propagates [`MerkleError`] if `pre`'s backing is a partial tree missing
/// the nodes this step needs to read.
pub fn next_step(pre: &Step) -> Result<Step, MerkleError> {
    let contract = pre.contract()?;
    let code = contract.code()?;
    let op_count = code.op_count()?;
    let pc = pre.pc()?;

    if u64::from(pc) >= op_count {
        return Ok(pre.with_result_code(ExitCode::Ok as u8));
    }
    if pre.gas()? == 0 {
        return Ok(pre.with_result_code(ExitCode::OutOfGas as u8));
    }

    let post = pre.with_gas(pre.gas()? - 1);
    let op = code.get_op(pc)?;
    let indent = pre.indent()?;

    if indent > 0 {
        return Ok(match op {
            OpCode::JumpCond => {
                let new_indent = indent + 1;
                if new_indent as usize > MAX_STACK_DEPTH {
                    post.with_result_code(ExitCode::StackOverflow as u8)
                } else {
                    post.with_indent(new_indent).with_pc(pc + 1)
                }
            }
            OpCode::JumpBack => post.with_indent(indent - 1).with_pc(pc + 1),
            _ => post.with_pc(pc + 1),
        });
    }

    execute(pre, &post, &contract, op, pc)
}

fn execute(
    pre: &Step,
    post: &Step,
    contract: &Contract,
    op: OpCode,
    pc: u32,
) -> Result<Step, MerkleError> {
    let ptr = contract.ptr()?;
    Ok(match op {
        OpCode::MoveRight => {
            if ptr as usize == MAX_CELL_COUNT - 1 {
                return Ok(post.with_result_code(ExitCode::PtrTooHigh as u8));
            }
            let cells = contract.cells()?;
            let len = cells.len()?;
            let cells = if (ptr as usize) + 1 >= len {
                cells.with_byte(len, 0)?
            } else {
                cells
            };
            post.with_contract(contract.with_cells(cells)?.with_ptr(ptr + 1)?)
                .with_pc(pc + 1)
        }
        OpCode::MoveLeft => {
            if ptr == 0 {
                return Ok(post.with_result_code(ExitCode::NegativePtr as u8));
            }
            post.with_contract(contract.with_ptr(ptr - 1)?).with_pc(pc + 1)
        }
        OpCode::IncrCell => {
            let cells = contract.cells()?;
            let cur = cells.get(ptr as usize)?;
            let cells = cells.with_byte(ptr as usize, cur.wrapping_add(1))?;
            post.with_contract(contract.with_cells(cells)?).with_pc(pc + 1)
        }
        OpCode::DecrCell => {
            let cells = contract.cells()?;
            let cur = cells.get(ptr as usize)?;
            let cells = cells.with_byte(ptr as usize, cur.wrapping_sub(1))?;
            post.with_contract(contract.with_cells(cells)?).with_pc(pc + 1)
        }
        OpCode::GetCell => {
            let v = contract.cells()?.get(ptr as usize)?;
            if v == 0 || v == 1 {
                post.with_result_code(v)
            } else {
                post.with_pc(pc + 1)
            }
        }
        OpCode::PutCell => {
            let input_read = pre.input_read()?;
            let input_data = pre.input_data()?;
            let byte = if (input_read as usize) < input_data.len()? {
                input_data.get(input_read as usize)?
            } else {
                0
            };
            let cells = contract.cells()?.with_byte(ptr as usize, byte)?;
            post.with_contract(contract.with_cells(cells)?)
                .with_input_read(input_read + 1)
                .with_pc(pc + 1)
        }
        OpCode::JumpCond => {
            let v = contract.cells()?.get(ptr as usize)?;
            if v == 0 {
                post.with_indent(1).with_pc(pc + 1)
            } else {
                let stack = pre.stack()?;
                if stack.len()? >= MAX_STACK_DEPTH {
                    return Ok(post.with_result_code(ExitCode::StackOverflow as u8));
                }
                post.with_stack(stack.push(pc)?).with_pc(pc + 1)
            }
        }
        OpCode::JumpBack => {
            let stack = pre.stack()?;
            if stack.len()? == 0 {
                return Ok(post.with_result_code(ExitCode::StackUnderflow as u8));
            }
            let back_pc = stack.top()?;
            post.with_stack(stack.pop()?).with_pc(back_pc)
        }
    })
}

/// Build the initial `Step` for a contract call (spec.md §6): the gas budget
/// is `1000 + 128 · len(payload)`, and `input_data` is `payload` prepended
/// with the 20-byte sender.
///
/// # Errors
/// Returns [`ParseTxError::PayloadTooLarge`] if the sender-prefixed payload
/// exceeds `MAX_PAYLOAD_BYTES`.
pub fn parse_tx(sender: Address, contract: &Contract, payload: &[u8]) -> Result<Step, ParseTxError> {
    let mut data = Vec::with_capacity(20 + payload.len());
    data.extend_from_slice(&sender.0);
    data.extend_from_slice(payload);
    if data.len() > MAX_PAYLOAD_BYTES {
        return Err(ParseTxError::PayloadTooLarge(data.len()));
    }
    let gas = GAS_FREE_STIPEND + L1_CALLDATA_TO_L2_GAS_MULTIPLIER * payload.len() as u64;
    let input_data = ByteList::from_bytes(&data, MAX_PAYLOAD_BYTES);
    Ok(Step::new(gas, contract, &input_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Code;

    fn contract_with(code: &str, cells: &[u8], ptr: u32) -> Contract {
        let code = Code::from_pretty_str(code).unwrap();
        let cells = ByteList::from_bytes(cells, MAX_CELL_COUNT);
        Contract::new(&code, &cells, ptr)
    }

    fn addr(first_byte: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = first_byte;
        Address(bytes)
    }

    #[test]
    fn empty_code_terminates_ok_on_the_first_step() {
        let contract = contract_with("", &[], 0);
        let step = parse_tx(addr(0), &contract, &[]).unwrap();
        assert_eq!(step.gas().unwrap(), GAS_FREE_STIPEND);
        let post = next_step(&step).unwrap();
        assert_eq!(post.result_code().unwrap(), ExitCode::Ok as u8);
        assert_eq!(post.gas().unwrap(), GAS_FREE_STIPEND);
    }

    #[test]
    fn incr_then_natural_end() {
        let contract = contract_with("+", &[0], 0);
        let step = parse_tx(addr(0), &contract, &[]).unwrap();
        let step1 = next_step(&step).unwrap();
        assert_eq!(step1.contract().unwrap().cells().unwrap().get(0).unwrap(), 1);
        assert!(!step1.is_terminal().unwrap());
        let step2 = next_step(&step1).unwrap();
        assert_eq!(step2.result_code().unwrap(), ExitCode::Ok as u8);
    }

    #[test]
    fn move_left_at_origin_is_negative_ptr() {
        let contract = contract_with("<", &[0], 0);
        let step = parse_tx(addr(0), &contract, &[]).unwrap();
        let post = next_step(&step).unwrap();
        assert_eq!(post.result_code().unwrap(), ExitCode::NegativePtr as u8);
    }

    #[test]
    fn read_input_then_output_it() {
        let contract = contract_with(",.", &[0], 0);
        let step = parse_tx(addr(0x01), &contract, &[0x07]).unwrap();
        let step1 = next_step(&step).unwrap();
        assert_eq!(step1.contract().unwrap().cells().unwrap().get(0).unwrap(), 1);
        let step2 = next_step(&step1).unwrap();
        // cell holds 1 -> revert sentinel per spec.md §4.D's terminal rule.
        assert_eq!(step2.result_code().unwrap(), 1);
    }

    #[test]
    fn zero_loop_skips_via_indent() {
        let contract = contract_with("[-]", &[0], 0);
        let step = parse_tx(addr(0), &contract, &[]).unwrap();
        // cells[0] == 0, so `[` enters skip mode.
        let step1 = next_step(&step).unwrap();
        assert_eq!(step1.indent().unwrap(), 1);
        assert_eq!(step1.pc().unwrap(), 1);
        // `-` is skipped without side effects.
        let step2 = next_step(&step1).unwrap();
        assert_eq!(step2.indent().unwrap(), 1);
        assert_eq!(step2.contract().unwrap().cells().unwrap().get(0).unwrap(), 0);
        // `]` closes skip mode.
        let step3 = next_step(&step2).unwrap();
        assert_eq!(step3.indent().unwrap(), 0);
        let step4 = next_step(&step3).unwrap();
        assert_eq!(step4.result_code().unwrap(), ExitCode::Ok as u8);
    }

    #[test]
    fn nonzero_loop_decrements_to_zero() {
        let contract = contract_with("[-]", &[3], 0);
        let mut step = parse_tx(addr(0), &contract, &[]).unwrap();
        for _ in 0..20 {
            if step.is_terminal().unwrap() {
                break;
            }
            step = next_step(&step).unwrap();
        }
        assert_eq!(step.result_code().unwrap(), ExitCode::Ok as u8);
        assert_eq!(step.contract().unwrap().cells().unwrap().get(0).unwrap(), 0);
    }

    #[test]
    fn gas_boundary() {
        let contract = contract_with("+", &[0], 0);
        let step = Step::new(1, &contract, &ByteList::from_bytes(&[], MAX_PAYLOAD_BYTES));
        let post = next_step(&step).unwrap();
        assert!(!post.is_terminal().unwrap());
        let step = Step::new(0, &contract, &ByteList::from_bytes(&[], MAX_PAYLOAD_BYTES));
        let post = next_step(&step).unwrap();
        assert_eq!(post.result_code().unwrap(), ExitCode::OutOfGas as u8);
    }

    #[test]
    fn payload_too_large_is_rejected() {
        let contract = contract_with("", &[], 0);
        let huge = vec![0u8; MAX_PAYLOAD_BYTES];
        assert!(matches!(
            parse_tx(addr(0), &contract, &huge),
            Err(ParseTxError::PayloadTooLarge(_))
        ));
    }
}
