#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use obf_core::{
    hex_decode, hex_encode, Address, ByteList, Code, Contract, ContractSnapshot, ExitCode,
    FullProof, InitialState, ParseTxError, Step, StepWitness, MAX_CELL_COUNT,
};
use obf_prover::{prove, ProverConfig};
use obf_verifier::{slice_witness, verify_step, VerifyOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "obf-cli",
    about = "Optimistic-brainfuck fraud-proof engine CLI",
    long_about = "Drive the optimistic-brainfuck fraud-proof engine: scaffold world state, run a\ntransaction to completion, generate a full-trace proof, slice a per-step\nwitness out of it, and verify a disputed step.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Scaffold an initial-state file, optionally seeding one contract slot.
    InitState {
        /// Output path for the initial-state JSON.
        #[arg(long, default_value = "state.json")]
        out: PathBuf,

        /// Contract slot to seed (0..255).
        #[arg(long)]
        contract: Option<u8>,

        /// Program source as Brainfuck characters, e.g. `++[-]`.
        #[arg(long, default_value = "")]
        code: String,

        /// Initial cell tape, as `0x`-hex bytes.
        #[arg(long, default_value = "0x")]
        cells: String,

        /// Initial cell pointer.
        #[arg(long, default_value_t = 0)]
        ptr: u32,
    },

    /// Run one transaction to a terminal result against a world-state file.
    Transition {
        /// Input world-state JSON.
        #[arg(long)]
        state: PathBuf,

        /// L1 sender address, 20-byte `0x`-hex.
        #[arg(long)]
        sender: String,

        /// Contract slot to call (0..255).
        #[arg(long)]
        contract: u8,

        /// Transaction payload, `0x`-hex.
        #[arg(long, default_value = "0x")]
        tx: String,

        /// Output world-state JSON (only written if the call did not revert).
        #[arg(long)]
        out_state: PathBuf,
    },

    /// Generate a full-trace fraud proof for one transaction.
    Gen {
        /// Input world-state JSON.
        #[arg(long)]
        state: PathBuf,

        /// L1 sender address, 20-byte `0x`-hex.
        #[arg(long)]
        sender: String,

        /// Contract slot to call (0..255).
        #[arg(long)]
        contract: u8,

        /// Transaction payload, `0x`-hex.
        #[arg(long, default_value = "0x")]
        tx: String,

        /// Output path for the full-proof JSON.
        #[arg(long, default_value = "proof.json")]
        out: PathBuf,
    },

    /// Slice a single step's witness out of a full proof.
    StepWitness {
        /// Input full-proof JSON, produced by `gen`.
        #[arg(long)]
        proof: PathBuf,

        /// Step index to slice.
        #[arg(long)]
        step: u32,

        /// Output path for the per-step witness JSON.
        #[arg(long, default_value = "witness.json")]
        out: PathBuf,
    },

    /// Re-execute a step from its witness and compare against a claimed root.
    Verify {
        /// Input per-step witness JSON, produced by `step-witness`.
        #[arg(long)]
        witness: PathBuf,

        /// The disputed post-state root, 32-byte `0x`-hex.
        #[arg(long)]
        claimed_post_root: String,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::InitState {
            out,
            contract,
            code,
            cells,
            ptr,
        } => init_state(out, contract, &code, &cells, ptr),

        Cmd::Transition {
            state,
            sender,
            contract,
            tx,
            out_state,
        } => transition(state, &sender, contract, &tx, out_state),

        Cmd::Gen {
            state,
            sender,
            contract,
            tx,
            out,
        } => gen(state, &sender, contract, &tx, out),

        Cmd::StepWitness { proof, step, out } => step_witness(proof, step, out),

        Cmd::Verify {
            witness,
            claimed_post_root,
        } => verify(witness, &claimed_post_root),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn parse_hash32(s: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = hex_decode(s).map_err(|e| anyhow!("{what}: {e}"))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| anyhow!("{what} must be exactly 32 bytes"))
}

fn parse_address(s: &str) -> Result<Address> {
    let bytes = hex_decode(s).map_err(|e| anyhow!("sender: {e}"))?;
    Address::from_slice(&bytes).ok_or_else(|| anyhow!("sender must be exactly 20 bytes"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let text = serde_json::to_string_pretty(value).context("serializing JSON")?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Rebuild a [`Contract`] (tree view) from its flat JSON snapshot.
fn contract_from_snapshot(snapshot: &ContractSnapshot) -> Result<Contract> {
    let code = Code::from_pretty_str(&snapshot.code).context("decoding contract code")?;
    let cells = ByteList::from_bytes(&snapshot.cells, MAX_CELL_COUNT);
    Ok(Contract::new(&code, &cells, snapshot.ptr))
}

/// Flatten a [`Contract`] (tree view) back into its JSON snapshot.
fn snapshot_from_contract(contract: &Contract) -> Result<ContractSnapshot> {
    let code = contract.code()?.to_pretty_str()?;
    let ptr = contract.ptr()?;
    let cell_list = contract.cells()?;
    let len = cell_list.len()?;
    let mut cells = Vec::with_capacity(len);
    for i in 0..len {
        cells.push(cell_list.get(i)?);
    }
    Ok(ContractSnapshot { code, ptr, cells })
}

fn load_contract(state: &InitialState, slot: u8) -> Result<Contract> {
    let snapshot = state
        .contracts
        .get(&slot.to_string())
        .ok_or(ParseTxError::UnknownContract(slot))?;
    contract_from_snapshot(snapshot)
}

fn init_state(out: PathBuf, contract: Option<u8>, code: &str, cells: &str, ptr: u32) -> Result<()> {
    let mut state = InitialState::default();
    if let Some(slot) = contract {
        let cells_bytes = hex_decode(cells).map_err(|e| anyhow!("cells: {e}"))?;
        Code::from_pretty_str(code).context("validating --code")?;
        state.contracts.insert(
            slot.to_string(),
            ContractSnapshot {
                code: code.to_string(),
                ptr,
                cells: cells_bytes,
            },
        );
    }
    write_json(&out, &state)?;
    println!(
        "Wrote initial state ({} contract(s)) -> {}",
        state.contracts.len(),
        out.display()
    );
    Ok(())
}

/// Run `initial` to a terminal `Step`, bailing if it outruns the sanity limit
/// (spec.md §4.F — the same ceiling the generator enforces).
fn run_to_terminal(initial: &Step) -> Result<Step> {
    let mut current = initial.clone();
    let mut steps_run = 0u32;
    loop {
        if steps_run >= obf_core::SANITY_LIMIT {
            bail!(
                "transaction did not terminate within the sanity limit of {} steps",
                obf_core::SANITY_LIMIT
            );
        }
        if current.is_terminal()? {
            return Ok(current);
        }
        current = obf_core::next_step(&current)?;
        steps_run += 1;
    }
}

fn transition(
    state_path: PathBuf,
    sender: &str,
    contract_slot: u8,
    tx: &str,
    out_state: PathBuf,
) -> Result<()> {
    let state: InitialState = read_json(&state_path)?;
    let sender = parse_address(sender)?;
    let payload = hex_decode(tx).map_err(|e| anyhow!("tx: {e}"))?;
    let contract = load_contract(&state, contract_slot)?;

    info!(contract = contract_slot, payload_len = payload.len(), "running transaction");
    let initial = obf_core::parse_tx(sender, &contract, &payload)?;
    let terminal = run_to_terminal(&initial)?;
    let result_code = terminal.result_code()?;

    if result_code == ExitCode::Ok as u8 {
        let mut state = state;
        let updated = snapshot_from_contract(&terminal.contract()?)?;
        state.contracts.insert(contract_slot.to_string(), updated);
        write_json(&out_state, &state)?;
        println!(
            "OK: contract {} committed, gas remaining {} -> {}",
            contract_slot,
            terminal.gas()?,
            out_state.display()
        );
    } else {
        println!(
            "REVERT: contract {} call failed with result_code {} (state discarded)",
            contract_slot, result_code
        );
    }
    Ok(())
}

fn gen(state_path: PathBuf, sender: &str, contract_slot: u8, tx: &str, out: PathBuf) -> Result<()> {
    let state: InitialState = read_json(&state_path)?;
    let sender = parse_address(sender)?;
    let payload = hex_decode(tx).map_err(|e| anyhow!("tx: {e}"))?;
    let contract = load_contract(&state, contract_slot)?;

    let initial = obf_core::parse_tx(sender, &contract, &payload)?;
    info!(contract = contract_slot, "generating full-trace proof");
    let proof = prove(&initial, &ProverConfig::default()).context("generating proof")?;

    let step_count = proof.access.len();
    write_json(&out, &proof)?;
    println!("Generated proof: {step_count} step(s) -> {}", out.display());
    Ok(())
}

fn step_witness(proof_path: PathBuf, step: u32, out: PathBuf) -> Result<()> {
    let proof: FullProof = read_json(&proof_path)?;
    let witness = slice_witness(&proof, step).context("slicing step witness")?;
    write_json(&out, &witness)?;
    println!("Sliced witness for step {step} -> {}", out.display());
    Ok(())
}

fn verify(witness_path: PathBuf, claimed_post_root: &str) -> Result<()> {
    let witness: StepWitness = read_json(&witness_path)?;
    let claimed = parse_hash32(claimed_post_root, "claimed-post-root")?;

    let outcome = verify_step(&witness, claimed).context("verifying step")?;
    match outcome {
        VerifyOutcome::Honest => {
            println!("OK: step {} verifies against the claimed root", witness.step);
            Ok(())
        }
        VerifyOutcome::Fraud {
            expected,
            recomputed,
        } => {
            println!(
                "FRAUD: step {} recomputed root {} does not match claimed root {}",
                witness.step,
                hex_encode(&recomputed),
                hex_encode(&expected)
            );
            Err(anyhow!("fraud detected at step {}", witness.step))
        }
    }
}
