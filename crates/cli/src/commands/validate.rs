//! Validate transaction command.

use super::{load_json, read_tx_bytes};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use voc_core::{ProtocolParams, Transaction};
use voc_validation::{validate_with_trace, MemoryState, Rejection, ValidationContext, Verdict};
use voc_vm::{NoopTrace, RecordingTrace, TraceSink};

#[derive(Args)]
pub struct ValidateArgs {
    /// File holding the hex-encoded transaction
    #[arg(long)]
    tx: PathBuf,

    /// State snapshot (JSON); empty if omitted
    #[arg(long)]
    state: Option<PathBuf>,

    /// Protocol parameters (JSON); mainnet defaults if omitted
    #[arg(long)]
    params: Option<PathBuf>,

    /// Block height to validate at
    #[arg(long, default_value = "0")]
    height: u64,

    /// Block time to validate at
    #[arg(long, default_value = "0")]
    time: u64,

    /// Position of the transaction in its block
    #[arg(long)]
    position: Option<u64>,

    /// Apply the standardness policy
    #[arg(long)]
    standard: bool,

    /// Print every executed VM step
    #[arg(long)]
    trace: bool,
}

pub fn run(args: ValidateArgs) -> Result<ExitCode> {
    let verdict = check(&args)?;
    Ok(if verdict.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check(args: &ValidateArgs) -> Result<Verdict> {
    let params: ProtocolParams = match &args.params {
        Some(path) => load_json(path)?,
        None => ProtocolParams::default(),
    };
    let state: MemoryState = match &args.state {
        Some(path) => load_json(path)?,
        None => MemoryState::new(),
    };
    let bytes = read_tx_bytes(&args.tx)?;
    let max_size = params.max_tx_size;

    let mut ctx = ValidationContext::new(params)
        .at_block(args.height, args.time)
        .standard(args.standard);
    if let Some(position) = args.position {
        ctx = ctx.with_position(position);
    }

    println!("{}", "Validating transaction...".bold().cyan());
    let verdict = match Transaction::decode(&bytes, max_size) {
        Ok(tx) => {
            println!("  Tx id:   {}", tx.id().to_hex().bright_yellow());
            println!("  Size:    {} bytes", tx.serialized_size().to_string().bright_black());
            println!("  Entries: {}", tx.graph().len().to_string().bright_black());
            println!();

            let mut recording = RecordingTrace::new();
            let mut noop = NoopTrace;
            let sink: &mut dyn TraceSink = if args.trace { &mut recording } else { &mut noop };
            let verdict = validate_with_trace(&tx, &state, &ctx, sink);

            if args.trace {
                println!("{}", "Trace:".bold());
                print!("{}", recording.render());
                println!();
            }
            verdict
        }
        Err(e) => {
            println!("  Size:    {} bytes", bytes.len().to_string().bright_black());
            println!();
            Verdict::Invalid(Rejection::new(e.into(), None))
        }
    };

    report(&verdict);
    Ok(verdict)
}

fn report(verdict: &Verdict) {
    match verdict {
        Verdict::Valid {
            gas_used,
            entries_visited,
        } => {
            println!("{}  Valid", "✓".green().bold());
            println!("    Gas used: {}", gas_used.to_string().bright_cyan());
            println!("    Entries:  {}", entries_visited.to_string().bright_black());
        }
        Verdict::Invalid(rejection) => {
            let kind = rejection.kind();
            println!("{}  Invalid", "✗".red().bold());
            println!("    Code:     {}", kind.code().to_string().bright_red());
            println!("    Category: {}", kind.category());
            println!("    Error:    {}", rejection.error);
            if let Some(entry) = rejection.entry {
                println!("    Entry:    {}", entry.to_string().bright_yellow());
            }
            if kind.is_temporary() {
                println!("    {}", "(temporary: may succeed later)".bright_black());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use voc_core::{AssetAmount, Program, SpendInput, TimeRange, Transaction, TxData, TxInput, TxOutput};
    use voc_validation::ErrorKind;

    const OP_TRUE: u8 = 0x51;

    /// Writes a one-input transaction and a state holding its input.
    fn fixture(dir: &TempDir, fund_state: bool) -> ValidateArgs {
        let spend = SpendInput {
            source_id: voc_core::hash(b"funding"),
            source_position: 0,
            value: AssetAmount::native(3_000_000),
            control_program: Program::v1(vec![OP_TRUE]),
            arguments: Vec::new(),
        };
        let mut state = MemoryState::new();
        if fund_state {
            state.insert_output(spend.spent_output_id(), spend.value);
        }
        let tx = Transaction::new(TxData {
            version: 1,
            time_range: TimeRange::default(),
            fee: 1_000_000,
            inputs: vec![TxInput::Spend(spend)],
            outputs: vec![TxOutput::new(
                AssetAmount::native(2_000_000),
                Program::v1(vec![OP_TRUE]),
            )],
        })
        .unwrap();

        let tx_path = dir.path().join("tx.hex");
        let state_path = dir.path().join("state.json");
        fs::write(&tx_path, hex::encode(tx.encode().unwrap())).unwrap();
        fs::write(&state_path, serde_json::to_string(&state).unwrap()).unwrap();

        ValidateArgs {
            tx: tx_path,
            state: Some(state_path),
            params: None,
            height: 1,
            time: 100,
            position: None,
            standard: false,
            trace: true,
        }
    }

    #[test]
    fn test_valid_from_files() {
        let dir = TempDir::new().unwrap();
        let verdict = check(&fixture(&dir, true)).unwrap();
        assert!(verdict.is_valid(), "{verdict}");
    }

    #[test]
    fn test_orphan_from_files() {
        let dir = TempDir::new().unwrap();
        let verdict = check(&fixture(&dir, false)).unwrap();
        assert_eq!(verdict.kind(), Some(ErrorKind::OrphanInput));
    }

    #[test]
    fn test_params_file_is_applied() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(&dir, true);
        let params_path = dir.path().join("params.json");
        fs::write(&params_path, r#"{"max_tx_version": 0}"#).unwrap();
        args.params = Some(params_path);
        let verdict = check(&args).unwrap();
        assert_eq!(verdict.kind(), Some(ErrorKind::TxVersion));
    }

    #[test]
    fn test_oversize_tx_is_a_verdict() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(&dir, true);
        let params_path = dir.path().join("params.json");
        fs::write(&params_path, r#"{"max_tx_size": 10}"#).unwrap();
        args.params = Some(params_path);
        let verdict = check(&args).unwrap();
        assert_eq!(verdict.kind(), Some(ErrorKind::WrongTransactionSize));
        assert_eq!(verdict.entry(), None);
        assert_eq!(run(args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn test_malformed_tx_is_a_verdict() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(&dir, true);
        fs::write(&args.tx, "ff".repeat(16)).unwrap();
        args.trace = false;
        let verdict = check(&args).unwrap();
        assert_eq!(verdict.kind(), Some(ErrorKind::MalformedEncoding));
    }

    #[test]
    fn test_missing_tx_file() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(&dir, true);
        args.tx = dir.path().join("nope.hex");
        assert!(check(&args).is_err());
    }
}
