//! CLI commands module.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use voc_core::Transaction;

mod asm;
mod txid;
mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a transaction against a state snapshot
    Validate(validate::ValidateArgs),
    /// Print a transaction's id and the ids of its outputs
    Txid(txid::TxidArgs),
    /// Assemble a control program to hex
    Asm(asm::AsmArgs),
    /// Disassemble hex program bytes
    Disasm(asm::DisasmArgs),
}

pub fn run(cmd: Commands) -> Result<ExitCode> {
    match cmd {
        Commands::Validate(args) => validate::run(args),
        Commands::Txid(args) => txid::run(args).map(|_| ExitCode::SUCCESS),
        Commands::Asm(args) => asm::assemble(args).map(|_| ExitCode::SUCCESS),
        Commands::Disasm(args) => asm::disassemble(args).map(|_| ExitCode::SUCCESS),
    }
}

/// Decode hex text, ignoring surrounding whitespace and an optional `0x`.
fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(text).with_context(|| "Invalid hex")
}

/// Read the raw bytes of a hex-encoded transaction file.
fn read_tx_bytes(path: &Path) -> Result<Vec<u8>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transaction file: {:?}", path))?;
    decode_hex(&text).with_context(|| format!("Bad transaction hex in {:?}", path))
}

/// Read and decode a hex-encoded transaction from a file.
fn load_tx(path: &Path, max_size: u64) -> Result<Transaction> {
    let bytes = read_tx_bytes(path)?;
    Transaction::decode(&bytes, max_size)
        .with_context(|| format!("Failed to decode transaction from {:?}", path))
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))
}
