//! Assemble and disassemble commands.

use super::decode_hex;
use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AsmArgs {
    /// Assembly source file
    source: PathBuf,
}

#[derive(Args)]
pub struct DisasmArgs {
    /// Program bytes in hex
    code: String,
}

pub fn assemble(args: AsmArgs) -> Result<()> {
    println!("{}", assemble_file(&args.source)?);
    Ok(())
}

fn assemble_file(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file: {:?}", path))?;
    let code = voc_assembler::assemble(&source)
        .with_context(|| format!("Failed to assemble {:?}", path))?;
    Ok(hex::encode(code))
}

pub fn disassemble(args: DisasmArgs) -> Result<()> {
    let code = decode_hex(&args.code)?;
    let text = voc_assembler::disassemble(&code).with_context(|| "Failed to disassemble")?;
    println!("{}", text);
    Ok(())
}
