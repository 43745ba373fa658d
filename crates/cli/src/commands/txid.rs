//! Transaction id command.

use super::{load_json, load_tx};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use voc_core::ProtocolParams;

#[derive(Args)]
pub struct TxidArgs {
    /// File holding the hex-encoded transaction
    #[arg(long)]
    tx: PathBuf,

    /// Protocol parameters (JSON), for the size limit
    #[arg(long)]
    params: Option<PathBuf>,
}

pub fn run(args: TxidArgs) -> Result<()> {
    let params: ProtocolParams = match &args.params {
        Some(path) => load_json(path)?,
        None => ProtocolParams::default(),
    };
    let tx = load_tx(&args.tx, params.max_tx_size)?;

    println!("{}", tx.id().to_hex().bright_yellow());
    for (j, out) in tx.data().outputs.iter().enumerate() {
        if let Some(id) = tx.output_id(j) {
            println!(
                "  output {}: {} ({} of {})",
                j,
                id.to_hex(),
                out.value.amount.to_string().bright_cyan(),
                out.value.asset_id
            );
        }
    }
    Ok(())
}
