//! Decoding entry point and parallel batch validation.

use crate::context::ValidationContext;
use crate::error::{Result, ValidationError};
use crate::state::StateView;
use crate::validator::validate;
use crate::verdict::{Rejection, Verdict};
use rayon::prelude::*;
use tracing::{debug, info};
use voc_core::Transaction;

/// Decode wire bytes and validate the result. Undecodable input is an
/// invalid verdict, not an error.
pub fn validate_bytes<S: StateView + ?Sized>(
    bytes: &[u8],
    state: &S,
    ctx: &ValidationContext,
) -> Verdict {
    match Transaction::decode(bytes, ctx.params.max_tx_size) {
        Ok(tx) => validate(&tx, state, ctx),
        Err(e) => {
            debug!(len = bytes.len(), error = %e, "undecodable transaction");
            Verdict::Invalid(Rejection::new(e.into(), None))
        }
    }
}

/// Validate independent transactions on a dedicated pool of `threads` workers.
///
/// Verdicts come back in input order and are identical to what [`validate`]
/// returns for each transaction on its own.
pub fn validate_batch<S: StateView + ?Sized>(
    txs: &[Transaction],
    state: &S,
    ctx: &ValidationContext,
    threads: usize,
) -> Result<Vec<Verdict>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| ValidationError::Internal(format!("failed to start workers: {e}")))?;

    let verdicts: Vec<Verdict> =
        pool.install(|| txs.par_iter().map(|tx| validate(tx, state, ctx)).collect());

    let valid = verdicts.iter().filter(|v| v.is_valid()).count();
    info!(
        total = verdicts.len(),
        valid,
        invalid = verdicts.len() - valid,
        "batch validated"
    );
    Ok(verdicts)
}
