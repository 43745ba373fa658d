//! Transaction validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. version
//! 2. encoded size
//! 3. time range against the block time
//! 4. coinbase placement, payload and asset
//! 5. at least one result
//! 6. a walk over every entry in arena order: references, per-asset
//!    balance, spent outputs and issued assets
//! 7. standardness, when the context asks for it
//! 8. every issuance, spend and mux program
//! 9. gas accounting
//!
//! One [`GasMeter`] is charged by the walk and by every program run.

use crate::context::ValidationContext;
use crate::error::{Result, ValidationError};
use crate::state::StateView;
use crate::verdict::{Rejection, Verdict};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};
use voc_core::{
    AssetAmount, AssetDefinition, AssetId, Entry, EntryGraph, EntryId, EntryIndex, Hash, Program,
    TimeRange, Transaction, ValueDestination, ValueSource, OP_FAIL_BYTE, VM_VERSION_1,
};
use voc_vm::{segwit, ExecContext, GasMeter, NoopTrace, OutputChecker, TraceSink, VmError};

/// Validate a transaction against a state snapshot.
pub fn validate<S: StateView + ?Sized>(
    tx: &Transaction,
    state: &S,
    ctx: &ValidationContext,
) -> Verdict {
    validate_graph(tx.graph(), state, ctx, &mut NoopTrace)
}

/// Like [`validate`], reporting every VM step to `trace`.
pub fn validate_with_trace<S: StateView + ?Sized>(
    tx: &Transaction,
    state: &S,
    ctx: &ValidationContext,
    trace: &mut dyn TraceSink,
) -> Verdict {
    validate_graph(tx.graph(), state, ctx, trace)
}

/// Validate an entry graph directly. Graphs built by hand with
/// [`voc_core::GraphBuilder`] go through exactly the same checks as decoded
/// transactions.
pub fn validate_graph<S: StateView + ?Sized>(
    graph: &EntryGraph,
    state: &S,
    ctx: &ValidationContext,
    trace: &mut dyn TraceSink,
) -> Verdict {
    let verdict = match Validator::new(graph, state, ctx).run(trace) {
        Ok((gas_used, entries_visited)) => Verdict::Valid {
            gas_used,
            entries_visited,
        },
        Err(rejection) => Verdict::Invalid(rejection),
    };
    match &verdict {
        Verdict::Valid { gas_used, .. } => {
            debug!(tx_id = %graph.tx_id(), gas_used, "transaction valid");
        }
        Verdict::Invalid(rejection) => {
            debug!(
                tx_id = %graph.tx_id(),
                code = rejection.kind().code(),
                error = %rejection,
                "transaction rejected"
            );
        }
    }
    verdict
}

type Checked<T> = std::result::Result<T, Rejection>;

/// Attach an entry to a failure.
fn at(entry: EntryId) -> impl Fn(ValidationError) -> Rejection {
    move |error| Rejection::new(error, Some(entry))
}

fn untagged(error: impl Into<ValidationError>) -> Rejection {
    Rejection::new(error.into(), None)
}

struct Validator<'a, S: ?Sized> {
    graph: &'a EntryGraph,
    state: &'a S,
    ctx: &'a ValidationContext,
    /// Native value left over by every mux, which must equal the fee.
    native_residual: i64,
    /// Last mux to feed the native residual; balance failures are charged to it.
    last_mux: Option<EntryId>,
    /// Outputs consumed so far by this transaction.
    spent: HashSet<Hash>,
    /// Definitions resolved for issuances, by arena index.
    definitions: BTreeMap<EntryIndex, AssetDefinition>,
}

impl<'a, S: StateView + ?Sized> Validator<'a, S> {
    fn new(graph: &'a EntryGraph, state: &'a S, ctx: &'a ValidationContext) -> Self {
        Self {
            graph,
            state,
            ctx,
            native_residual: 0,
            last_mux: None,
            spent: HashSet::new(),
            definitions: BTreeMap::new(),
        }
    }

    fn native(&self) -> AssetId {
        self.ctx.params.native_asset
    }

    fn run(mut self, trace: &mut dyn TraceSink) -> Checked<(u64, u64)> {
        let header = *self.graph.header();
        let params = &self.ctx.params;

        if header.version == 0 || header.version > params.max_tx_version {
            return Err(untagged(ValidationError::TxVersion {
                version: header.version,
                max: params.max_tx_version,
            }));
        }
        if header.serialized_size == 0 || header.serialized_size > params.max_tx_size {
            return Err(untagged(ValidationError::WrongTransactionSize {
                size: header.serialized_size,
                max: params.max_tx_size,
            }));
        }
        check_time_range(&header.time_range, self.ctx.block_time).map_err(untagged)?;

        let is_coinbase = self.graph.has_coinbase();
        if is_coinbase {
            self.check_coinbase()?;
        }
        if self.graph.results().is_empty() {
            return Err(untagged(ValidationError::EmptyResults));
        }

        let mut meter = GasMeter::for_fee(
            header.fee,
            header.serialized_size,
            params,
            self.ctx.deadline,
        )
        .map_err(untagged)?;

        let graph = self.graph;
        for (index, id, entry) in graph.entries() {
            trace!(entry = %id, kind = %entry.kind(), "checking entry");
            meter.visit_entry().map_err(|e| at(id)(e.into()))?;
            self.check_entry(index, entry).map_err(at(id))?;
            if matches!(entry, Entry::Mux(_)) {
                self.last_mux = Some(id);
            }
        }
        let mux = self.last_mux;
        let blame = |error| Rejection::new(error, mux);
        let fee = i64::try_from(header.fee).map_err(|_| blame(ValidationError::Overflow))?;
        if self.native_residual != fee {
            return Err(blame(ValidationError::Unbalanced {
                asset: self.native(),
                residual: self.native_residual - fee,
            }));
        }

        if self.ctx.require_standard {
            self.check_standard()?;
        }

        self.run_programs(&mut meter, trace)?;

        let gas_used = meter.finalize(is_coinbase).map_err(untagged)?;
        Ok((gas_used, meter.entries_visited()))
    }

    fn check_coinbase(&self) -> Checked<()> {
        let params = &self.ctx.params;
        let inputs = self
            .graph
            .entries()
            .filter(|(_, _, e)| matches!(e, Entry::Spend(_) | Entry::Issuance(_) | Entry::Coinbase(_)))
            .count();

        for (_, id, entry) in self.graph.entries() {
            let Entry::Coinbase(cb) = entry else {
                continue;
            };
            let fail = at(id);
            if inputs != 1 {
                return Err(fail(ValidationError::WrongCoinbaseTransaction(
                    "coinbase must be the only input",
                )));
            }
            if cb.ordinal != 0 {
                return Err(fail(ValidationError::WrongCoinbaseTransaction(
                    "coinbase must be the first input",
                )));
            }
            if self.ctx.tx_position.is_some_and(|p| p != 0) {
                return Err(fail(ValidationError::WrongCoinbaseTransaction(
                    "coinbase must be the first transaction of its block",
                )));
            }
            if cb.arbitrary.len() > params.coinbase_arbitrary_size_limit {
                return Err(fail(ValidationError::CoinbaseArbitraryOversize {
                    size: cb.arbitrary.len(),
                    limit: params.coinbase_arbitrary_size_limit,
                }));
            }
            let dest = cb
                .destination
                .as_ref()
                .ok_or(ValidationError::MissingField("destination"))
                .map_err(&fail)?;
            if dest.value.asset_id != params.native_asset {
                return Err(fail(ValidationError::WrongCoinbaseAsset(dest.value.asset_id)));
            }
        }
        Ok(())
    }

    fn check_entry(&mut self, index: EntryIndex, entry: &Entry) -> Result<()> {
        match entry {
            Entry::Output(out) => self.check_source(index, 0, &out.source),
            Entry::Retirement(ret) => self.check_source(index, 0, &ret.source),
            Entry::Mux(mux) => {
                let mut parity: BTreeMap<AssetId, i64> = BTreeMap::new();
                for (slot, src) in mux.sources.iter().enumerate() {
                    self.check_source(index, slot as u64, src)?;
                    let amount = signed(src.value.amount)?;
                    let sum = parity.entry(src.value.asset_id).or_insert(0);
                    *sum = sum.checked_add(amount).ok_or(ValidationError::Overflow)?;
                }
                for (slot, dest) in mux.destinations.iter().enumerate() {
                    self.check_destination(index, slot as u64, dest)?;
                    let amount = signed(dest.value.amount)?;
                    let sum = parity
                        .get_mut(&dest.value.asset_id)
                        .ok_or(ValidationError::NoSource(dest.value.asset_id))?;
                    *sum = sum.checked_sub(amount).ok_or(ValidationError::Overflow)?;
                }
                for (asset, residual) in parity {
                    if asset == self.native() {
                        self.native_residual = self
                            .native_residual
                            .checked_add(residual)
                            .ok_or(ValidationError::Overflow)?;
                    } else if residual != 0 {
                        return Err(ValidationError::Unbalanced { asset, residual });
                    }
                }
                Ok(())
            }
            Entry::Spend(spend) => {
                let dest = required(&spend.destination)?;
                if !self.spent.insert(spend.spent_output_id) {
                    return Err(ValidationError::MismatchedReference);
                }
                let prior = self
                    .state
                    .lookup(&spend.spent_output_id)
                    .ok_or(ValidationError::OrphanInput(spend.spent_output_id))?;
                check_value(&prior, &dest.value)?;
                self.check_destination(index, 0, dest)
            }
            Entry::Issuance(iss) => {
                let dest = required(&iss.destination)?;
                let definition = iss
                    .asset_definition
                    .clone()
                    .or_else(|| self.state.asset_definition(&iss.value.asset_id))
                    .ok_or(ValidationError::MissingField("asset definition"))?;
                let computed = definition.compute_asset_id();
                if computed != iss.value.asset_id {
                    return Err(ValidationError::MismatchedAssetId {
                        expected: iss.value.asset_id,
                        found: computed,
                    });
                }
                check_value(&iss.value, &dest.value)?;
                self.check_destination(index, 0, dest)?;
                self.definitions.insert(index, definition);
                Ok(())
            }
            Entry::Coinbase(cb) => {
                let dest = required(&cb.destination)?;
                self.check_destination(index, 0, dest)
            }
        }
    }

    /// `src` is source `slot` of `owner`. The upstream destination it reads
    /// from must point back at the same slot with the same value.
    fn check_source(&self, owner: EntryIndex, slot: u64, src: &ValueSource) -> Result<()> {
        let upstream = self.resolve(src.entry)?;
        let dest = nth(upstream.destinations(), src.position)?;
        if dest.entry != owner {
            return Err(ValidationError::MismatchedReference);
        }
        if dest.position != slot {
            return Err(ValidationError::MismatchedPosition {
                expected: slot,
                found: dest.position,
            });
        }
        check_value(&src.value, &dest.value)
    }

    /// The mirror image of [`check_source`](Self::check_source).
    fn check_destination(&self, owner: EntryIndex, slot: u64, dest: &ValueDestination) -> Result<()> {
        let downstream = self.resolve(dest.entry)?;
        let src = nth(downstream.sources(), dest.position)?;
        if src.entry != owner {
            return Err(ValidationError::MismatchedReference);
        }
        if src.position != slot {
            return Err(ValidationError::MismatchedPosition {
                expected: slot,
                found: src.position,
            });
        }
        check_value(&dest.value, &src.value)
    }

    fn resolve(&self, index: EntryIndex) -> Result<&'a Entry> {
        self.graph
            .entry(index)
            .ok_or_else(|| ValidationError::Internal(format!("dangling reference to {index}")))
    }

    fn check_standard(&self) -> Checked<()> {
        let native = self.native();
        for (_, id, entry) in self.graph.entries() {
            let (value, program) = match entry {
                Entry::Spend(spend) => match &spend.destination {
                    Some(dest) => (dest.value, &spend.control_program),
                    None => continue,
                },
                Entry::Output(out) => (out.source.value, &out.control_program),
                _ => continue,
            };
            if value.asset_id == native && !segwit::is_witness_program(&program.code) {
                return Err(at(id)(ValidationError::NotStandardTx));
            }
        }
        Ok(())
    }

    fn run_programs(&self, meter: &mut GasMeter, trace: &mut dyn TraceSink) -> Checked<()> {
        let graph = self.graph;
        let params = &self.ctx.params;

        for (index, id, entry) in graph.entries() {
            let fail = at(id);
            let (program, dest): (&Program, Option<&ValueDestination>) = match entry {
                Entry::Spend(spend) => (&spend.control_program, spend.destination.as_ref()),
                Entry::Issuance(iss) => {
                    let definition = self.definitions.get(&index).ok_or_else(|| {
                        fail(ValidationError::Internal("issuance definition not resolved".into()))
                    })?;
                    (&definition.issuance_program, iss.destination.as_ref())
                }
                Entry::Mux(mux) => (&mux.program, None),
                _ => continue,
            };

            let tx_sig_hash = graph
                .sig_hash(index)
                .ok_or_else(|| fail(ValidationError::Internal("no sighash for entry".into())))?;
            let checker = dest.and_then(|d| match graph.entry(d.entry) {
                Some(Entry::Mux(_)) => Some(MuxOutputs {
                    graph,
                    mux: d.entry,
                }),
                _ => None,
            });
            let exec = ExecContext {
                max_vm_version: params.max_vm_version,
                block_height: self.ctx.block_height,
                block_time: self.ctx.block_time,
                tx_id: graph.tx_id(),
                entry_id: *id.as_hash(),
                tx_sig_hash,
                program: &program.code,
                asset_id: dest.map(|d| d.value.asset_id),
                amount: dest.map(|d| d.value.amount),
                dest_pos: dest.map(|d| d.position),
                spent_output_id: match entry {
                    Entry::Spend(spend) => Some(spend.spent_output_id),
                    _ => None,
                },
                output_checker: checker.as_ref().map(|c| c as &dyn OutputChecker),
                verifier: self.ctx.verifier.as_ref(),
            };

            trace!(entry = %id, kind = %entry.kind(), "running program");
            voc_vm::verify(program, entry.arguments(), &exec, meter, trace)
                .map_err(|e| fail(script_error(e)))?;
        }
        Ok(())
    }
}

/// Answers `CHECKOUTPUT` against the destinations of one mux.
struct MuxOutputs<'g> {
    graph: &'g EntryGraph,
    mux: EntryIndex,
}

impl OutputChecker for MuxOutputs<'_> {
    fn check_output(
        &self,
        index: u64,
        amount: u64,
        asset_id: &AssetId,
        vm_version: u64,
        code: &[u8],
    ) -> std::result::Result<bool, VmError> {
        let Some(Entry::Mux(mux)) = self.graph.entry(self.mux) else {
            return Err(VmError::WrongContext);
        };
        let dest = usize::try_from(index)
            .ok()
            .and_then(|i| mux.destinations.get(i))
            .ok_or(VmError::BadValue)?;
        if dest.value.amount != amount || dest.value.asset_id != *asset_id {
            return Ok(false);
        }
        Ok(match self.graph.entry(dest.entry) {
            Some(Entry::Output(out)) => {
                out.control_program.vm_version == vm_version && out.control_program.code == code
            }
            Some(Entry::Retirement(_)) => {
                vm_version == VM_VERSION_1 && code.first() == Some(&OP_FAIL_BYTE)
            }
            _ => false,
        })
    }
}

fn check_time_range(range: &TimeRange, block_time: u64) -> Result<()> {
    let bad = (range.min_time > 0 && block_time < range.min_time)
        || (range.max_time > 0 && block_time > range.max_time)
        || range.is_inverted();
    if bad {
        return Err(ValidationError::BadTimeRange {
            block_time,
            min_time: range.min_time,
            max_time: range.max_time,
        });
    }
    Ok(())
}

fn check_value(expected: &AssetAmount, found: &AssetAmount) -> Result<()> {
    if expected.asset_id != found.asset_id {
        return Err(ValidationError::MismatchedAssetId {
            expected: expected.asset_id,
            found: found.asset_id,
        });
    }
    if expected.amount != found.amount {
        return Err(ValidationError::MismatchedValue {
            expected: expected.amount,
            found: found.amount,
        });
    }
    Ok(())
}

fn required(dest: &Option<ValueDestination>) -> Result<&ValueDestination> {
    dest.as_ref().ok_or(ValidationError::MissingField("destination"))
}

fn nth<T>(items: &[T], position: u64) -> Result<&T> {
    usize::try_from(position)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(ValidationError::Position(position))
}

fn signed(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| ValidationError::Overflow)
}

fn script_error(err: VmError) -> ValidationError {
    match err {
        VmError::DeadlineExceeded => ValidationError::DeadlineExceeded,
        other => ValidationError::Vm(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_bounds() {
        assert!(check_time_range(&TimeRange::new(0, 0), 500).is_ok());
        assert!(check_time_range(&TimeRange::new(100, 200), 100).is_ok());
        assert!(check_time_range(&TimeRange::new(100, 200), 200).is_ok());
        assert!(check_time_range(&TimeRange::new(100, 0), 99).is_err());
        assert!(check_time_range(&TimeRange::new(0, 200), 201).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = check_time_range(&TimeRange::new(300, 200), 250).unwrap_err();
        assert!(matches!(err, ValidationError::BadTimeRange { .. }));
    }

    #[test]
    fn test_check_value() {
        let a = AssetAmount::native(5);
        assert!(check_value(&a, &a).is_ok());
        assert_eq!(
            check_value(&a, &AssetAmount::native(6)),
            Err(ValidationError::MismatchedValue {
                expected: 5,
                found: 6
            })
        );
        let other = AssetAmount::new(AssetId(voc_core::hash(b"x")), 5);
        assert!(matches!(
            check_value(&a, &other),
            Err(ValidationError::MismatchedAssetId { .. })
        ));
    }

    #[test]
    fn test_nth_out_of_range_is_position() {
        assert_eq!(nth(&[1, 2], 2), Err(ValidationError::Position(2)));
        assert_eq!(nth(&[1, 2], 1), Ok(&2));
    }

    #[test]
    fn test_deadline_maps_to_cancel() {
        assert_eq!(
            script_error(VmError::DeadlineExceeded),
            ValidationError::DeadlineExceeded
        );
        assert_eq!(
            script_error(VmError::FalseResult),
            ValidationError::Vm(VmError::FalseResult)
        );
    }
}
