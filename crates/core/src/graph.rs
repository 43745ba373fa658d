//! The entry graph: an arena of entries plus the transaction header.
//!
//! Graphs are only produced by [`GraphBuilder::build`], which checks every
//! reference once. Afterwards all lookups are by [`EntryIndex`] and cannot
//! dangle. Sources always point to earlier entries, so the graph is acyclic
//! by construction.

use crate::encoding::HashWriter;
use crate::entry::{
    Coinbase, Entry, EntryId, EntryIndex, EntryKind, Issuance, Mux, Output, Retirement, Spend,
    ValueDestination, ValueSource,
};
use crate::hash::{hash, hash_concat, Hash};
use crate::program::Program;
use crate::transaction::{TimeRange, TxData, TxInput};
use std::collections::HashMap;
use thiserror::Error;

/// Structural failures found while decoding bytes or building a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("malformed reference from {from:?} to entry {to}: {reason}")]
    MalformedReference {
        from: Option<EntryIndex>,
        to: u32,
        reason: &'static str,
    },
    #[error("position {position} out of range on reference from {from} to {to}")]
    MalformedPosition {
        from: EntryIndex,
        to: EntryIndex,
        position: u64,
    },
    #[error("entry {0} is missing a required destination")]
    MissingField(EntryIndex),
    #[error("transaction size {size} outside 1..={max}")]
    WrongTransactionSize { size: u64, max: u64 },
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Header fields committed to by the transaction id, plus the measured size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHeader {
    pub version: u64,
    /// Encoded byte length. Not part of the id.
    pub serialized_size: u64,
    pub time_range: TimeRange,
    /// Declared native-asset fee.
    pub fee: u64,
}

/// Collects entries and results, then validates every reference in one pass.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entries: Vec<Entry>,
    results: Vec<EntryIndex>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its handle. Handles are assigned in order,
    /// so destinations may name entries that are pushed later.
    pub fn push(&mut self, entry: Entry) -> EntryIndex {
        let index = EntryIndex(self.entries.len() as u32);
        self.entries.push(entry);
        index
    }

    /// Register an entry as one of the transaction's results.
    pub fn result(&mut self, index: EntryIndex) -> &mut Self {
        self.results.push(index);
        self
    }

    /// Index the next [`push`](Self::push) will return.
    pub fn next_index(&self) -> EntryIndex {
        EntryIndex(self.entries.len() as u32)
    }

    pub fn build(self, header: TxHeader) -> Result<EntryGraph> {
        let GraphBuilder { entries, results } = self;
        if entries.len() > u32::MAX as usize {
            return Err(GraphError::MalformedEncoding(format!(
                "{} entries exceed the arena limit",
                entries.len()
            )));
        }

        for (i, entry) in entries.iter().enumerate() {
            let from = EntryIndex(i as u32);
            if entry.missing_destination() {
                return Err(GraphError::MissingField(from));
            }
            for src in entry.sources() {
                check_source(&entries, from, src)?;
            }
            for dest in entry.destinations() {
                check_destination(&entries, from, dest)?;
            }
        }

        for &r in &results {
            match entries.get(r.as_usize()).map(Entry::kind) {
                Some(EntryKind::Output) | Some(EntryKind::Retirement) => {}
                Some(_) => {
                    return Err(GraphError::MalformedReference {
                        from: None,
                        to: r.0,
                        reason: "result is not an output or retirement",
                    })
                }
                None => {
                    return Err(GraphError::MalformedReference {
                        from: None,
                        to: r.0,
                        reason: "result out of range",
                    })
                }
            }
        }

        let mut ids: Vec<EntryId> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let id = entry
                .compute_id(|idx| ids.get(idx.as_usize()).copied())
                .ok_or_else(|| {
                    GraphError::MalformedEncoding("unresolved upstream entry".to_string())
                })?;
            ids.push(id);
        }

        let by_id = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, EntryIndex(i as u32)))
            .collect();

        let mut w = HashWriter::tagged("txheader");
        w.u64(header.version)
            .u64(header.time_range.min_time)
            .u64(header.time_range.max_time)
            .u64(header.fee)
            .u64(results.len() as u64);
        for r in &results {
            w.hash(ids[r.as_usize()].as_hash());
        }
        let tx_id = w.finish();

        Ok(EntryGraph {
            header,
            entries,
            ids,
            by_id,
            results,
            tx_id,
        })
    }
}

fn check_source(entries: &[Entry], from: EntryIndex, src: &ValueSource) -> Result<()> {
    if src.entry >= from {
        return Err(GraphError::MalformedReference {
            from: Some(from),
            to: src.entry.0,
            reason: "source does not point to an earlier entry",
        });
    }
    let target = &entries[src.entry.as_usize()];
    if !target.kind().emits_value() {
        return Err(GraphError::MalformedReference {
            from: Some(from),
            to: src.entry.0,
            reason: "source cannot emit value",
        });
    }
    if src.position >= target.destination_slots() {
        return Err(GraphError::MalformedPosition {
            from,
            to: src.entry,
            position: src.position,
        });
    }
    Ok(())
}

fn check_destination(entries: &[Entry], from: EntryIndex, dest: &ValueDestination) -> Result<()> {
    let target = entries
        .get(dest.entry.as_usize())
        .filter(|_| dest.entry != from)
        .ok_or(GraphError::MalformedReference {
            from: Some(from),
            to: dest.entry.0,
            reason: "destination out of range",
        })?;
    if !target.kind().accepts_value() {
        return Err(GraphError::MalformedReference {
            from: Some(from),
            to: dest.entry.0,
            reason: "destination cannot accept value",
        });
    }
    if dest.position >= target.source_slots() {
        return Err(GraphError::MalformedPosition {
            from,
            to: dest.entry,
            position: dest.position,
        });
    }
    Ok(())
}

/// A checked, immutable value flow graph.
#[derive(Debug, Clone)]
pub struct EntryGraph {
    header: TxHeader,
    entries: Vec<Entry>,
    ids: Vec<EntryId>,
    by_id: HashMap<EntryId, EntryIndex>,
    results: Vec<EntryIndex>,
    tx_id: Hash,
}

impl EntryGraph {
    /// Map wire data onto the canonical layout: one entry per input, a single
    /// mux fed by every input, and one output or retirement per wire output.
    pub fn from_tx(data: &TxData, serialized_size: u64) -> Result<Self> {
        let n = data.inputs.len();
        let m = data.outputs.len();
        let total = n
            .checked_add(m)
            .and_then(|t| t.checked_add(1))
            .filter(|t| *t <= u32::MAX as usize)
            .ok_or_else(|| GraphError::MalformedEncoding("too many inputs and outputs".into()))?;
        let mux = EntryIndex(n as u32);
        let mut builder = GraphBuilder {
            entries: Vec::with_capacity(total),
            results: Vec::with_capacity(m),
        };

        for (i, input) in data.inputs.iter().enumerate() {
            let ordinal = i as u64;
            let destination = Some(ValueDestination {
                entry: mux,
                value: input.value(),
                position: ordinal,
            });
            let entry = match input {
                TxInput::Spend(s) => Entry::Spend(Spend {
                    spent_output_id: s.spent_output_id(),
                    control_program: s.control_program.clone(),
                    destination,
                    arguments: s.arguments.clone(),
                    ordinal,
                }),
                TxInput::Issuance(iss) => Entry::Issuance(Issuance {
                    nonce_hash: hash(&iss.nonce),
                    value: iss.value,
                    destination,
                    asset_definition: iss.asset_definition.clone(),
                    arguments: iss.arguments.clone(),
                    ordinal,
                }),
                TxInput::Coinbase(cb) => Entry::Coinbase(Coinbase {
                    destination,
                    arbitrary: cb.arbitrary.clone(),
                    ordinal,
                }),
            };
            builder.push(entry);
        }

        let sources = data
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| ValueSource {
                entry: EntryIndex(i as u32),
                value: input.value(),
                position: 0,
            })
            .collect();
        let destinations = data
            .outputs
            .iter()
            .enumerate()
            .map(|(j, out)| ValueDestination {
                entry: EntryIndex((n + 1 + j) as u32),
                value: out.value,
                position: 0,
            })
            .collect();
        builder.push(Entry::Mux(Mux {
            sources,
            program: Program::v1(vec![OP_TRUE]),
            destinations,
            arguments: Vec::new(),
        }));

        for (j, out) in data.outputs.iter().enumerate() {
            let source = ValueSource {
                entry: mux,
                value: out.value,
                position: j as u64,
            };
            let ordinal = j as u64;
            let entry = if out.control_program.is_retirement() {
                Entry::Retirement(Retirement { source, ordinal })
            } else {
                Entry::Output(Output {
                    source,
                    control_program: out.control_program.clone(),
                    ordinal,
                })
            };
            let idx = builder.push(entry);
            builder.result(idx);
        }

        builder.build(TxHeader {
            version: data.version,
            serialized_size,
            time_range: data.time_range,
            fee: data.fee,
        })
    }

    pub fn header(&self) -> &TxHeader {
        &self.header
    }

    /// The transaction id.
    pub fn tx_id(&self) -> Hash {
        self.tx_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: EntryIndex) -> Option<&Entry> {
        self.entries.get(index.as_usize())
    }

    pub fn id(&self, index: EntryIndex) -> Option<EntryId> {
        self.ids.get(index.as_usize()).copied()
    }

    pub fn index_of(&self, id: &EntryId) -> Option<EntryIndex> {
        self.by_id.get(id).copied()
    }

    /// Entries with their handles and ids, in arena order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryIndex, EntryId, &Entry)> + '_ {
        self.entries
            .iter()
            .zip(&self.ids)
            .enumerate()
            .map(|(i, (entry, id))| (EntryIndex(i as u32), *id, entry))
    }

    pub fn results(&self) -> &[EntryIndex] {
        &self.results
    }

    /// The message a signature over `index` commits to.
    pub fn sig_hash(&self, index: EntryIndex) -> Option<Hash> {
        let id = self.id(index)?;
        Some(hash_concat(&[id.as_hash().as_bytes(), self.tx_id.as_bytes()]))
    }

    /// Whether any entry is a coinbase.
    pub fn has_coinbase(&self) -> bool {
        self.entries.iter().any(|e| e.kind() == EntryKind::Coinbase)
    }
}

const OP_TRUE: u8 = 0x51;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetAmount, AssetId};
    use crate::transaction::{CoinbaseInput, SpendInput, TxOutput};

    fn header() -> TxHeader {
        TxHeader {
            version: 1,
            serialized_size: 100,
            time_range: TimeRange::default(),
            fee: 0,
        }
    }

    fn dest(entry: u32, amount: u64, position: u64) -> Option<ValueDestination> {
        Some(ValueDestination {
            entry: EntryIndex(entry),
            value: AssetAmount::native(amount),
            position,
        })
    }

    fn src(entry: u32, amount: u64, position: u64) -> ValueSource {
        ValueSource {
            entry: EntryIndex(entry),
            value: AssetAmount::native(amount),
            position,
        }
    }

    fn coinbase(destination: Option<ValueDestination>) -> Entry {
        Entry::Coinbase(Coinbase {
            destination,
            arbitrary: vec![],
            ordinal: 0,
        })
    }

    fn output(source: ValueSource) -> Entry {
        Entry::Output(Output {
            source,
            control_program: Program::v1(vec![0x51]),
            ordinal: 0,
        })
    }

    #[test]
    fn test_minimal_graph_builds() {
        let mut b = GraphBuilder::new();
        b.push(coinbase(dest(1, 10, 0)));
        let out = b.push(output(src(0, 10, 0)));
        b.result(out);
        let g = b.build(header()).unwrap();

        assert_eq!(g.len(), 2);
        assert_eq!(g.results(), &[out]);
        let id = g.id(out).unwrap();
        assert_eq!(g.index_of(&id), Some(out));
    }

    #[test]
    fn test_forward_source_rejected() {
        let mut b = GraphBuilder::new();
        b.push(output(src(1, 10, 0)));
        b.push(coinbase(dest(0, 10, 0)));
        assert!(matches!(
            b.build(header()),
            Err(GraphError::MalformedReference { from: Some(EntryIndex(0)), to: 1, .. })
        ));
    }

    #[test]
    fn test_self_source_rejected() {
        let mut b = GraphBuilder::new();
        b.push(Entry::Mux(Mux {
            sources: vec![src(0, 1, 0)],
            program: Program::v1(vec![0x51]),
            destinations: vec![],
            arguments: vec![],
        }));
        assert!(matches!(
            b.build(header()),
            Err(GraphError::MalformedReference { .. })
        ));
    }

    #[test]
    fn test_out_of_range_destination_rejected() {
        let mut b = GraphBuilder::new();
        b.push(coinbase(dest(7, 10, 0)));
        assert!(matches!(
            b.build(header()),
            Err(GraphError::MalformedReference { to: 7, .. })
        ));
    }

    #[test]
    fn test_incompatible_variant_rejected() {
        let mut b = GraphBuilder::new();
        b.push(coinbase(dest(1, 10, 0)));
        b.push(coinbase(dest(0, 10, 0)));
        assert!(matches!(
            b.build(header()),
            Err(GraphError::MalformedReference { .. })
        ));
    }

    #[test]
    fn test_position_out_of_range_rejected() {
        let mut b = GraphBuilder::new();
        b.push(coinbase(dest(1, 10, 0)));
        b.push(output(src(0, 10, 3)));
        assert_eq!(
            b.build(header()).unwrap_err(),
            GraphError::MalformedPosition {
                from: EntryIndex(1),
                to: EntryIndex(0),
                position: 3
            }
        );
    }

    #[test]
    fn test_missing_destination_rejected() {
        let mut b = GraphBuilder::new();
        b.push(coinbase(None));
        assert_eq!(
            b.build(header()).unwrap_err(),
            GraphError::MissingField(EntryIndex(0))
        );
    }

    #[test]
    fn test_result_must_be_output() {
        let mut b = GraphBuilder::new();
        let cb = b.push(coinbase(dest(1, 10, 0)));
        b.push(output(src(0, 10, 0)));
        b.result(cb);
        assert!(matches!(
            b.build(header()),
            Err(GraphError::MalformedReference { from: None, .. })
        ));
    }

    #[test]
    fn test_canonical_mapping_layout() {
        let data = TxData {
            version: 1,
            time_range: TimeRange::default(),
            fee: 5,
            inputs: vec![
                TxInput::Spend(SpendInput {
                    source_id: Hash([1; 32]),
                    source_position: 0,
                    value: AssetAmount::native(20),
                    control_program: Program::v1(vec![0x51]),
                    arguments: vec![],
                }),
                TxInput::Coinbase(CoinbaseInput {
                    value: AssetAmount::native(1),
                    arbitrary: vec![],
                }),
            ],
            outputs: vec![
                TxOutput::new(AssetAmount::native(10), Program::v1(vec![0x51])),
                TxOutput::new(AssetAmount::native(6), Program::v1(vec![0x6a])),
            ],
        };
        let g = EntryGraph::from_tx(&data, 120).unwrap();

        assert_eq!(g.len(), 5);
        assert_eq!(g.entry(EntryIndex(0)).unwrap().kind(), EntryKind::Spend);
        assert_eq!(g.entry(EntryIndex(1)).unwrap().kind(), EntryKind::Coinbase);
        assert_eq!(g.entry(EntryIndex(2)).unwrap().kind(), EntryKind::Mux);
        assert_eq!(g.entry(EntryIndex(3)).unwrap().kind(), EntryKind::Output);
        assert_eq!(g.entry(EntryIndex(4)).unwrap().kind(), EntryKind::Retirement);
        assert_eq!(g.results(), &[EntryIndex(3), EntryIndex(4)]);
        assert_eq!(g.header().fee, 5);
        assert!(g.has_coinbase());

        let Some(Entry::Mux(mux)) = g.entry(EntryIndex(2)) else {
            panic!("expected mux");
        };
        assert_eq!(mux.sources[1].entry, EntryIndex(1));
        assert_eq!(mux.destinations[1].entry, EntryIndex(4));
    }

    #[test]
    fn test_tx_id_ignores_serialized_size() {
        let data = TxData {
            version: 1,
            time_range: TimeRange::default(),
            fee: 0,
            inputs: vec![TxInput::Coinbase(CoinbaseInput {
                value: AssetAmount::native(1),
                arbitrary: vec![],
            })],
            outputs: vec![TxOutput::new(AssetAmount::native(1), Program::v1(vec![0x51]))],
        };
        let a = EntryGraph::from_tx(&data, 10).unwrap();
        let b = EntryGraph::from_tx(&data, 99).unwrap();
        assert_eq!(a.tx_id(), b.tx_id());

        let mut changed = data.clone();
        changed.fee = 1;
        assert_ne!(a.tx_id(), EntryGraph::from_tx(&changed, 10).unwrap().tx_id());
    }

    #[test]
    fn test_sig_hash_binds_entry_and_tx() {
        let data = TxData {
            version: 1,
            time_range: TimeRange::default(),
            fee: 0,
            inputs: vec![TxInput::Coinbase(CoinbaseInput {
                value: AssetAmount::new(AssetId::NATIVE, 3),
                arbitrary: vec![],
            })],
            outputs: vec![TxOutput::new(AssetAmount::native(3), Program::v1(vec![0x51]))],
        };
        let g = EntryGraph::from_tx(&data, 10).unwrap();
        let s0 = g.sig_hash(EntryIndex(0)).unwrap();
        let s1 = g.sig_hash(EntryIndex(1)).unwrap();
        assert_ne!(s0, s1);
        assert!(g.sig_hash(EntryIndex(9)).is_none());
    }
}
