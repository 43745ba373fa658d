//! Entries: the immutable, content-addressed nodes of a transaction's value
//! flow graph.
//!
//! References between entries are arena handles ([`EntryIndex`]) into the
//! owning [`crate::graph::EntryGraph`], never pointers. Identity is computed
//! from each entry's body; witness fields (destinations, arguments, asset
//! definitions) are excluded so that signatures can commit to the identity.

use crate::asset::{AssetAmount, AssetDefinition};
use crate::encoding::HashWriter;
use crate::hash::Hash;
use crate::program::Program;
use std::fmt;

/// Handle of an entry inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIndex(pub u32);

impl EntryIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content hash identifying an entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntryId(pub Hash);

impl EntryId {
    pub fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId(0x{})", &self.0.to_hex()[..8])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where value entering an entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSource {
    pub entry: EntryIndex,
    pub value: AssetAmount,
    pub position: u64,
}

/// Where value leaving an entry goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDestination {
    pub entry: EntryIndex,
    pub value: AssetAmount,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub nonce_hash: Hash,
    pub value: AssetAmount,
    pub destination: Option<ValueDestination>,
    pub asset_definition: Option<AssetDefinition>,
    pub arguments: Vec<Vec<u8>>,
    pub ordinal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    /// Identity of the consumed output, recomputed from the spend commitment.
    pub spent_output_id: Hash,
    pub control_program: Program,
    pub destination: Option<ValueDestination>,
    pub arguments: Vec<Vec<u8>>,
    pub ordinal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub source: ValueSource,
    pub control_program: Program,
    pub ordinal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retirement {
    pub source: ValueSource,
    pub ordinal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mux {
    pub sources: Vec<ValueSource>,
    pub program: Program,
    pub destinations: Vec<ValueDestination>,
    pub arguments: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coinbase {
    pub destination: Option<ValueDestination>,
    pub arbitrary: Vec<u8>,
    pub ordinal: u64,
}

/// A node of the value flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Issuance(Issuance),
    Spend(Spend),
    Output(Output),
    Mux(Mux),
    Coinbase(Coinbase),
    Retirement(Retirement),
}

/// Variant tag of an [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Issuance,
    Spend,
    Output,
    Mux,
    Coinbase,
    Retirement,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Issuance => "issuance1",
            EntryKind::Spend => "spend1",
            EntryKind::Output => "output1",
            EntryKind::Mux => "mux1",
            EntryKind::Coinbase => "coinbase1",
            EntryKind::Retirement => "retirement1",
        }
    }

    /// Kinds that may appear as the upstream end of a [`ValueSource`].
    pub fn emits_value(self) -> bool {
        matches!(
            self,
            EntryKind::Coinbase | EntryKind::Issuance | EntryKind::Spend | EntryKind::Mux
        )
    }

    /// Kinds that may appear as the downstream end of a [`ValueDestination`].
    pub fn accepts_value(self) -> bool {
        matches!(
            self,
            EntryKind::Output | EntryKind::Retirement | EntryKind::Mux
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Issuance(_) => EntryKind::Issuance,
            Entry::Spend(_) => EntryKind::Spend,
            Entry::Output(_) => EntryKind::Output,
            Entry::Mux(_) => EntryKind::Mux,
            Entry::Coinbase(_) => EntryKind::Coinbase,
            Entry::Retirement(_) => EntryKind::Retirement,
        }
    }

    /// Upstream references of this entry.
    pub fn sources(&self) -> &[ValueSource] {
        match self {
            Entry::Output(o) => std::slice::from_ref(&o.source),
            Entry::Retirement(r) => std::slice::from_ref(&r.source),
            Entry::Mux(m) => &m.sources,
            _ => &[],
        }
    }

    /// Downstream references of this entry. Single-destination variants
    /// yield an empty slice while their destination is unset.
    pub fn destinations(&self) -> &[ValueDestination] {
        match self {
            Entry::Issuance(i) => i.destination.as_slice(),
            Entry::Spend(s) => s.destination.as_slice(),
            Entry::Coinbase(c) => c.destination.as_slice(),
            Entry::Mux(m) => &m.destinations,
            _ => &[],
        }
    }

    /// Whether a single-destination variant is missing its destination.
    pub fn missing_destination(&self) -> bool {
        match self {
            Entry::Issuance(i) => i.destination.is_none(),
            Entry::Spend(s) => s.destination.is_none(),
            Entry::Coinbase(c) => c.destination.is_none(),
            _ => false,
        }
    }

    /// Number of positions a downstream entry may name when sourcing value
    /// from this one.
    pub fn destination_slots(&self) -> u64 {
        match self {
            Entry::Mux(m) => m.destinations.len() as u64,
            _ => 1,
        }
    }

    /// Number of positions an upstream entry may name when sending value to
    /// this one.
    pub fn source_slots(&self) -> u64 {
        match self {
            Entry::Mux(m) => m.sources.len() as u64,
            _ => 1,
        }
    }

    /// Arguments consumed by this entry's program, if it runs one.
    pub fn arguments(&self) -> &[Vec<u8>] {
        match self {
            Entry::Issuance(i) => &i.arguments,
            Entry::Spend(s) => &s.arguments,
            Entry::Mux(m) => &m.arguments,
            _ => &[],
        }
    }

    pub fn ordinal(&self) -> Option<u64> {
        match self {
            Entry::Issuance(i) => Some(i.ordinal),
            Entry::Spend(s) => Some(s.ordinal),
            Entry::Output(o) => Some(o.ordinal),
            Entry::Retirement(r) => Some(r.ordinal),
            Entry::Coinbase(c) => Some(c.ordinal),
            Entry::Mux(_) => None,
        }
    }

    /// Compute this entry's identity. `resolve` maps arena handles of upstream
    /// entries to their already-computed ids.
    pub fn compute_id(&self, resolve: impl Fn(EntryIndex) -> Option<EntryId>) -> Option<EntryId> {
        let body = match self {
            Entry::Issuance(e) => HashWriter::new()
                .hash(&e.nonce_hash)
                .hash(e.value.asset_id.as_hash())
                .u64(e.value.amount)
                .u64(e.ordinal)
                .finish(),
            Entry::Spend(e) => HashWriter::new()
                .hash(&e.spent_output_id)
                .u64(e.ordinal)
                .finish(),
            Entry::Output(e) => {
                return Some(EntryId(output_id(
                    resolve(e.source.entry)?.as_hash(),
                    &e.source.value,
                    e.source.position,
                    &e.control_program,
                )))
            }
            Entry::Retirement(e) => {
                let mut w = HashWriter::new();
                write_source(&mut w, resolve(e.source.entry)?, &e.source);
                w.u64(e.ordinal).finish()
            }
            Entry::Mux(e) => {
                let mut w = HashWriter::new();
                w.u64(e.sources.len() as u64);
                for src in &e.sources {
                    write_source(&mut w, resolve(src.entry)?, src);
                }
                w.u64(e.program.vm_version).bytes(&e.program.code).finish()
            }
            Entry::Coinbase(e) => HashWriter::new()
                .bytes(&e.arbitrary)
                .u64(e.ordinal)
                .finish(),
        };
        Some(EntryId(wrap_entry_id(self.kind(), &body)))
    }
}

fn write_source(w: &mut HashWriter, ref_id: EntryId, src: &ValueSource) {
    w.hash(ref_id.as_hash())
        .hash(src.value.asset_id.as_hash())
        .u64(src.value.amount)
        .u64(src.position);
}

fn wrap_entry_id(kind: EntryKind, body: &Hash) -> Hash {
    HashWriter::tagged("entryid")
        .bytes(kind.as_str().as_bytes())
        .hash(body)
        .finish()
}

/// The identity of an output, computable both from the output entry itself and
/// from a spend's commitment to it.
pub fn output_id(source_id: &Hash, value: &AssetAmount, position: u64, program: &Program) -> Hash {
    let body = HashWriter::new()
        .hash(source_id)
        .hash(value.asset_id.as_hash())
        .u64(value.amount)
        .u64(position)
        .u64(program.vm_version)
        .bytes(&program.code)
        .finish();
    wrap_entry_id(EntryKind::Output, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(entry: u32, amount: u64, position: u64) -> ValueDestination {
        ValueDestination {
            entry: EntryIndex(entry),
            value: AssetAmount::native(amount),
            position,
        }
    }

    #[test]
    fn test_kind_compatibility() {
        assert!(EntryKind::Mux.emits_value() && EntryKind::Mux.accepts_value());
        assert!(EntryKind::Spend.emits_value() && !EntryKind::Spend.accepts_value());
        assert!(!EntryKind::Output.emits_value() && EntryKind::Output.accepts_value());
    }

    #[test]
    fn test_witness_fields_do_not_affect_id() {
        let spend = Spend {
            spent_output_id: Hash([9; 32]),
            control_program: Program::v1(vec![0x51]),
            destination: Some(dest(1, 10, 0)),
            arguments: vec![],
            ordinal: 0,
        };
        let mut signed = spend.clone();
        signed.arguments = vec![vec![1, 2, 3]];
        signed.destination = Some(dest(4, 10, 2));

        let a = Entry::Spend(spend).compute_id(|_| None);
        let b = Entry::Spend(signed).compute_id(|_| None);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_id_matches_spend_commitment() {
        let mux_id = EntryId(Hash([3; 32]));
        let program = Program::v1(vec![0x51]);
        let output = Entry::Output(Output {
            source: ValueSource {
                entry: EntryIndex(0),
                value: AssetAmount::native(50),
                position: 1,
            },
            control_program: program.clone(),
            ordinal: 7,
        });
        let id = output.compute_id(|_| Some(mux_id)).unwrap();
        assert_eq!(
            id.0,
            output_id(mux_id.as_hash(), &AssetAmount::native(50), 1, &program)
        );
    }

    #[test]
    fn test_unresolved_upstream_yields_none() {
        let retirement = Entry::Retirement(Retirement {
            source: ValueSource {
                entry: EntryIndex(0),
                value: AssetAmount::native(1),
                position: 0,
            },
            ordinal: 0,
        });
        assert!(retirement.compute_id(|_| None).is_none());
    }
}
