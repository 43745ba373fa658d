//! Wire transactions.
//!
//! [`TxData`] is the mutable, serializable form. [`Transaction`] is built from
//! it once and is immutable afterwards: it caches the encoded size, the id and
//! the entry graph. Changing anything means building a new transaction.

use crate::asset::{AssetAmount, AssetDefinition};
use crate::entry::{output_id, EntryIndex};
use crate::graph::{EntryGraph, GraphError, Result};
use crate::hash::Hash;
use crate::program::Program;
use bincode::Options;
use serde::{Deserialize, Serialize};

/// Validity window in block time. Zero on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeRange {
    pub fn new(min_time: u64, max_time: u64) -> Self {
        Self { min_time, max_time }
    }

    /// Whether both bounds are set and inverted.
    pub fn is_inverted(&self) -> bool {
        self.min_time > 0 && self.max_time > 0 && self.min_time > self.max_time
    }

    pub fn contains(&self, time: u64) -> bool {
        (self.min_time == 0 || time >= self.min_time) && (self.max_time == 0 || time <= self.max_time)
    }
}

/// Consumes a previously created output. The commitment fields let the output
/// id be recomputed without trusting anything else in the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendInput {
    /// Id of the entry that produced the output (its mux).
    pub source_id: Hash,
    pub source_position: u64,
    pub value: AssetAmount,
    pub control_program: Program,
    pub arguments: Vec<Vec<u8>>,
}

impl SpendInput {
    pub fn spent_output_id(&self) -> Hash {
        output_id(
            &self.source_id,
            &self.value,
            self.source_position,
            &self.control_program,
        )
    }
}

/// Creates new units of a non-native asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceInput {
    pub nonce: Vec<u8>,
    pub value: AssetAmount,
    /// When absent the validator asks the state view for a registered one.
    pub asset_definition: Option<AssetDefinition>,
    pub arguments: Vec<Vec<u8>>,
}

/// Mints the block reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseInput {
    pub value: AssetAmount,
    pub arbitrary: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxInput {
    Spend(SpendInput),
    Issuance(IssuanceInput),
    Coinbase(CoinbaseInput),
}

impl TxInput {
    pub fn value(&self) -> AssetAmount {
        match self {
            TxInput::Spend(s) => s.value,
            TxInput::Issuance(i) => i.value,
            TxInput::Coinbase(c) => c.value,
        }
    }

    /// Witness arguments, where the input carries any.
    pub fn arguments_mut(&mut self) -> Option<&mut Vec<Vec<u8>>> {
        match self {
            TxInput::Spend(s) => Some(&mut s.arguments),
            TxInput::Issuance(i) => Some(&mut i.arguments),
            TxInput::Coinbase(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: AssetAmount,
    pub control_program: Program,
}

impl TxOutput {
    pub fn new(value: AssetAmount, control_program: Program) -> Self {
        Self {
            value,
            control_program,
        }
    }
}

/// Serializable transaction contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxData {
    pub version: u64,
    pub time_range: TimeRange,
    /// Native-asset fee the transaction declares it pays.
    pub fee: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

fn wire_options(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(limit)
        .reject_trailing_bytes()
}

impl TxData {
    /// Encode to the wire format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        wire_options(u64::MAX)
            .serialize(self)
            .map_err(|e| GraphError::MalformedEncoding(e.to_string()))
    }
}

/// An immutable transaction with its materialised entry graph.
#[derive(Debug, Clone)]
pub struct Transaction {
    data: TxData,
    serialized_size: u64,
    graph: EntryGraph,
}

impl Transaction {
    /// Finalize `data`. The size is measured from its encoding.
    pub fn new(data: TxData) -> Result<Self> {
        let serialized_size = data.encode()?.len() as u64;
        let graph = EntryGraph::from_tx(&data, serialized_size)?;
        Ok(Self {
            data,
            serialized_size,
            graph,
        })
    }

    /// Decode wire bytes, refusing anything empty or above `max_size` before
    /// any parsing happens.
    pub fn decode(bytes: &[u8], max_size: u64) -> Result<Self> {
        let size = bytes.len() as u64;
        if size == 0 || size > max_size {
            return Err(GraphError::WrongTransactionSize {
                size,
                max: max_size,
            });
        }
        let data: TxData = wire_options(max_size)
            .deserialize(bytes)
            .map_err(|e| GraphError::MalformedEncoding(e.to_string()))?;
        let graph = EntryGraph::from_tx(&data, size)?;
        Ok(Self {
            data,
            serialized_size: size,
            graph,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.data.encode()
    }

    pub fn id(&self) -> Hash {
        self.graph.tx_id()
    }

    pub fn data(&self) -> &TxData {
        &self.data
    }

    pub fn graph(&self) -> &EntryGraph {
        &self.graph
    }

    pub fn serialized_size(&self) -> u64 {
        self.serialized_size
    }

    /// The message the witness of input `index` signs.
    pub fn sig_hash(&self, index: usize) -> Option<Hash> {
        if index >= self.data.inputs.len() {
            return None;
        }
        self.graph.sig_hash(EntryIndex(index as u32))
    }

    /// Id of the mux every output is sourced from.
    pub fn mux_id(&self) -> Option<Hash> {
        let idx = EntryIndex(self.data.inputs.len() as u32);
        self.graph.id(idx).map(|id| *id.as_hash())
    }

    /// Id of output `index`, as a later spend would compute it.
    pub fn output_id(&self, index: usize) -> Option<Hash> {
        let result = self.graph.results().get(index)?;
        self.graph.id(*result).map(|id| *id.as_hash())
    }

    /// A spend of output `index` with empty witness arguments.
    pub fn spend_output(&self, index: usize) -> Option<SpendInput> {
        let out = self.data.outputs.get(index)?;
        Some(SpendInput {
            source_id: self.mux_id()?,
            source_position: index as u64,
            value: out.value,
            control_program: out.control_program.clone(),
            arguments: Vec::new(),
        })
    }
}
