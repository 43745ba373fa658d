//! Read-only chain state consulted during validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use voc_core::{AssetAmount, AssetDefinition, AssetId, Hash};

/// A snapshot of the unspent output set and known asset definitions.
///
/// Validation never mutates state; implementations must tolerate concurrent
/// readers.
pub trait StateView: Send + Sync {
    /// The value held by an unspent output, or `None` if it does not exist or
    /// has already been spent.
    fn lookup(&self, output_id: &Hash) -> Option<AssetAmount>;

    /// The definition registered for an asset, if any.
    fn asset_definition(&self, asset_id: &AssetId) -> Option<AssetDefinition>;
}

/// An in-memory state, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub struct MemoryState {
    outputs: HashMap<Hash, AssetAmount>,
    definitions: HashMap<AssetId, AssetDefinition>,
}

/// Serialized form of [`MemoryState`]: plain lists, since ids are not valid
/// JSON map keys.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    outputs: Vec<(Hash, AssetAmount)>,
    #[serde(default)]
    asset_definitions: Vec<AssetDefinition>,
}

impl From<Snapshot> for MemoryState {
    fn from(snapshot: Snapshot) -> Self {
        let mut state = MemoryState::new();
        for (id, value) in snapshot.outputs {
            state.insert_output(id, value);
        }
        for def in snapshot.asset_definitions {
            state.insert_definition(def);
        }
        state
    }
}

impl From<MemoryState> for Snapshot {
    fn from(state: MemoryState) -> Self {
        let mut outputs: Vec<_> = state.outputs.into_iter().collect();
        outputs.sort_by_key(|(id, _)| *id);
        let mut asset_definitions: Vec<_> = state.definitions.into_iter().collect();
        asset_definitions.sort_by_key(|(id, _)| *id);
        Snapshot {
            outputs,
            asset_definitions: asset_definitions.into_iter().map(|(_, def)| def).collect(),
        }
    }
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an unspent output.
    pub fn insert_output(&mut self, output_id: Hash, value: AssetAmount) {
        self.outputs.insert(output_id, value);
    }

    /// Mark an output spent.
    pub fn remove_output(&mut self, output_id: &Hash) -> Option<AssetAmount> {
        self.outputs.remove(output_id)
    }

    /// Register a definition under its computed asset id.
    pub fn insert_definition(&mut self, definition: AssetDefinition) -> AssetId {
        let id = definition.compute_asset_id();
        self.definitions.insert(id, definition);
        id
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

impl StateView for MemoryState {
    fn lookup(&self, output_id: &Hash) -> Option<AssetAmount> {
        self.outputs.get(output_id).copied()
    }

    fn asset_definition(&self, asset_id: &AssetId) -> Option<AssetDefinition> {
        self.definitions.get(asset_id).cloned()
    }
}
