//! Protocol parameters every node must agree on.

use crate::asset::AssetId;
use serde::{Deserialize, Serialize};

/// Consensus constants that drive validation and gas accounting.
///
/// Missing fields in a serialized configuration fall back to the mainnet
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Highest transaction version accepted.
    pub max_tx_version: u64,
    /// Ceiling on a transaction's serialized size in bytes.
    pub max_tx_size: u64,
    /// Ceiling on the coinbase arbitrary-data payload.
    pub coinbase_arbitrary_size_limit: usize,
    /// Native-asset units that buy one unit of gas.
    pub vm_gas_rate: u64,
    /// Gas charged per serialized byte.
    pub storage_gas_rate: u64,
    /// Upper bound on any transaction's gas.
    pub max_gas_amount: u64,
    /// Gas a transaction may burn before its fee has been confirmed.
    pub default_gas_credit: u64,
    /// Gas charged for each entry the validator visits.
    pub entry_visit_gas: u64,
    /// Highest VM version accepted for programs.
    pub max_vm_version: u64,
    /// Asset used for fees and the block reward.
    pub native_asset: AssetId,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            max_tx_version: 1,
            max_tx_size: 1_048_576,
            coinbase_arbitrary_size_limit: 128,
            vm_gas_rate: 200,
            storage_gas_rate: 1,
            max_gas_amount: 200_000,
            default_gas_credit: 30_000,
            entry_visit_gas: 8,
            max_vm_version: 2,
            native_asset: AssetId::NATIVE,
        }
    }
}
