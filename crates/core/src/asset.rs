//! Assets and checked amount arithmetic.

use crate::encoding::HashWriter;
use crate::hash::Hash;
use crate::program::Program;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an asset type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AssetId(pub Hash);

impl AssetId {
    /// The chain's native asset, used for fees and block rewards.
    pub const NATIVE: Self = Self(Hash([0xff; 32]));

    pub fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId(0x{})", &self.0.to_hex()[..8])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quantity of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset_id: AssetId,
    pub amount: u64,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: u64) -> Self {
        Self { asset_id, amount }
    }

    pub fn native(amount: u64) -> Self {
        Self::new(AssetId::NATIVE, amount)
    }

    /// Add two amounts of the same asset. `None` on asset mismatch or overflow.
    pub fn checked_add(&self, other: &AssetAmount) -> Option<AssetAmount> {
        if self.asset_id != other.asset_id {
            return None;
        }
        Some(Self::new(self.asset_id, self.amount.checked_add(other.amount)?))
    }

    /// Subtract two amounts of the same asset. `None` on asset mismatch or underflow.
    pub fn checked_sub(&self, other: &AssetAmount) -> Option<AssetAmount> {
        if self.asset_id != other.asset_id {
            return None;
        }
        Some(Self::new(self.asset_id, self.amount.checked_sub(other.amount)?))
    }
}

/// The definition an issuer commits to: the asset id is its hash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub issuance_program: Program,
    pub data: Vec<u8>,
}

impl AssetDefinition {
    pub fn new(issuance_program: Program, data: Vec<u8>) -> Self {
        Self {
            issuance_program,
            data,
        }
    }

    pub fn compute_asset_id(&self) -> AssetId {
        let id = HashWriter::tagged("assetid")
            .u64(self.issuance_program.vm_version)
            .bytes(&self.issuance_program.code)
            .bytes(&self.data)
            .finish();
        AssetId(id)
    }
}
