//! Core ledger primitives for the vocchain validation engine.
//!
//! This crate provides the types shared by the VM and the validator:
//! - Hashing and the Ed25519 verification primitive
//! - Assets, amounts and versioned programs
//! - Protocol parameters
//! - Wire transactions and the entry graph they map to

pub mod asset;
pub mod crypto;
pub mod encoding;
pub mod entry;
pub mod graph;
pub mod hash;
pub mod params;
pub mod program;
pub mod transaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types at the crate root
pub use asset::{AssetAmount, AssetDefinition, AssetId};
pub use crypto::{verify_ed25519, CryptoError, PublicKey, Signature};
pub use encoding::HashWriter;
pub use entry::{
    output_id, Coinbase, Entry, EntryId, EntryIndex, EntryKind, Issuance, Mux, Output, Retirement,
    Spend, ValueDestination, ValueSource,
};
pub use graph::{EntryGraph, GraphBuilder, GraphError, TxHeader};
pub use hash::{hash, hash160, hash_concat, Hash, H256};
pub use params::ProtocolParams;
pub use program::{Program, OP_FAIL_BYTE, VM_VERSION_1};
pub use transaction::{
    CoinbaseInput, IssuanceInput, SpendInput, TimeRange, Transaction, TxData, TxInput, TxOutput,
};
