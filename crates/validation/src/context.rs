//! Per-call validation settings.

use std::sync::Arc;
use std::time::Instant;
use voc_core::ProtocolParams;
use voc_vm::{Ed25519Verifier, SignatureVerifier};

/// Where and how a transaction is being validated.
#[derive(Clone)]
pub struct ValidationContext {
    /// Height of the block the transaction is validated for.
    pub block_height: u64,
    /// Timestamp of that block, checked against the transaction's time range.
    pub block_time: u64,
    /// Position of the transaction within its block, when known. Only the
    /// first transaction of a block may be a coinbase.
    pub tx_position: Option<u64>,
    /// Reject native-asset spends and outputs that do not use a witness
    /// program template.
    pub require_standard: bool,
    /// Abandon validation past this instant.
    pub deadline: Option<Instant>,
    pub params: ProtocolParams,
    pub verifier: Arc<dyn SignatureVerifier>,
}

impl ValidationContext {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            block_height: 0,
            block_time: 0,
            tx_position: None,
            require_standard: false,
            deadline: None,
            params,
            verifier: Arc::new(Ed25519Verifier),
        }
    }

    pub fn at_block(mut self, height: u64, time: u64) -> Self {
        self.block_height = height;
        self.block_time = time;
        self
    }

    pub fn with_position(mut self, position: u64) -> Self {
        self.tx_position = Some(position);
        self
    }

    pub fn standard(mut self, require: bool) -> Self {
        self.require_standard = require;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(ProtocolParams::default())
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext")
            .field("block_height", &self.block_height)
            .field("block_time", &self.block_time)
            .field("tx_position", &self.tx_position)
            .field("require_standard", &self.require_standard)
            .field("deadline", &self.deadline)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
