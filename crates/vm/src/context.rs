//! What a running program may observe about the entry it guards.

use crate::executor::VmError;
use voc_core::{verify_ed25519, AssetId, Hash};

/// Verifies signatures for `CHECKSIG` and `CHECKMULTISIG`.
pub trait SignatureVerifier: Send + Sync {
    /// Whether `signature` is valid for `message` under `public_key`.
    /// Malformed keys or signatures simply fail.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

/// The default verifier: Ed25519.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        verify_ed25519(public_key, message, signature).is_ok()
    }
}

/// Answers `CHECKOUTPUT`: does destination `index` of the guarded entry's mux
/// lead to an output with this value and program?
pub trait OutputChecker {
    fn check_output(
        &self,
        index: u64,
        amount: u64,
        asset_id: &AssetId,
        vm_version: u64,
        code: &[u8],
    ) -> Result<bool, VmError>;
}

/// Execution context for one program run.
///
/// Optional fields are only present for entries that have them; opcodes that
/// read a missing field fail with [`VmError::WrongContext`].
#[derive(Clone, Copy)]
pub struct ExecContext<'a> {
    /// Highest VM version the node accepts.
    pub max_vm_version: u64,
    pub block_height: u64,
    pub block_time: u64,

    pub tx_id: Hash,
    pub entry_id: Hash,
    /// `hash(entry_id ‖ tx_id)`.
    pub tx_sig_hash: Hash,
    /// The code being guarded, as it appears in the entry.
    pub program: &'a [u8],

    pub asset_id: Option<AssetId>,
    pub amount: Option<u64>,
    /// Position of the entry's destination within its mux.
    pub dest_pos: Option<u64>,
    /// Set for spends only.
    pub spent_output_id: Option<Hash>,

    pub output_checker: Option<&'a dyn OutputChecker>,
    pub verifier: &'a dyn SignatureVerifier,
}

impl<'a> ExecContext<'a> {
    /// A context with no entry-specific fields, for running bare programs.
    pub fn bare(program: &'a [u8], max_vm_version: u64) -> Self {
        Self {
            max_vm_version,
            block_height: 0,
            block_time: 0,
            tx_id: Hash::ZERO,
            entry_id: Hash::ZERO,
            tx_sig_hash: Hash::ZERO,
            program,
            asset_id: None,
            amount: None,
            dest_pos: None,
            spent_output_id: None,
            output_checker: None,
            verifier: &Ed25519Verifier,
        }
    }
}

impl std::fmt::Debug for ExecContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("entry_id", &self.entry_id)
            .field("tx_id", &self.tx_id)
            .field("asset_id", &self.asset_id)
            .field("amount", &self.amount)
            .field("dest_pos", &self.dest_pos)
            .field("spent_output_id", &self.spent_output_id)
            .finish_non_exhaustive()
    }
}
