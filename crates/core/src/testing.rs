//! Signing fixtures for tests and tooling.
//!
//! Only compiled with the `test-utils` feature; production nodes never hold
//! signing keys.

use crate::crypto::{PublicKey, Signature};
use crate::hash::{hash, Hash};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::fmt;

/// A keypair for signing test transactions.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Derive a deterministic keypair from a small seed.
    pub fn from_seed(seed: u64) -> Self {
        let secret = hash(&seed.to_le_bytes());
        Self::from_signing_key(SigningKey::from_bytes(secret.as_bytes()))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Sign a transaction sighash.
    pub fn sign_hash(&self, hash: &Hash) -> Signature {
        self.sign(hash.as_bytes())
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.as_bytes().to_vec()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}
