//! Blake3 hashing utilities.
//!
//! Every identity in the ledger (entries, assets, outputs, transactions) is a
//! 32-byte Blake3 digest wrapped in [`Hash`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Build a hash from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: H256 = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

/// Hash multiple pieces of data by concatenating them.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// The 20-byte short hash used for public key commitments: the first 20
/// bytes of the Blake3 digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let full = hash(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&full.0[..20]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash(b"hello world"), hash(b"hello world"));
        assert_ne!(hash(b"hello"), hash(b"world"));
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(b"test data");
        assert_eq!(Hash::from_hex(&h.to_hex()).unwrap(), h);
        assert_eq!(Hash::from_hex(&format!("{}", h)).unwrap(), h);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(Hash::from_slice(&[0u8; 31]).is_none());
        assert!(Hash::from_slice(&[0u8; 33]).is_none());
        assert_eq!(Hash::from_slice(&[7u8; 32]), Some(Hash([7u8; 32])));
    }

    #[test]
    fn test_hash_concat() {
        assert_eq!(hash_concat(&[b"hello", b"world"]), hash(b"helloworld"));
    }

    #[test]
    fn test_hash160_is_prefix() {
        let short = hash160(b"pubkey");
        assert_eq!(&short[..], &hash(b"pubkey").0[..20]);
    }
}
