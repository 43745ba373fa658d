//! Canonical byte layout for content hashing.
//!
//! Identities are hashed over this layout instead of the wire encoding so that
//! they stay stable across serializer versions.

use crate::hash::Hash;

/// Streams fields into a Blake3 hasher in canonical form: integers as 8-byte
/// little endian, byte strings length-prefixed, hashes raw.
pub struct HashWriter {
    hasher: blake3::Hasher,
}

impl HashWriter {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    /// Start a writer whose output is bound to a domain tag.
    pub fn tagged(tag: &str) -> Self {
        let mut w = Self::new();
        w.hasher.update(tag.as_bytes());
        w.hasher.update(b":");
        w
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.u64(data.len() as u64);
        self.hasher.update(data);
        self
    }

    pub fn hash(&mut self, h: &Hash) -> &mut Self {
        self.hasher.update(h.as_bytes());
        self
    }

    pub fn finish(&self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_separates_fields() {
        let a = HashWriter::new().bytes(b"ab").bytes(b"c").finish();
        let b = HashWriter::new().bytes(b"a").bytes(b"bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tag_separates_domains() {
        let a = HashWriter::tagged("output").u64(1).finish();
        let b = HashWriter::tagged("spend").u64(1).finish();
        assert_ne!(a, b);
    }
}
