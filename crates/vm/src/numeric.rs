//! Stack item interpretation: numbers and booleans.
//!
//! Numbers are two's complement i64, little endian, with trailing zero bytes
//! trimmed. Zero is the empty string.

use crate::executor::VmError;

/// Encode `n` in its minimal form.
pub fn int_bytes(n: i64) -> Vec<u8> {
    let mut bytes = n.to_le_bytes().to_vec();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes
}

/// Decode a stack item as a number. Items longer than eight bytes are
/// rejected; shorter ones are zero-extended.
pub fn as_int(bytes: &[u8]) -> Result<i64, VmError> {
    if bytes.len() > 8 {
        return Err(VmError::BadValue);
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(i64::from_le_bytes(buf))
}

/// An item is false iff every byte is zero (including the empty item).
pub fn as_bool(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| *b != 0)
}

pub fn bool_bytes(b: bool) -> Vec<u8> {
    if b {
        vec![1]
    } else {
        Vec::new()
    }
}

/// Convert a ledger quantity to a VM number.
pub fn u64_to_int(n: u64) -> Result<i64, VmError> {
    i64::try_from(n).map_err(|_| VmError::RangeError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_minimal_encoding() {
        assert_eq!(int_bytes(0), Vec::<u8>::new());
        assert_eq!(int_bytes(1), vec![1]);
        assert_eq!(int_bytes(256), vec![0, 1]);
        assert_eq!(int_bytes(-1), vec![0xff; 8]);
    }

    #[test]
    fn test_as_int_rejects_long_items() {
        assert_eq!(as_int(&[0u8; 9]), Err(VmError::BadValue));
        assert_eq!(as_int(&[]), Ok(0));
        assert_eq!(as_int(&[0x05, 0x00, 0x00]), Ok(5));
    }

    #[test]
    fn test_bool_semantics() {
        assert!(!as_bool(&[]));
        assert!(!as_bool(&[0, 0, 0]));
        assert!(as_bool(&[0, 0, 1]));
        assert_eq!(bool_bytes(false), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn prop_int_encoding_is_canonical(n in any::<i64>()) {
            let bytes = int_bytes(n);
            prop_assert!(bytes.len() <= 8);
            prop_assert_ne!(bytes.last(), Some(&0));
            prop_assert_eq!(as_int(&bytes), Ok(n));
            prop_assert_eq!(as_bool(&bytes), n != 0);
        }
    }
}
