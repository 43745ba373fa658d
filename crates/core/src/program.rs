//! Versioned bytecode attached to outputs, issuances and muxes.

use serde::{Deserialize, Serialize};

/// The first VM version; all canonical programs use it.
pub const VM_VERSION_1: u64 = 1;

/// Opcode byte that marks an output as a retirement when it leads the program.
pub const OP_FAIL_BYTE: u8 = 0x6a;

/// Bytecode plus the VM version whose semantics apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Program {
    pub vm_version: u64,
    pub code: Vec<u8>,
}

impl Program {
    pub fn new(vm_version: u64, code: Vec<u8>) -> Self {
        Self { vm_version, code }
    }

    /// A version-1 program.
    pub fn v1(code: Vec<u8>) -> Self {
        Self::new(VM_VERSION_1, code)
    }

    /// Whether value sent to this program is destroyed.
    pub fn is_retirement(&self) -> bool {
        self.code.first() == Some(&OP_FAIL_BYTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retirement_detection() {
        assert!(Program::v1(vec![OP_FAIL_BYTE, 0x01, 0xaa]).is_retirement());
        assert!(!Program::v1(vec![0x51]).is_retirement());
        assert!(!Program::v1(vec![]).is_retirement());
    }
}
