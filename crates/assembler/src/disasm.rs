//! Render program bytes as assembly text.

use thiserror::Error;
use voc_vm::opcodes::{spec, OP_0, OP_16, OP_1, OP_1NEGATE, OP_JUMP, OP_JUMPIF};
use voc_vm::{parse_op, VmError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisasmError {
    #[error("truncated instruction at offset {offset}: {source}")]
    Truncated { offset: u32, source: VmError },

    #[error("undefined opcode 0x{op:02x} at offset {offset}")]
    UndefinedOpcode { op: u8, offset: u32 },
}

/// Disassemble `code`, one instruction per line.
///
/// Canonically encoded programs reassemble to the same bytes. Pushes that
/// use a longer encoding than needed come back in the shortest form.
pub fn disassemble(code: &[u8]) -> Result<String, DisasmError> {
    let mut lines = Vec::new();
    let mut pc: u32 = 0;
    while (pc as usize) < code.len() {
        let inst = parse_op(code, pc).map_err(|source| DisasmError::Truncated { offset: pc, source })?;
        let op_spec = spec(inst.op);
        let text = match inst.op {
            OP_0 => "0".to_string(),
            OP_1NEGATE => "-1".to_string(),
            OP_1..=OP_16 => (inst.op - OP_1 + 1).to_string(),
            OP_JUMP | OP_JUMPIF => {
                let mut target = [0u8; 4];
                target.copy_from_slice(&inst.data);
                format!("{}:{}", op_spec.name, u32::from_le_bytes(target))
            }
            _ if op_spec.is_push() => format!("0x{}", hex::encode(&inst.data)),
            _ if op_spec.is_defined() => op_spec.name.to_string(),
            op => return Err(DisasmError::UndefinedOpcode { op, offset: pc }),
        };
        lines.push(text);
        pc += inst.len;
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_vm::opcodes::*;

    #[test]
    fn test_render() {
        let code = [OP_0, OP_1 + 4, OP_1NEGATE, 0x02, 0xab, 0xcd, OP_DUP, OP_JUMP, 9, 0, 0, 0];
        assert_eq!(
            disassemble(&code).unwrap(),
            "0\n5\n-1\n0xabcd\nDUP\nJUMP:9"
        );
    }

    #[test]
    fn test_undefined_opcode() {
        assert_eq!(
            disassemble(&[OP_DUP, 0xff]),
            Err(DisasmError::UndefinedOpcode { op: 0xff, offset: 1 })
        );
    }

    #[test]
    fn test_truncated_push() {
        assert!(matches!(
            disassemble(&[0x05, 1, 2]),
            Err(DisasmError::Truncated { offset: 0, .. })
        ));
    }
}
