//! Instruction decoding and program building.

use crate::executor::VmError;
use crate::numeric::int_bytes;
use crate::opcodes::*;

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: u8,
    /// Encoded length, including the opcode byte.
    pub len: u32,
    /// Pushed bytes for push opcodes, the 4-byte target for jumps.
    pub data: Vec<u8>,
}

const MAX_PROGRAM_LEN: usize = i32::MAX as usize;

/// Decode the instruction at `pc`.
pub fn parse_op(prog: &[u8], pc: u32) -> Result<Instruction, VmError> {
    let pc = pc as usize;
    let op = *prog.get(pc).ok_or(VmError::ShortProgram)?;
    let imm = |start: usize, len: usize| -> Result<Vec<u8>, VmError> {
        let end = start.checked_add(len).ok_or(VmError::ShortProgram)?;
        prog.get(start..end)
            .map(<[u8]>::to_vec)
            .ok_or(VmError::ShortProgram)
    };

    let (prefix, data) = match op {
        OP_DATA_1..=OP_DATA_75 => (1, imm(pc + 1, op as usize)?),
        OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
            let width = match op {
                OP_PUSHDATA1 => 1,
                OP_PUSHDATA2 => 2,
                _ => 4,
            };
            let raw = imm(pc + 1, width)?;
            let mut buf = [0u8; 4];
            buf[..width].copy_from_slice(&raw);
            let n = u32::from_le_bytes(buf) as usize;
            if n > MAX_PROGRAM_LEN {
                return Err(VmError::LongProgram);
            }
            (1 + width, imm(pc + 1 + width, n)?)
        }
        OP_JUMP | OP_JUMPIF => (1, imm(pc + 1, 4)?),
        OP_1NEGATE => return Ok(Instruction { op, len: 1, data: int_bytes(-1) }),
        OP_1..=OP_16 => return Ok(Instruction { op, len: 1, data: vec![op - OP_1 + 1] }),
        _ => return Ok(Instruction { op, len: 1, data: Vec::new() }),
    };

    let len = u32::try_from(prefix + data.len()).map_err(|_| VmError::LongProgram)?;
    Ok(Instruction { op, len, data })
}

/// Decode a whole program.
pub fn parse_program(prog: &[u8]) -> Result<Vec<Instruction>, VmError> {
    if prog.len() > MAX_PROGRAM_LEN {
        return Err(VmError::LongProgram);
    }
    let mut out = Vec::new();
    let mut pc = 0u32;
    while (pc as usize) < prog.len() {
        let inst = parse_op(prog, pc)?;
        pc += inst.len;
        out.push(inst);
    }
    Ok(out)
}

/// The shortest encoding that pushes `data`.
pub fn push_data_bytes(data: &[u8]) -> Vec<u8> {
    let n = data.len();
    let mut out = Vec::with_capacity(n + 5);
    if n == 0 {
        out.push(OP_0);
        return out;
    }
    if n == 1 && (1..=16).contains(&data[0]) {
        out.push(OP_1 + data[0] - 1);
        return out;
    }
    if n <= OP_DATA_75 as usize {
        out.push(n as u8);
    } else if n <= u8::MAX as usize {
        out.push(OP_PUSHDATA1);
        out.push(n as u8);
    } else if n <= u16::MAX as usize {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

/// The shortest encoding that pushes the number `n`.
pub fn push_int_bytes(n: i64) -> Vec<u8> {
    match n {
        0 => vec![OP_0],
        -1 => vec![OP_1NEGATE],
        1..=16 => vec![OP_1 + n as u8 - 1],
        _ => push_data_bytes(&int_bytes(n)),
    }
}

/// Incremental program builder.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    code: Vec<u8>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, op: u8) -> Self {
        self.code.push(op);
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.code.extend(push_data_bytes(data));
        self
    }

    pub fn int(mut self, n: i64) -> Self {
        self.code.extend(push_int_bytes(n));
        self
    }

    /// Append `JUMP` or `JUMPIF` with an absolute target.
    pub fn jump(mut self, op: u8, target: u32) -> Self {
        self.code.push(op);
        self.code.extend_from_slice(&target.to_le_bytes());
        self
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_small_ints_and_data() {
        let prog = Builder::new().int(5).data(b"abc").int(-1).op(OP_DUP).build();
        let insts = parse_program(&prog).unwrap();
        assert_eq!(insts.len(), 4);
        assert_eq!(insts[0].data, vec![5]);
        assert_eq!(insts[1].data, b"abc".to_vec());
        assert_eq!(insts[1].len, 4);
        assert_eq!(insts[2].data, int_bytes(-1));
        assert_eq!(insts[3].op, OP_DUP);
    }

    #[test]
    fn test_pushdata_widths() {
        for n in [76usize, 255, 256, 70_000] {
            let data = vec![7u8; n];
            let prog = push_data_bytes(&data);
            let inst = parse_op(&prog, 0).unwrap();
            assert_eq!(inst.data, data);
            assert_eq!(inst.len as usize, prog.len());
        }
    }

    #[test]
    fn test_truncated_immediates() {
        assert_eq!(parse_op(&[0x05, 1, 2], 0), Err(VmError::ShortProgram));
        assert_eq!(parse_op(&[OP_PUSHDATA2, 0x01], 0), Err(VmError::ShortProgram));
        assert_eq!(parse_op(&[OP_JUMP, 0, 0], 0), Err(VmError::ShortProgram));
        assert_eq!(parse_op(&[], 0), Err(VmError::ShortProgram));
    }

    #[test]
    fn test_oversized_pushdata4_is_long_program() {
        let prog = [OP_PUSHDATA4, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(parse_op(&prog, 0), Err(VmError::LongProgram));
    }

    #[test]
    fn test_jump_immediate() {
        let prog = Builder::new().jump(OP_JUMPIF, 0x0102).build();
        let inst = parse_op(&prog, 0).unwrap();
        assert_eq!(inst.len, 5);
        assert_eq!(inst.data, vec![0x02, 0x01, 0, 0]);
    }
}
