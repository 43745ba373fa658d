//! Emit program bytes from parsed statements.
//!
//! Two-pass compilation:
//! 1. First pass: collect label offsets
//! 2. Second pass: emit bytes with resolved jump targets

use crate::lexer::Target;
use crate::parser::{Located, Statement};
use std::collections::HashMap;
use thiserror::Error;
use voc_vm::{push_data_bytes, push_int_bytes};

/// Compiler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("undefined label ${label} at line {line}")]
    UndefinedLabel { label: String, line: usize },

    #[error("duplicate label ${label} at line {line} (first defined at line {first_line})")]
    DuplicateLabel {
        label: String,
        line: usize,
        first_line: usize,
    },

    #[error("program exceeds the addressable size")]
    TooLong,
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Bytes a jump occupies: opcode plus a 4-byte little-endian target.
const JUMP_LEN: usize = 5;

pub struct Compiler {
    /// label name -> (offset, line)
    labels: HashMap<String, (u32, usize)>,
}

impl Compiler {
    /// Compile statements to program bytes.
    pub fn compile(statements: &[Located]) -> Result<Vec<u8>> {
        let mut compiler = Self {
            labels: HashMap::new(),
        };
        compiler.first_pass(statements)?;
        compiler.second_pass(statements)
    }

    fn first_pass(&mut self, statements: &[Located]) -> Result<()> {
        let mut offset: usize = 0;
        for Located { statement, line } in statements {
            if let Statement::Label(name) = statement {
                let at = u32::try_from(offset).map_err(|_| CompileError::TooLong)?;
                if let Some(&(_, first_line)) = self.labels.get(name) {
                    return Err(CompileError::DuplicateLabel {
                        label: name.clone(),
                        line: *line,
                        first_line,
                    });
                }
                self.labels.insert(name.clone(), (at, *line));
            }
            offset = offset
                .checked_add(encoded_len(statement))
                .ok_or(CompileError::TooLong)?;
        }
        u32::try_from(offset).map_err(|_| CompileError::TooLong)?;
        Ok(())
    }

    fn second_pass(&self, statements: &[Located]) -> Result<Vec<u8>> {
        let mut code = Vec::new();
        for Located { statement, line } in statements {
            match statement {
                Statement::Label(_) => {}
                Statement::Op(op) => code.push(*op),
                Statement::Int(n) => code.extend(push_int_bytes(*n)),
                Statement::Data(bytes) => code.extend(push_data_bytes(bytes)),
                Statement::Jump { op, target } => {
                    let to = match target {
                        Target::Offset(at) => *at,
                        Target::Label(label) => {
                            self.labels
                                .get(label)
                                .ok_or_else(|| CompileError::UndefinedLabel {
                                    label: label.clone(),
                                    line: *line,
                                })?
                                .0
                        }
                    };
                    code.push(*op);
                    code.extend_from_slice(&to.to_le_bytes());
                }
            }
        }
        Ok(code)
    }
}

fn encoded_len(statement: &Statement) -> usize {
    match statement {
        Statement::Label(_) => 0,
        Statement::Op(_) => 1,
        Statement::Int(n) => push_int_bytes(*n).len(),
        Statement::Data(bytes) => push_data_bytes(bytes).len(),
        Statement::Jump { .. } => JUMP_LEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use voc_vm::opcodes::*;

    fn compile(source: &str) -> Result<Vec<u8>> {
        Compiler::compile(&Parser::parse(source).unwrap())
    }

    #[test]
    fn test_minimal_int_pushes() {
        assert_eq!(compile("0").unwrap(), vec![OP_0]);
        assert_eq!(compile("-1").unwrap(), vec![OP_1NEGATE]);
        assert_eq!(compile("16").unwrap(), vec![OP_16]);
        assert_eq!(compile("17").unwrap(), vec![OP_DATA_1, 17]);
        assert_eq!(compile("1000").unwrap(), vec![0x02, 0xe8, 0x03]);
    }

    #[test]
    fn test_forward_and_backward_labels() {
        let code = compile("JUMP:$end $top 1 $end JUMPIF:$top").unwrap();
        // JUMP(5) OP_1(1) JUMPIF(5)
        assert_eq!(code.len(), 11);
        assert_eq!(code[0], OP_JUMP);
        assert_eq!(&code[1..5], &6u32.to_le_bytes());
        assert_eq!(code[6], OP_JUMPIF);
        assert_eq!(&code[7..11], &5u32.to_le_bytes());
    }

    #[test]
    fn test_numeric_target() {
        let code = compile("JUMP:7").unwrap();
        assert_eq!(code, vec![OP_JUMP, 7, 0, 0, 0]);
    }

    #[test]
    fn test_label_errors() {
        assert_eq!(
            compile("1\nJUMP:$nowhere"),
            Err(CompileError::UndefinedLabel {
                label: "nowhere".to_string(),
                line: 2
            })
        );
        assert_eq!(
            compile("$a\n$a"),
            Err(CompileError::DuplicateLabel {
                label: "a".to_string(),
                line: 2,
                first_line: 1
            })
        );
    }
}
