//! Parse assembly tokens into statements.

use crate::lexer::{Lexer, Target, Token};
use thiserror::Error;
use voc_vm::opcodes::{by_name, OP_JUMP, OP_JUMPIF};

/// Parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid token at line {line}: '{text}'")]
    InvalidToken { text: String, line: usize },

    #[error("unknown opcode at line {line}: {name}")]
    UnknownOpcode { name: String, line: usize },

    #[error("jump opcode at line {line} needs a target, write {name}:$label")]
    MissingTarget { name: String, line: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// One line item of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Label definition; emits nothing.
    Label(String),
    /// A non-push opcode.
    Op(u8),
    /// Number, pushed with the shortest encoding.
    Int(i64),
    /// Raw bytes, pushed with the shortest encoding.
    Data(Vec<u8>),
    Jump { op: u8, target: Target },
}

/// A statement and the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub statement: Statement,
    pub line: usize,
}

pub struct Parser;

impl Parser {
    /// Parse a whole source text.
    pub fn parse(source: &str) -> Result<Vec<Located>> {
        Lexer::new(source)
            .map(|(token, line)| {
                let statement = match token {
                    Err(text) => return Err(ParseError::InvalidToken { text, line }),
                    Ok(token) => Self::statement(token, line)?,
                };
                Ok(Located { statement, line })
            })
            .collect()
    }

    fn statement(token: Token, line: usize) -> Result<Statement> {
        Ok(match token {
            Token::Label(name) => Statement::Label(name),
            Token::Number(n) => Statement::Int(n),
            Token::Data(bytes) | Token::Text(bytes) => Statement::Data(bytes),
            Token::Jump((conditional, target)) => Statement::Jump {
                op: if conditional { OP_JUMPIF } else { OP_JUMP },
                target,
            },
            Token::Word(name) => match by_name(&name) {
                Some(op) if op == OP_JUMP || op == OP_JUMPIF => {
                    return Err(ParseError::MissingTarget { name, line })
                }
                Some(op) => Statement::Op(op),
                None => return Err(ParseError::UnknownOpcode { name, line }),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_vm::opcodes::{OP_2DUP, OP_ADD, OP_CHECKSIG};

    fn statements(source: &str) -> Vec<Statement> {
        Parser::parse(source)
            .unwrap()
            .into_iter()
            .map(|l| l.statement)
            .collect()
    }

    #[test]
    fn test_opcode_spellings() {
        assert_eq!(
            statements("add OP_ADD Add op_2dup checksig"),
            vec![
                Statement::Op(OP_ADD),
                Statement::Op(OP_ADD),
                Statement::Op(OP_ADD),
                Statement::Op(OP_2DUP),
                Statement::Op(OP_CHECKSIG),
            ]
        );
    }

    #[test]
    fn test_pushes() {
        assert_eq!(
            statements("7 -300 0x0102 'ab'"),
            vec![
                Statement::Int(7),
                Statement::Int(-300),
                Statement::Data(vec![1, 2]),
                Statement::Data(b"ab".to_vec()),
            ]
        );
    }

    #[test]
    fn test_unknown_opcode_has_line() {
        assert_eq!(
            Parser::parse("DUP\nFROB"),
            Err(ParseError::UnknownOpcode {
                name: "FROB".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn test_bare_jump_rejected() {
        assert!(matches!(
            Parser::parse("JUMPIF"),
            Err(ParseError::MissingTarget { .. })
        ));
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(
            Parser::parse("1 # 2"),
            Err(ParseError::InvalidToken {
                text: "#".to_string(),
                line: 1
            })
        );
    }
}
