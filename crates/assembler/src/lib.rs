//! Text assembler and disassembler for vocchain control programs.
//!
//! # Example
//!
//! ```
//! use voc_assembler::{assemble, disassemble};
//!
//! let source = r#"
//!     ; <x> 5 ADD 12 NUMEQUAL
//!     5 ADD
//!     12 NUMEQUAL
//! "#;
//!
//! let code = assemble(source).expect("failed to assemble");
//! assert_eq!(disassemble(&code).unwrap(), "5\nADD\n12\nNUMEQUAL");
//! ```
//!
//! # Syntax
//!
//! - Opcode names, in any case and with or without an `OP_` prefix
//! - Decimal numbers, pushed with the shortest encoding
//! - `0x` hex data and `'text'` strings
//! - `$name` defines a label; `JUMP:$name` and `JUMPIF:$name` jump to it
//! - `;` starts a comment
//!
//! # Pipeline
//!
//! 1. **Lexer** - Tokenizes the source
//! 2. **Parser** - Resolves opcode names into statements
//! 3. **Compiler** - Two passes: label offsets first, then bytes

pub mod compiler;
pub mod disasm;
pub mod lexer;
pub mod parser;

use thiserror::Error;

/// Assembler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("parse error: {0}")]
    Parse(#[from] parser::ParseError),

    #[error("compile error: {0}")]
    Compile(#[from] compiler::CompileError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;

/// Assemble source text into program bytes.
pub fn assemble(source: &str) -> Result<Vec<u8>> {
    let statements = parser::Parser::parse(source)?;
    Ok(compiler::Compiler::compile(&statements)?)
}

// Re-export commonly used types
pub use compiler::{CompileError, Compiler};
pub use disasm::{disassemble, DisasmError};
pub use lexer::{Lexer, Target, Token};
pub use parser::{Located, ParseError, Parser, Statement};
