//! Transaction validation for the vocchain ledger.
//!
//! This crate decides whether a transaction may be applied to a state:
//! - Structural and policy checks (version, size, time range, coinbase rules)
//! - Reference and per-asset balance checks over the entry graph
//! - Program execution through `voc-vm`, under one shared gas meter
//! - Parallel validation of independent transactions

pub mod batch;
pub mod context;
pub mod error;
pub mod state;
pub mod validator;
pub mod verdict;

// Re-export commonly used types at the crate root
pub use batch::{validate_batch, validate_bytes};
pub use context::ValidationContext;
pub use error::{Category, ErrorKind, Result, ValidationError};
pub use state::{MemoryState, StateView};
pub use validator::{validate, validate_graph, validate_with_trace};
pub use verdict::{Rejection, Verdict};
