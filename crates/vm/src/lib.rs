//! Metered stack virtual machine for vocchain control programs.
//!
//! This crate provides:
//! - The opcode table and instruction decoding
//! - Gas metering shared across nested predicate runs
//! - The execution loop and [`verify`], which checks a program against its
//!   arguments
//! - Witness program templates
//! - Pluggable signature verification, output checks and tracing

pub mod context;
pub mod executor;
pub mod gas;
pub mod instruction;
pub mod numeric;
pub mod opcodes;
mod ops;
pub mod segwit;
pub mod tracer;

// Re-export commonly used types at the crate root
pub use context::{Ed25519Verifier, ExecContext, OutputChecker, SignatureVerifier};
pub use executor::{verify, Halt, Status, Vm, VmError, MAX_PREDICATE_DEPTH};
pub use gas::{GasCosts, GasError, GasMeter};
pub use instruction::{parse_op, parse_program, push_data_bytes, push_int_bytes, Builder, Instruction};
pub use opcodes::{by_name, spec, OpSpec, OPS};
pub use tracer::{NoopTrace, RecordingTrace, TraceSink, TraceStep, TracingSink};
