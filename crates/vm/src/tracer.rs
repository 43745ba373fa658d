//! Execution tracing.
//!
//! The VM never logs on its own; it reports each executed step to a
//! [`TraceSink`] supplied by the caller.

use crate::opcodes::spec;

/// A single trace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Nesting level; 0 for the top-level program.
    pub depth: usize,
    pub pc: u32,
    pub opcode: u8,
    pub gas_before: u64,
    pub gas_after: u64,
    pub stack_depth: usize,
    /// Top of the data stack after the step, if any.
    pub top: Option<Vec<u8>>,
}

impl TraceStep {
    pub fn name(&self) -> &'static str {
        spec(self.opcode).name
    }
}

/// Receives one call per executed instruction.
pub trait TraceSink {
    fn step(&mut self, step: &TraceStep);

    /// Sinks that ignore steps return false so the VM can skip building them.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn step(&mut self, _step: &TraceStep) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Records execution for debugging.
#[derive(Debug, Default)]
pub struct RecordingTrace {
    steps: Vec<TraceStep>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Render a human-readable trace, one line per step.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            let top = step
                .top
                .as_ref()
                .map(|t| format!("0x{}", hex::encode(&t[..t.len().min(16)])))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{:4}: {}PC={:04X} {:<14} gas={} depth={} top={}\n",
                i,
                "  ".repeat(step.depth),
                step.pc,
                step.name(),
                step.gas_after,
                step.stack_depth,
                top,
            ));
        }
        out
    }
}

impl TraceSink for RecordingTrace {
    fn step(&mut self, step: &TraceStep) {
        self.steps.push(step.clone());
    }
}

/// Forwards steps as `tracing` events at TRACE level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn step(&mut self, step: &TraceStep) {
        tracing::trace!(
            depth = step.depth,
            pc = step.pc,
            op = step.name(),
            gas = step.gas_after,
            stack = step.stack_depth,
            "vm step"
        );
    }
}
