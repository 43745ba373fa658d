//! VM execution loop.

use crate::context::ExecContext;
use crate::gas::{GasCosts, GasError, GasMeter};
use crate::instruction::parse_op;
use crate::numeric::{as_bool, as_int, bool_bytes, int_bytes};
use crate::opcodes::spec;
use crate::segwit;
use crate::tracer::{TraceSink, TraceStep};
use thiserror::Error;
use voc_core::Program;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("Alt stack underflow")]
    AltStackUnderflow,

    #[error("Bad value")]
    BadValue,

    #[error("Opcode not valid in this context")]
    WrongContext,

    #[error("Data stack underflow")]
    DataStackUnderflow,

    #[error("Disallowed opcode: 0x{0:02X}")]
    DisallowedOpcode(u8),

    #[error("Division by zero")]
    DivideByZero,

    #[error("Program ended with a false result")]
    FalseResult,

    #[error("Program too long")]
    LongProgram,

    #[error("Range error")]
    RangeError,

    #[error("FAIL executed")]
    ReturnExecuted,

    #[error("Run limit exceeded")]
    RunLimitExceeded,

    #[error("Unexpected end of program")]
    ShortProgram,

    #[error("Unrecognized opcode: 0x{0:02X}")]
    UnrecognizedToken(u8),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Unsupported VM version: {0}")]
    UnsupportedVersion(u64),

    #[error("Verification failed")]
    VerifyFailed,

    #[error("Validation deadline exceeded")]
    DeadlineExceeded,
}

impl From<GasError> for VmError {
    fn from(err: GasError) -> Self {
        match err {
            GasError::RunLimitExceeded { .. } => VmError::RunLimitExceeded,
            GasError::DeadlineExceeded => VmError::DeadlineExceeded,
            other => VmError::UnexpectedError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VmError>;

/// How far `CHECKPREDICATE` may nest.
pub const MAX_PREDICATE_DEPTH: usize = 16;

/// How a program stopped without aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Ran off the end with a true value on top.
    Success,
    /// Executed `FAIL`.
    Returned,
    /// Ran off the end with an empty stack or a false top.
    FalseResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted(Halt),
    Aborted(VmError),
}

/// The virtual machine state.
pub struct Vm<'a> {
    pub(crate) program: Vec<u8>,
    pub(crate) vm_version: u64,
    pub(crate) pc: u32,
    pub(crate) next_pc: u32,
    /// Immediate data of the instruction being executed.
    pub(crate) data: Vec<u8>,
    pub(crate) data_stack: Vec<Vec<u8>>,
    pub(crate) alt_stack: Vec<Vec<u8>>,
    pub(crate) depth: usize,
    /// Allowance left under an enclosing `CHECKPREDICATE` limit.
    pub(crate) local_limit: Option<u64>,
    pub(crate) returned: bool,
    status: Status,

    pub(crate) meter: &'a mut GasMeter,
    pub(crate) ctx: ExecContext<'a>,
    pub(crate) trace: &'a mut dyn TraceSink,
}

impl<'a> Vm<'a> {
    /// Create a VM for `program`. The program is run as-is; use [`verify`]
    /// for version checks and witness program expansion.
    pub fn new(
        program: Vec<u8>,
        vm_version: u64,
        ctx: ExecContext<'a>,
        meter: &'a mut GasMeter,
        trace: &'a mut dyn TraceSink,
    ) -> Self {
        Self {
            program,
            vm_version,
            pc: 0,
            next_pc: 0,
            data: Vec::new(),
            data_stack: Vec::new(),
            alt_stack: Vec::new(),
            depth: 0,
            local_limit: None,
            returned: false,
            status: Status::Running,
            meter,
            ctx,
            trace,
        }
    }

    /// Run until the program halts, aborts, or runs out of gas.
    pub fn run(&mut self) -> Result<Halt> {
        let outcome = self.run_to_end();
        self.status = match &outcome {
            Ok(halt) => Status::Halted(*halt),
            Err(err) => Status::Aborted(err.clone()),
        };
        outcome
    }

    fn run_to_end(&mut self) -> Result<Halt> {
        while (self.pc as usize) < self.program.len() {
            if let Some(halt) = self.step()? {
                return Ok(halt);
            }
        }
        match self.data_stack.last() {
            Some(top) if as_bool(top) => Ok(Halt::Success),
            _ => Ok(Halt::FalseResult),
        }
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<Option<Halt>> {
        // Fetch
        let inst = parse_op(&self.program, self.pc)?;
        let op = spec(inst.op);
        let exec = op.exec.ok_or(VmError::UnrecognizedToken(inst.op))?;
        if op.since_version > self.vm_version {
            return Err(VmError::DisallowedOpcode(inst.op));
        }

        let gas_before = self.meter.remaining();
        self.charge(op.base_cost)?;
        if self.data_stack.len() < op.min_depth {
            return Err(VmError::DataStackUnderflow);
        }

        // Execute
        self.next_pc = self
            .pc
            .checked_add(inst.len)
            .ok_or(VmError::LongProgram)?;
        self.data = inst.data;
        exec(self)?;

        if self.trace.enabled() {
            let step = TraceStep {
                depth: self.depth,
                pc: self.pc,
                opcode: inst.op,
                gas_before,
                gas_after: self.meter.remaining(),
                stack_depth: self.data_stack.len(),
                top: self.data_stack.last().cloned(),
            };
            self.trace.step(&step);
        }

        if self.returned {
            return Ok(Some(Halt::Returned));
        }
        self.pc = self.next_pc;
        Ok(None)
    }

    /// Charge gas against the shared meter and any local limit.
    pub(crate) fn charge(&mut self, amount: u64) -> Result<()> {
        if let Some(limit) = self.local_limit {
            if amount > limit {
                return Err(VmError::RunLimitExceeded);
            }
        }
        self.meter.charge(amount)?;
        if let Some(limit) = self.local_limit.as_mut() {
            *limit -= amount;
        }
        Ok(())
    }

    /// Push an item, paying for its memory.
    pub fn push(&mut self, item: Vec<u8>) -> Result<()> {
        let cost = GasCosts::PUSH_OVERHEAD
            .checked_add(item.len() as u64)
            .ok_or(VmError::RangeError)?;
        self.charge(cost)?;
        self.data_stack.push(item);
        Ok(())
    }

    pub(crate) fn push_int(&mut self, n: i64) -> Result<()> {
        self.push(int_bytes(n))
    }

    pub(crate) fn push_bool(&mut self, b: bool) -> Result<()> {
        self.push(bool_bytes(b))
    }

    pub(crate) fn pop(&mut self) -> Result<Vec<u8>> {
        self.data_stack.pop().ok_or(VmError::DataStackUnderflow)
    }

    pub(crate) fn pop_int(&mut self) -> Result<i64> {
        as_int(&self.pop()?)
    }

    pub(crate) fn pop_bool(&mut self) -> Result<bool> {
        Ok(as_bool(&self.pop()?))
    }

    /// The item `n` places below the top, without removing it.
    pub(crate) fn peek(&self, n: usize) -> Result<&[u8]> {
        let len = self.data_stack.len();
        if n >= len {
            return Err(VmError::DataStackUnderflow);
        }
        Ok(&self.data_stack[len - 1 - n])
    }

    pub(crate) fn peek_int(&self, n: usize) -> Result<i64> {
        as_int(self.peek(n)?)
    }

    pub(crate) fn require_depth(&self, n: usize) -> Result<()> {
        if self.data_stack.len() < n {
            return Err(VmError::DataStackUnderflow);
        }
        Ok(())
    }

    /// Run `predicate` in a nested VM over `items`, sharing this VM's meter.
    pub(crate) fn run_child(
        &mut self,
        predicate: Vec<u8>,
        items: Vec<Vec<u8>>,
        local_limit: Option<u64>,
    ) -> Result<Halt> {
        let mut child = Vm {
            program: predicate,
            vm_version: self.vm_version,
            pc: 0,
            next_pc: 0,
            data: Vec::new(),
            data_stack: items,
            alt_stack: Vec::new(),
            depth: self.depth + 1,
            local_limit,
            returned: false,
            status: Status::Running,
            meter: &mut *self.meter,
            ctx: self.ctx,
            trace: &mut *self.trace,
        };
        child.run()
    }

    pub fn data_stack(&self) -> &[Vec<u8>] {
        &self.data_stack
    }

    pub fn alt_stack(&self) -> &[Vec<u8>] {
        &self.alt_stack
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Remaining gas on the shared meter.
    pub fn gas_remaining(&self) -> u64 {
        self.meter.remaining()
    }
}

/// Check that `args` satisfy `program`.
///
/// Programs with an unsupported version are rejected before anything runs.
/// Witness programs are expanded to their full form first. Halting through
/// `FAIL` is clean for the VM but never authorises anything, so it is
/// reported as [`VmError::ReturnExecuted`].
pub fn verify(
    program: &Program,
    args: &[Vec<u8>],
    ctx: &ExecContext<'_>,
    meter: &mut GasMeter,
    trace: &mut dyn TraceSink,
) -> Result<()> {
    if program.vm_version == 0 || program.vm_version > ctx.max_vm_version {
        return Err(VmError::UnsupportedVersion(program.vm_version));
    }
    if program.code.len() > i32::MAX as usize {
        return Err(VmError::LongProgram);
    }
    let code = segwit::expand(&program.code).unwrap_or_else(|| program.code.clone());

    let mut vm = Vm::new(code, program.vm_version, *ctx, meter, trace);
    for arg in args {
        vm.push(arg.clone())?;
    }
    match vm.run()? {
        Halt::Success => Ok(()),
        Halt::Returned => Err(VmError::ReturnExecuted),
        Halt::FalseResult => Err(VmError::FalseResult),
    }
}
