use crate::executor::{Halt, Vm, VmError, MAX_PREDICATE_DEPTH};
use crate::opcodes::OP_CHECKPREDICATE;

pub(crate) fn op_push_data(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let data = std::mem::take(&mut vm.data);
    vm.push(data)
}

pub(crate) fn op_nop(_vm: &mut Vm<'_>) -> Result<(), VmError> {
    Ok(())
}

fn jump_target(data: &[u8]) -> Result<u32, VmError> {
    let bytes: [u8; 4] = data
        .try_into()
        .map_err(|_| VmError::UnexpectedError("jump without target".into()))?;
    Ok(u32::from_le_bytes(bytes))
}

pub(crate) fn op_jump(vm: &mut Vm<'_>) -> Result<(), VmError> {
    vm.next_pc = jump_target(&vm.data)?;
    Ok(())
}

pub(crate) fn op_jumpif(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let target = jump_target(&vm.data)?;
    if vm.pop_bool()? {
        vm.next_pc = target;
    }
    Ok(())
}

pub(crate) fn op_verify(vm: &mut Vm<'_>) -> Result<(), VmError> {
    if vm.pop_bool()? {
        Ok(())
    } else {
        Err(VmError::VerifyFailed)
    }
}

pub(crate) fn op_fail(vm: &mut Vm<'_>) -> Result<(), VmError> {
    vm.returned = true;
    Ok(())
}

/// `n predicate limit CHECKPREDICATE`
///
/// Moves the top `n` items (all of them for -1) into a nested VM running
/// `predicate` and pushes whether it succeeded. A `limit` of 0 inherits the
/// caller's allowance. Exhausting the shared meter or the deadline aborts the
/// caller as well.
///
/// Nesting past the depth limit is a `DisallowedOpcode` failure of the
/// innermost child, so the caller only ever sees `false`, never the error.
pub(crate) fn op_check_predicate(vm: &mut Vm<'_>) -> Result<(), VmError> {
    if vm.depth >= MAX_PREDICATE_DEPTH {
        return Err(VmError::DisallowedOpcode(OP_CHECKPREDICATE));
    }
    let limit = vm.peek_int(0)?;
    let n = vm.peek_int(2)?;
    if limit < 0 {
        return Err(VmError::BadValue);
    }
    let count = match n {
        -1 => vm.data_stack.len() - 3,
        n if n >= 0 => usize::try_from(n).map_err(|_| VmError::RangeError)?,
        _ => return Err(VmError::BadValue),
    };
    vm.require_depth(count.checked_add(3).ok_or(VmError::DataStackUnderflow)?)?;

    vm.pop()?;
    let predicate = vm.pop()?;
    vm.pop()?;
    let items = vm.data_stack.split_off(vm.data_stack.len() - count);

    let child_limit = match (limit as u64, vm.local_limit) {
        (0, inherited) => inherited,
        (l, Some(inherited)) => Some(l.min(inherited)),
        (l, None) => Some(l),
    };
    let used_before = vm.meter.used();
    let outcome = vm.run_child(predicate, items, child_limit);
    let spent = vm.meter.used() - used_before;
    if let Some(own) = vm.local_limit.as_mut() {
        *own = own.saturating_sub(spent);
    }

    let ok = match outcome {
        Ok(halt) => halt == Halt::Success,
        Err(VmError::DeadlineExceeded) => return Err(VmError::DeadlineExceeded),
        Err(_) if vm.meter.is_exhausted() => return Err(VmError::RunLimitExceeded),
        Err(_) => false,
    };
    vm.push_bool(ok)
}

#[cfg(test)]
mod tests {
    use crate::context::ExecContext;
    use crate::executor::{Halt, Vm, VmError, MAX_PREDICATE_DEPTH};
    use crate::gas::GasMeter;
    use crate::instruction::Builder;
    use crate::opcodes::*;
    use crate::tracer::NoopTrace;

    fn run_with(code: Vec<u8>, limit: u64) -> (Result<Halt, VmError>, Vec<Vec<u8>>, GasMeter) {
        let mut meter = GasMeter::new(limit);
        let mut trace = NoopTrace;
        let ctx = ExecContext::bare(&[], 2);
        let mut vm = Vm::new(code, 1, ctx, &mut meter, &mut trace);
        let outcome = vm.run();
        let stack = vm.data_stack().to_vec();
        (outcome, stack, meter)
    }

    #[test]
    fn test_jumpif_skips_fail() {
        // 1 JUMPIF:end FAIL end: 1
        let mut code = Builder::new().int(1).jump(OP_JUMPIF, 0).op(OP_FAIL).build();
        let end = code.len() as u32;
        code[2..6].copy_from_slice(&end.to_le_bytes());
        code.push(OP_TRUE);

        let (outcome, stack, _) = run_with(code, 1_000);
        assert_eq!(outcome, Ok(Halt::Success));
        assert_eq!(stack, vec![vec![1]]);
    }

    #[test]
    fn test_verify_false_fails() {
        let (outcome, _, _) = run_with(vec![OP_0, OP_VERIFY, OP_TRUE], 1_000);
        assert_eq!(outcome, Err(VmError::VerifyFailed));
    }

    #[test]
    fn test_check_predicate_success_and_failure() {
        // 5 <predicate: 5 NUMEQUAL> over one item, inherit limit
        let ok = Builder::new()
            .int(5)
            .int(1)
            .data(&Builder::new().int(5).op(OP_NUMEQUAL).build())
            .int(0)
            .op(OP_CHECKPREDICATE)
            .build();
        let (outcome, stack, _) = run_with(ok, 10_000);
        assert_eq!(outcome, Ok(Halt::Success));
        assert_eq!(stack, vec![vec![1]]);

        let failing = Builder::new()
            .int(4)
            .int(1)
            .data(&Builder::new().int(5).op(OP_NUMEQUALVERIFY).op(OP_TRUE).build())
            .int(0)
            .op(OP_CHECKPREDICATE)
            .op(OP_NOT)
            .build();
        let (outcome, _, _) = run_with(failing, 10_000);
        assert_eq!(outcome, Ok(Halt::Success));
    }

    #[test]
    fn test_check_predicate_local_limit_pushes_false() {
        let looping = Builder::new().jump(OP_JUMP, 0).build();
        let code = Builder::new()
            .int(0)
            .data(&looping)
            .int(20)
            .op(OP_CHECKPREDICATE)
            .op(OP_NOT)
            .build();
        let (outcome, _, meter) = run_with(code, 10_000);
        assert_eq!(outcome, Ok(Halt::Success));
        assert!(!meter.is_exhausted());
    }

    #[test]
    fn test_check_predicate_shared_exhaustion_propagates() {
        let looping = Builder::new().jump(OP_JUMP, 0).build();
        let code = Builder::new()
            .int(0)
            .data(&looping)
            .int(0)
            .op(OP_CHECKPREDICATE)
            .build();
        let (outcome, _, meter) = run_with(code, 2_000);
        assert_eq!(outcome, Err(VmError::RunLimitExceeded));
        assert!(meter.is_exhausted());
    }

    #[test]
    fn test_check_predicate_underflow_does_not_mutate() {
        let code = Builder::new()
            .int(3)
            .data(&[OP_TRUE])
            .int(0)
            .op(OP_CHECKPREDICATE)
            .build();
        let (outcome, stack, _) = run_with(code, 10_000);
        assert_eq!(outcome, Err(VmError::DataStackUnderflow));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_check_predicate_depth_limit() {
        // One wrapper more than the nesting limit allows.
        let mut inner = vec![OP_TRUE];
        for _ in 0..=MAX_PREDICATE_DEPTH {
            inner = Builder::new()
                .int(0)
                .data(&inner)
                .int(0)
                .op(OP_CHECKPREDICATE)
                .build();
        }
        let (outcome, _, _) = run_with(inner, 1_000_000);
        assert_eq!(outcome, Ok(Halt::FalseResult));
    }
}
