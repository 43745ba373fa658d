//! Stack manipulation. Moves are free; copies pay for the memory they push.

use crate::executor::{Vm, VmError};
use crate::numeric::as_bool;

pub(crate) fn op_to_alt_stack(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let item = vm.pop()?;
    vm.alt_stack.push(item);
    Ok(())
}

pub(crate) fn op_from_alt_stack(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let item = vm.alt_stack.pop().ok_or(VmError::AltStackUnderflow)?;
    vm.data_stack.push(item);
    Ok(())
}

pub(crate) fn op_2drop(vm: &mut Vm<'_>) -> Result<(), VmError> {
    vm.pop()?;
    vm.pop()?;
    Ok(())
}

/// Copy the `count` items starting `offset` places below the top.
fn copy_items(vm: &mut Vm<'_>, offset: usize, count: usize) -> Result<(), VmError> {
    vm.require_depth(offset + count)?;
    let start = vm.data_stack.len() - offset - count;
    let items: Vec<Vec<u8>> = vm.data_stack[start..start + count].to_vec();
    for item in items {
        vm.push(item)?;
    }
    Ok(())
}

pub(crate) fn op_2dup(vm: &mut Vm<'_>) -> Result<(), VmError> {
    copy_items(vm, 0, 2)
}

pub(crate) fn op_3dup(vm: &mut Vm<'_>) -> Result<(), VmError> {
    copy_items(vm, 0, 3)
}

pub(crate) fn op_2over(vm: &mut Vm<'_>) -> Result<(), VmError> {
    copy_items(vm, 2, 2)
}

pub(crate) fn op_2rot(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.data_stack.len();
    let moved: Vec<Vec<u8>> = vm.data_stack.drain(len - 6..len - 4).collect();
    vm.data_stack.extend(moved);
    Ok(())
}

pub(crate) fn op_2swap(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.data_stack.len();
    vm.data_stack[len - 4..].rotate_left(2);
    Ok(())
}

pub(crate) fn op_ifdup(vm: &mut Vm<'_>) -> Result<(), VmError> {
    if as_bool(vm.peek(0)?) {
        copy_items(vm, 0, 1)?;
    }
    Ok(())
}

pub(crate) fn op_depth(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let depth = i64::try_from(vm.data_stack.len()).map_err(|_| VmError::RangeError)?;
    vm.push_int(depth)
}

pub(crate) fn op_drop(vm: &mut Vm<'_>) -> Result<(), VmError> {
    vm.pop()?;
    Ok(())
}

pub(crate) fn op_dup(vm: &mut Vm<'_>) -> Result<(), VmError> {
    copy_items(vm, 0, 1)
}

pub(crate) fn op_nip(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.data_stack.len();
    vm.data_stack.remove(len - 2);
    Ok(())
}

pub(crate) fn op_over(vm: &mut Vm<'_>) -> Result<(), VmError> {
    copy_items(vm, 1, 1)
}

/// Read the index operand of `PICK`/`ROLL` and check the stack is deep
/// enough, without popping anything yet.
fn index_operand(vm: &Vm<'_>) -> Result<usize, VmError> {
    let n = vm.peek_int(0)?;
    if n < 0 {
        return Err(VmError::BadValue);
    }
    let n = usize::try_from(n).map_err(|_| VmError::RangeError)?;
    vm.require_depth(n.checked_add(2).ok_or(VmError::DataStackUnderflow)?)?;
    Ok(n)
}

pub(crate) fn op_pick(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let n = index_operand(vm)?;
    vm.pop()?;
    copy_items(vm, n, 1)
}

pub(crate) fn op_roll(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let n = index_operand(vm)?;
    vm.pop()?;
    let len = vm.data_stack.len();
    let item = vm.data_stack.remove(len - 1 - n);
    vm.data_stack.push(item);
    Ok(())
}

pub(crate) fn op_rot(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.data_stack.len();
    vm.data_stack[len - 3..].rotate_left(1);
    Ok(())
}

pub(crate) fn op_swap(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.data_stack.len();
    vm.data_stack.swap(len - 1, len - 2);
    Ok(())
}

pub(crate) fn op_tuck(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let top = vm.peek(0)?.to_vec();
    let cost = crate::gas::GasCosts::PUSH_OVERHEAD + top.len() as u64;
    vm.charge(cost)?;
    let len = vm.data_stack.len();
    vm.data_stack.insert(len - 2, top);
    Ok(())
}
