//! Opcodes that read the transaction context.

use crate::executor::{Vm, VmError};
use crate::numeric::u64_to_int;
use voc_core::{AssetId, Hash};

/// `index amount assetid vmversion program CHECKOUTPUT`
pub(crate) fn op_check_output(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let checker = vm.ctx.output_checker.ok_or(VmError::WrongContext)?;

    let vm_version = vm.peek_int(1)?;
    let asset_id = Hash::from_slice(vm.peek(2)?)
        .map(AssetId)
        .ok_or(VmError::BadValue)?;
    let amount = vm.peek_int(3)?;
    let index = vm.peek_int(4)?;
    if index < 0 || amount < 0 || vm_version < 0 {
        return Err(VmError::BadValue);
    }
    let code = vm.pop()?;
    for _ in 0..4 {
        vm.pop()?;
    }

    let ok = checker.check_output(
        index as u64,
        amount as u64,
        &asset_id,
        vm_version as u64,
        &code,
    )?;
    vm.push_bool(ok)
}

pub(crate) fn op_asset(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let asset_id = vm.ctx.asset_id.ok_or(VmError::WrongContext)?;
    vm.push(asset_id.as_hash().as_bytes().to_vec())
}

pub(crate) fn op_amount(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let amount = vm.ctx.amount.ok_or(VmError::WrongContext)?;
    vm.push_int(u64_to_int(amount)?)
}

pub(crate) fn op_program(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let program = vm.ctx.program.to_vec();
    vm.push(program)
}

pub(crate) fn op_index(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let index = vm.ctx.dest_pos.ok_or(VmError::WrongContext)?;
    vm.push_int(u64_to_int(index)?)
}

pub(crate) fn op_entry_id(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let id = vm.ctx.entry_id;
    vm.push(id.as_bytes().to_vec())
}

pub(crate) fn op_output_id(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let id = vm.ctx.spent_output_id.ok_or(VmError::WrongContext)?;
    vm.push(id.as_bytes().to_vec())
}

pub(crate) fn op_block_height(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let height = vm.ctx.block_height;
    vm.push_int(u64_to_int(height)?)
}

pub(crate) fn op_block_time(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let time = vm.ctx.block_time;
    vm.push_int(u64_to_int(time)?)
}
