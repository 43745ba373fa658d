//! Numeric opcodes. All arithmetic is checked; overflow is a `RangeError`.

use crate::executor::{Vm, VmError};

fn unary(vm: &mut Vm<'_>, f: impl FnOnce(i64) -> Option<i64>) -> Result<(), VmError> {
    let x = vm.pop_int()?;
    let res = f(x).ok_or(VmError::RangeError)?;
    vm.push_int(res)
}

/// Pops `b` then `a` and pushes `f(a, b)`. Both operands are decoded before
/// either is removed.
fn binary(vm: &mut Vm<'_>, f: impl FnOnce(i64, i64) -> Result<i64, VmError>) -> Result<(), VmError> {
    let b = vm.peek_int(0)?;
    let a = vm.peek_int(1)?;
    let res = f(a, b)?;
    vm.pop()?;
    vm.pop()?;
    vm.push_int(res)
}

fn compare(vm: &mut Vm<'_>, f: impl FnOnce(i64, i64) -> bool) -> Result<(), VmError> {
    let b = vm.peek_int(0)?;
    let a = vm.peek_int(1)?;
    vm.pop()?;
    vm.pop()?;
    vm.push_bool(f(a, b))
}

fn checked(v: Option<i64>) -> Result<i64, VmError> {
    v.ok_or(VmError::RangeError)
}

pub(crate) fn op_1add(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, |x| x.checked_add(1))
}

pub(crate) fn op_1sub(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, |x| x.checked_sub(1))
}

pub(crate) fn op_2mul(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, |x| x.checked_mul(2))
}

pub(crate) fn op_2div(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, |x| Some(x >> 1))
}

pub(crate) fn op_negate(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, i64::checked_neg)
}

pub(crate) fn op_abs(vm: &mut Vm<'_>) -> Result<(), VmError> {
    unary(vm, i64::checked_abs)
}

pub(crate) fn op_not(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let x = vm.pop_int()?;
    vm.push_bool(x == 0)
}

pub(crate) fn op_0notequal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let x = vm.pop_int()?;
    vm.push_bool(x != 0)
}

pub(crate) fn op_add(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| checked(a.checked_add(b)))
}

pub(crate) fn op_sub(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| checked(a.checked_sub(b)))
}

pub(crate) fn op_mul(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| checked(a.checked_mul(b)))
}

/// Truncating division.
pub(crate) fn op_div(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| {
        if b == 0 {
            return Err(VmError::DivideByZero);
        }
        checked(a.checked_div(b))
    })
}

/// The remainder takes the sign of the divisor.
pub(crate) fn op_mod(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| {
        if b == 0 {
            return Err(VmError::DivideByZero);
        }
        let mut res = checked(a.checked_rem(b))?;
        if res != 0 && (res < 0) != (b < 0) {
            res += b;
        }
        Ok(res)
    })
}

pub(crate) fn op_lshift(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, n| {
        if n < 0 {
            return Err(VmError::BadValue);
        }
        if a == 0 {
            return Ok(0);
        }
        if n > 63 {
            return Err(VmError::RangeError);
        }
        let res = a << n;
        if res >> n != a {
            return Err(VmError::RangeError);
        }
        Ok(res)
    })
}

pub(crate) fn op_rshift(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, n| {
        if n < 0 {
            return Err(VmError::BadValue);
        }
        if n > 63 {
            return Ok(if a < 0 { -1 } else { 0 });
        }
        Ok(a >> n)
    })
}

pub(crate) fn op_booland(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a != 0 && b != 0)
}

pub(crate) fn op_boolor(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a != 0 || b != 0)
}

pub(crate) fn op_numequal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a == b)
}

pub(crate) fn op_numequal_verify(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.peek_int(0)?;
    let a = vm.peek_int(1)?;
    vm.pop()?;
    vm.pop()?;
    if a == b {
        Ok(())
    } else {
        Err(VmError::VerifyFailed)
    }
}

pub(crate) fn op_numnotequal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a != b)
}

pub(crate) fn op_lessthan(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a < b)
}

pub(crate) fn op_greaterthan(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a > b)
}

pub(crate) fn op_lessthanorequal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a <= b)
}

pub(crate) fn op_greaterthanorequal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    compare(vm, |a, b| a >= b)
}

pub(crate) fn op_min(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| Ok(a.min(b)))
}

pub(crate) fn op_max(vm: &mut Vm<'_>) -> Result<(), VmError> {
    binary(vm, |a, b| Ok(a.max(b)))
}

/// `x min max WITHIN` is true when `min <= x < max`.
pub(crate) fn op_within(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let max = vm.peek_int(0)?;
    let min = vm.peek_int(1)?;
    let x = vm.peek_int(2)?;
    vm.pop()?;
    vm.pop()?;
    vm.pop()?;
    vm.push_bool(min <= x && x < max)
}
