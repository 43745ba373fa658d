use crate::executor::{Vm, VmError};

pub(crate) fn op_invert(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let mut item = vm.pop()?;
    for b in item.iter_mut() {
        *b = !*b;
    }
    vm.push(item)
}

pub(crate) fn op_and(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    let out = a.iter().zip(b.iter()).map(|(x, y)| x & y).collect();
    vm.push(out)
}

/// Combine two items byte by byte, zero-padding the shorter one.
fn zip_padded(a: &[u8], b: &[u8], f: impl Fn(u8, u8) -> u8) -> Vec<u8> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            f(x, y)
        })
        .collect()
}

pub(crate) fn op_or(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(zip_padded(&a, &b, |x, y| x | y))
}

pub(crate) fn op_xor(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(zip_padded(&a, &b, |x, y| x ^ y))
}

pub(crate) fn op_equal(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push_bool(a == b)
}

pub(crate) fn op_equal_verify(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let a = vm.pop()?;
    if a == b {
        Ok(())
    } else {
        Err(VmError::VerifyFailed)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::ExecContext;
    use crate::executor::{Vm, VmError};
    use crate::gas::GasMeter;
    use crate::instruction::Builder;
    use crate::opcodes::*;
    use crate::tracer::NoopTrace;

    fn top(code: Vec<u8>) -> Result<Vec<u8>, VmError> {
        let mut meter = GasMeter::new(10_000);
        let mut trace = NoopTrace;
        let ctx = ExecContext::bare(&[], 2);
        let mut vm = Vm::new(code, 1, ctx, &mut meter, &mut trace);
        vm.run()?;
        Ok(vm.data_stack().last().cloned().unwrap_or_default())
    }

    #[test]
    fn test_and_truncates_to_shorter() {
        let code = Builder::new().data(&[0xf0, 0xff, 0xff]).data(&[0x3c, 0x0f]).op(OP_AND).build();
        assert_eq!(top(code).unwrap(), vec![0x30, 0x0f]);
    }

    #[test]
    fn test_or_and_xor_pad() {
        let code = Builder::new().data(&[0xf0, 0x01, 0x80]).data(&[0x0f, 0x01]).op(OP_OR).build();
        assert_eq!(top(code).unwrap(), vec![0xff, 0x01, 0x80]);

        let code = Builder::new().data(&[0xf0, 0x01, 0x80]).data(&[0x0f, 0x01]).op(OP_XOR).build();
        assert_eq!(top(code).unwrap(), vec![0xff, 0x00, 0x80]);
    }

    #[test]
    fn test_invert() {
        let code = Builder::new().data(&[0x00, 0xf0]).op(OP_INVERT).build();
        assert_eq!(top(code).unwrap(), vec![0xff, 0x0f]);
    }

    #[test]
    fn test_equal_verify() {
        let code = Builder::new().data(b"xy").data(b"xy").op(OP_EQUALVERIFY).op(OP_TRUE).build();
        assert!(top(code).is_ok());

        let code = Builder::new().data(b"xy").data(b"xz").op(OP_EQUALVERIFY).op(OP_TRUE).build();
        assert_eq!(top(code), Err(VmError::VerifyFailed));
    }
}
