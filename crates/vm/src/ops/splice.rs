use crate::executor::{Vm, VmError};
use crate::instruction::push_data_bytes;

/// A non-negative stack operand used as a byte offset or length.
fn byte_count(n: i64) -> Result<usize, VmError> {
    if n < 0 {
        return Err(VmError::RangeError);
    }
    usize::try_from(n).map_err(|_| VmError::RangeError)
}

pub(crate) fn op_cat(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let mut a = vm.pop()?;
    a.extend_from_slice(&b);
    vm.push(a)
}

/// `str offset size SUBSTR`
pub(crate) fn op_substr(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let size = byte_count(vm.peek_int(0)?)?;
    let offset = byte_count(vm.peek_int(1)?)?;
    let end = offset.checked_add(size).ok_or(VmError::RangeError)?;
    if end > vm.peek(2)?.len() {
        return Err(VmError::RangeError);
    }
    vm.pop()?;
    vm.pop()?;
    let s = vm.pop()?;
    vm.push(s[offset..end].to_vec())
}

pub(crate) fn op_left(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let size = byte_count(vm.peek_int(0)?)?;
    if size > vm.peek(1)?.len() {
        return Err(VmError::RangeError);
    }
    vm.pop()?;
    let mut s = vm.pop()?;
    s.truncate(size);
    vm.push(s)
}

pub(crate) fn op_right(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let size = byte_count(vm.peek_int(0)?)?;
    let len = vm.peek(1)?.len();
    if size > len {
        return Err(VmError::RangeError);
    }
    vm.pop()?;
    let s = vm.pop()?;
    vm.push(s[len - size..].to_vec())
}

pub(crate) fn op_size(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = i64::try_from(vm.peek(0)?.len()).map_err(|_| VmError::RangeError)?;
    vm.push_int(len)
}

/// Append `b` to `a` as a push instruction, for building programs on the
/// stack.
pub(crate) fn op_cat_push_data(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let b = vm.pop()?;
    let mut a = vm.pop()?;
    a.extend_from_slice(&push_data_bytes(&b));
    vm.push(a)
}

#[cfg(test)]
mod tests {
    use crate::context::ExecContext;
    use crate::executor::{Vm, VmError};
    use crate::gas::GasMeter;
    use crate::instruction::Builder;
    use crate::opcodes::*;
    use crate::tracer::NoopTrace;

    fn run(code: Vec<u8>) -> Result<Vec<Vec<u8>>, VmError> {
        let mut meter = GasMeter::new(10_000);
        let mut trace = NoopTrace;
        let ctx = ExecContext::bare(&[], 2);
        let mut vm = Vm::new(code, 1, ctx, &mut meter, &mut trace);
        vm.run()?;
        Ok(vm.data_stack().to_vec())
    }

    #[test]
    fn test_cat_and_size() {
        let code = Builder::new().data(b"ab").data(b"cd").op(OP_CAT).op(OP_SIZE).build();
        assert_eq!(run(code).unwrap(), vec![b"abcd".to_vec(), vec![4]]);
    }

    #[test]
    fn test_substr() {
        let code = Builder::new().data(b"abcdef").int(1).int(3).op(OP_SUBSTR).build();
        assert_eq!(run(code).unwrap(), vec![b"bcd".to_vec()]);

        let code = Builder::new().data(b"abc").int(2).int(2).op(OP_SUBSTR).build();
        assert_eq!(run(code), Err(VmError::RangeError));
    }

    #[test]
    fn test_left_and_right() {
        let code = Builder::new().data(b"abcdef").int(2).op(OP_LEFT).build();
        assert_eq!(run(code).unwrap(), vec![b"ab".to_vec()]);

        let code = Builder::new().data(b"abcdef").int(2).op(OP_RIGHT).build();
        assert_eq!(run(code).unwrap(), vec![b"ef".to_vec()]);

        let code = Builder::new().data(b"ab").int(-1).op(OP_LEFT).build();
        assert_eq!(run(code), Err(VmError::RangeError));
    }

    #[test]
    fn test_cat_push_data() {
        let code = Builder::new().data(&[OP_DUP]).data(&[9, 9]).op(OP_CATPUSHDATA).build();
        assert_eq!(run(code).unwrap(), vec![vec![OP_DUP, 0x02, 9, 9]]);
    }
}
