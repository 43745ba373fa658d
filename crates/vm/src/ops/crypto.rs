//! Hashing and signature checks.
//!
//! Signature opcodes follow the NULLFAIL rule: a check may only come out
//! false when every signature involved is empty. A non-empty signature that
//! does not verify aborts the program.

use crate::executor::{Vm, VmError};
use crate::gas::GasCosts;
use voc_core::{hash, hash160};

const MESSAGE_LEN: usize = 32;

pub(crate) fn op_blake3(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.peek(0)?.len() as u64;
    vm.charge(len)?;
    let data = vm.pop()?;
    vm.push(hash(&data).as_bytes().to_vec())
}

pub(crate) fn op_hash160(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let len = vm.peek(0)?.len() as u64;
    vm.charge(len)?;
    let data = vm.pop()?;
    vm.push(hash160(&data).to_vec())
}

/// `sig msg pubkey CHECKSIG`
pub(crate) fn op_checksig(vm: &mut Vm<'_>) -> Result<(), VmError> {
    if vm.peek(1)?.len() != MESSAGE_LEN {
        return Err(VmError::BadValue);
    }
    let pubkey = vm.pop()?;
    let msg = vm.pop()?;
    let sig = vm.pop()?;

    let ok = vm.ctx.verifier.verify(&pubkey, &msg, &sig);
    if !ok && !sig.is_empty() {
        return Err(VmError::VerifyFailed);
    }
    vm.push_bool(ok)
}

/// `sig_1 .. sig_k msg pubkey_1 .. pubkey_n k n CHECKMULTISIG`
///
/// Signatures must appear in the same order as the keys they match.
pub(crate) fn op_checkmultisig(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let n = vm.peek_int(0)?;
    let k = vm.peek_int(1)?;
    if n <= 0 || k <= 0 || k > n {
        return Err(VmError::BadValue);
    }
    let n = usize::try_from(n).map_err(|_| VmError::RangeError)?;
    let k = usize::try_from(k).map_err(|_| VmError::RangeError)?;
    let total = n
        .checked_add(k)
        .and_then(|d| d.checked_add(3))
        .ok_or(VmError::DataStackUnderflow)?;
    vm.require_depth(total)?;
    if vm.peek(n + 2)?.len() != MESSAGE_LEN {
        return Err(VmError::BadValue);
    }
    let cost = GasCosts::SIGNATURE
        .checked_mul(n as u64)
        .ok_or(VmError::RangeError)?;
    vm.charge(cost)?;

    vm.pop()?;
    vm.pop()?;
    let len = vm.data_stack.len();
    let pubkeys = vm.data_stack.split_off(len - n);
    let msg = vm.pop()?;
    let len = vm.data_stack.len();
    let sigs = vm.data_stack.split_off(len - k);

    let verifier = vm.ctx.verifier;
    let mut keys = pubkeys.iter();
    let ok = sigs.iter().all(|sig| {
        !sig.is_empty() && keys.any(|pubkey| verifier.verify(pubkey, &msg, sig))
    });
    if !ok && sigs.iter().any(|sig| !sig.is_empty()) {
        return Err(VmError::VerifyFailed);
    }
    vm.push_bool(ok)
}

pub(crate) fn op_txsighash(vm: &mut Vm<'_>) -> Result<(), VmError> {
    let sighash = vm.ctx.tx_sig_hash;
    vm.push(sighash.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use crate::context::ExecContext;
    use crate::executor::{Vm, VmError};
    use crate::gas::{GasCosts, GasMeter};
    use crate::instruction::Builder;
    use crate::opcodes::*;
    use crate::tracer::NoopTrace;
    use voc_core::testing::Keypair;
    use voc_core::{hash, hash160};

    fn run(code: Vec<u8>, ctx: ExecContext<'_>) -> (Result<Vec<Vec<u8>>, VmError>, u64) {
        let mut meter = GasMeter::new(100_000);
        let mut trace = NoopTrace;
        let mut vm = Vm::new(code, 1, ctx, &mut meter, &mut trace);
        let outcome = vm.run().map(|_| vm.data_stack().to_vec());
        drop(vm);
        (outcome, meter.used())
    }

    #[test]
    fn test_hashes() {
        let ctx = ExecContext::bare(&[], 2);
        let code = Builder::new().data(b"abc").op(OP_BLAKE3).build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack.unwrap(), vec![hash(b"abc").as_bytes().to_vec()]);

        let code = Builder::new().data(b"abc").op(OP_HASH160).build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack.unwrap(), vec![hash160(b"abc").to_vec()]);
    }

    #[test]
    fn test_checksig() {
        let kp = Keypair::from_seed(3);
        let msg = hash(b"message");
        let sig = kp.sign_hash(&msg);
        let ctx = ExecContext::bare(&[], 2);

        let code = Builder::new()
            .data(sig.as_bytes())
            .data(msg.as_bytes())
            .data(&kp.public_key_bytes())
            .op(OP_CHECKSIG)
            .build();
        let (stack, used) = run(code, ctx);
        assert_eq!(stack.unwrap(), vec![vec![1]]);
        assert!(used >= GasCosts::SIGNATURE);
    }

    #[test]
    fn test_checksig_nullfail() {
        let kp = Keypair::from_seed(3);
        let other = Keypair::from_seed(4);
        let msg = hash(b"message");
        let ctx = ExecContext::bare(&[], 2);

        // empty signature: clean false
        let code = Builder::new()
            .data(&[])
            .data(msg.as_bytes())
            .data(&kp.public_key_bytes())
            .op(OP_CHECKSIG)
            .build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack.unwrap(), vec![Vec::<u8>::new()]);

        // wrong signer: abort
        let code = Builder::new()
            .data(other.sign_hash(&msg).as_bytes())
            .data(msg.as_bytes())
            .data(&kp.public_key_bytes())
            .op(OP_CHECKSIG)
            .build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack, Err(VmError::VerifyFailed));
    }

    #[test]
    fn test_checksig_requires_32_byte_message() {
        let kp = Keypair::from_seed(3);
        let ctx = ExecContext::bare(&[], 2);
        let code = Builder::new()
            .data(kp.sign(b"short").as_bytes())
            .data(b"short")
            .data(&kp.public_key_bytes())
            .op(OP_CHECKSIG)
            .build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack, Err(VmError::BadValue));
    }

    #[test]
    fn test_checkmultisig_two_of_three() {
        let keys: Vec<Keypair> = (10..13).map(Keypair::from_seed).collect();
        let msg = hash(b"multisig");
        let ctx = ExecContext::bare(&[], 2);

        let with_sigs = |signers: &[usize]| {
            let mut b = Builder::new();
            for &i in signers {
                b = b.data(keys[i].sign_hash(&msg).as_bytes());
            }
            b = b.data(msg.as_bytes());
            for kp in &keys {
                b = b.data(&kp.public_key_bytes());
            }
            b.int(signers.len() as i64).int(3).op(OP_CHECKMULTISIG).build()
        };

        let (stack, used) = run(with_sigs(&[0, 2]), ctx);
        assert_eq!(stack.unwrap(), vec![vec![1]]);
        assert!(used >= 3 * GasCosts::SIGNATURE);

        // out of order signatures do not match
        let (stack, _) = run(with_sigs(&[2, 0]), ctx);
        assert_eq!(stack, Err(VmError::VerifyFailed));
    }

    #[test]
    fn test_checkmultisig_counts() {
        let ctx = ExecContext::bare(&[], 2);
        let code = Builder::new().int(2).int(1).op(OP_CHECKMULTISIG).build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack, Err(VmError::BadValue));

        let code = Builder::new().int(1).int(1).op(OP_CHECKMULTISIG).build();
        let (stack, _) = run(code, ctx);
        assert_eq!(stack, Err(VmError::DataStackUnderflow));
    }

    #[test]
    fn test_txsighash() {
        let mut ctx = ExecContext::bare(&[], 2);
        ctx.tx_sig_hash = hash(b"sighash");
        let (stack, _) = run(vec![OP_TXSIGHASH], ctx);
        assert_eq!(stack.unwrap(), vec![hash(b"sighash").as_bytes().to_vec()]);
    }
}
