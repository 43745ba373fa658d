//! Witness program templates.
//!
//! Two short control program shapes stand in for longer scripts:
//!
//! - pay to witness pubkey hash, `00 14 <20-byte key hash>`, which expands to
//!   `DUP HASH160 <hash> EQUALVERIFY TXSIGHASH SWAP CHECKSIG` and is satisfied
//!   by the arguments `[signature, public key]`;
//! - pay to witness script hash, `00 20 <32-byte script hash>`, which expands
//!   to `DUP BLAKE3 <hash> EQUALVERIFY -1 SWAP 0 CHECKPREDICATE` and is
//!   satisfied by the script's own arguments followed by the script.

use crate::instruction::Builder;
use crate::opcodes::*;

const KEY_HASH_LEN: usize = 20;
const SCRIPT_HASH_LEN: usize = 32;

pub fn is_p2wpkh(code: &[u8]) -> bool {
    code.len() == 2 + KEY_HASH_LEN && code[0] == OP_0 && code[1] == OP_DATA_20
}

pub fn is_p2wsh(code: &[u8]) -> bool {
    code.len() == 2 + SCRIPT_HASH_LEN && code[0] == OP_0 && code[1] == OP_DATA_32
}

/// Whether `code` is one of the witness templates.
pub fn is_witness_program(code: &[u8]) -> bool {
    is_p2wpkh(code) || is_p2wsh(code)
}

/// The full program a witness template stands for, or `None` if `code` is
/// not a template.
pub fn expand(code: &[u8]) -> Option<Vec<u8>> {
    if is_p2wpkh(code) {
        return Some(
            Builder::new()
                .op(OP_DUP)
                .op(OP_HASH160)
                .data(&code[2..])
                .op(OP_EQUALVERIFY)
                .op(OP_TXSIGHASH)
                .op(OP_SWAP)
                .op(OP_CHECKSIG)
                .build(),
        );
    }
    if is_p2wsh(code) {
        return Some(
            Builder::new()
                .op(OP_DUP)
                .op(OP_BLAKE3)
                .data(&code[2..])
                .op(OP_EQUALVERIFY)
                .int(-1)
                .op(OP_SWAP)
                .int(0)
                .op(OP_CHECKPREDICATE)
                .build(),
        );
    }
    None
}

/// Control program paying to a public key hash.
pub fn p2wpkh_program(key_hash: &[u8; KEY_HASH_LEN]) -> Vec<u8> {
    let mut code = vec![OP_0, OP_DATA_20];
    code.extend_from_slice(key_hash);
    code
}

/// Control program paying to a script hash.
pub fn p2wsh_program(script_hash: &[u8; SCRIPT_HASH_LEN]) -> Vec<u8> {
    let mut code = vec![OP_0, OP_DATA_32];
    code.extend_from_slice(script_hash);
    code
}
