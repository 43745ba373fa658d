//! Opcode definitions and the dispatch table.

use crate::executor::{Vm, VmError};
use crate::ops::{arith, bitwise, control, crypto, introspection, splice, stack};

// Pushes
pub const OP_0: u8 = 0x00;
pub const OP_FALSE: u8 = OP_0;
pub const OP_DATA_1: u8 = 0x01;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_DATA_32: u8 = 0x20;
pub const OP_DATA_75: u8 = 0x4b;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_16: u8 = 0x60;

// Control flow
pub const OP_NOP: u8 = 0x61;
pub const OP_JUMP: u8 = 0x63;
pub const OP_JUMPIF: u8 = 0x64;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_FAIL: u8 = 0x6a;
pub const OP_CHECKPREDICATE: u8 = 0xc0;

// Stack
pub const OP_TOALTSTACK: u8 = 0x6b;
pub const OP_FROMALTSTACK: u8 = 0x6c;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_2DUP: u8 = 0x6e;
pub const OP_3DUP: u8 = 0x6f;
pub const OP_2OVER: u8 = 0x70;
pub const OP_2ROT: u8 = 0x71;
pub const OP_2SWAP: u8 = 0x72;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_ROT: u8 = 0x7b;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_TUCK: u8 = 0x7d;

// Splice
pub const OP_CAT: u8 = 0x7e;
pub const OP_SUBSTR: u8 = 0x7f;
pub const OP_LEFT: u8 = 0x80;
pub const OP_RIGHT: u8 = 0x81;
pub const OP_SIZE: u8 = 0x82;
pub const OP_CATPUSHDATA: u8 = 0x89;

// Bitwise
pub const OP_INVERT: u8 = 0x83;
pub const OP_AND: u8 = 0x84;
pub const OP_OR: u8 = 0x85;
pub const OP_XOR: u8 = 0x86;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;

// Numeric
pub const OP_1ADD: u8 = 0x8b;
pub const OP_1SUB: u8 = 0x8c;
pub const OP_2MUL: u8 = 0x8d;
pub const OP_2DIV: u8 = 0x8e;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_0NOTEQUAL: u8 = 0x92;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_LSHIFT: u8 = 0x98;
pub const OP_RSHIFT: u8 = 0x99;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;

// Crypto
pub const OP_BLAKE3: u8 = 0xaa;
pub const OP_HASH160: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xad;
pub const OP_TXSIGHASH: u8 = 0xae;

// Introspection
pub const OP_CHECKOUTPUT: u8 = 0xc1;
pub const OP_ASSET: u8 = 0xc2;
pub const OP_AMOUNT: u8 = 0xc3;
pub const OP_PROGRAM: u8 = 0xc4;
pub const OP_INDEX: u8 = 0xc9;
pub const OP_ENTRYID: u8 = 0xca;
pub const OP_OUTPUTID: u8 = 0xcb;
pub const OP_BLOCKHEIGHT: u8 = 0xcd;
pub const OP_BLOCKTIME: u8 = 0xce;

/// Handler for one opcode. The instruction's immediate data is already loaded
/// into the VM.
pub type OpFn = fn(&mut Vm<'_>) -> Result<(), VmError>;

/// Static description of one opcode.
#[derive(Clone, Copy)]
pub struct OpSpec {
    pub opcode: u8,
    pub name: &'static str,
    /// First VM version in which the opcode is defined.
    pub since_version: u64,
    /// Items the data stack must hold before the handler runs.
    pub min_depth: usize,
    pub base_cost: u64,
    /// `None` for bytes that are not opcodes.
    pub exec: Option<OpFn>,
}

impl OpSpec {
    const UNASSIGNED: OpSpec = OpSpec {
        opcode: 0,
        name: "",
        since_version: 1,
        min_depth: 0,
        base_cost: 0,
        exec: None,
    };

    pub fn is_defined(&self) -> bool {
        self.exec.is_some()
    }

    pub fn is_push(&self) -> bool {
        self.opcode <= OP_16 && self.opcode != 0x50
    }
}

impl std::fmt::Debug for OpSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(0x{:02x})", self.name, self.opcode)
    }
}

const fn op(opcode: u8, name: &'static str, min_depth: usize, base_cost: u64, exec: OpFn) -> OpSpec {
    OpSpec {
        opcode,
        name,
        since_version: 1,
        min_depth,
        base_cost,
        exec: Some(exec),
    }
}

const SMALL_INT_NAMES: [&str; 16] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
];

const fn build_table() -> [OpSpec; 256] {
    use crate::gas::GasCosts as G;

    let mut t = [OpSpec::UNASSIGNED; 256];
    let mut i = 0;
    while i < 256 {
        t[i].opcode = i as u8;
        i += 1;
    }

    let push: OpFn = control::op_push_data;
    t[OP_0 as usize] = op(OP_0, "0", 0, G::BASE, push);
    let mut n = OP_DATA_1;
    while n <= OP_DATA_75 {
        t[n as usize] = op(n, "DATA", 0, G::BASE, push);
        n += 1;
    }
    t[OP_PUSHDATA1 as usize] = op(OP_PUSHDATA1, "PUSHDATA1", 0, G::BASE, push);
    t[OP_PUSHDATA2 as usize] = op(OP_PUSHDATA2, "PUSHDATA2", 0, G::BASE, push);
    t[OP_PUSHDATA4 as usize] = op(OP_PUSHDATA4, "PUSHDATA4", 0, G::BASE, push);
    t[OP_1NEGATE as usize] = op(OP_1NEGATE, "1NEGATE", 0, G::BASE, push);
    let mut k = 0;
    while k < 16 {
        let code = OP_1 + k as u8;
        t[code as usize] = op(code, SMALL_INT_NAMES[k], 0, G::BASE, push);
        k += 1;
    }

    t[OP_NOP as usize] = op(OP_NOP, "NOP", 0, G::BASE, control::op_nop);
    t[OP_JUMP as usize] = op(OP_JUMP, "JUMP", 0, G::BASE, control::op_jump);
    t[OP_JUMPIF as usize] = op(OP_JUMPIF, "JUMPIF", 1, G::BASE, control::op_jumpif);
    t[OP_VERIFY as usize] = op(OP_VERIFY, "VERIFY", 1, G::BASE, control::op_verify);
    t[OP_FAIL as usize] = op(OP_FAIL, "FAIL", 0, G::BASE, control::op_fail);
    t[OP_CHECKPREDICATE as usize] = op(
        OP_CHECKPREDICATE,
        "CHECKPREDICATE",
        3,
        G::PREDICATE,
        control::op_check_predicate,
    );

    t[OP_TOALTSTACK as usize] = op(OP_TOALTSTACK, "TOALTSTACK", 1, G::BASE, stack::op_to_alt_stack);
    t[OP_FROMALTSTACK as usize] = op(OP_FROMALTSTACK, "FROMALTSTACK", 0, G::BASE, stack::op_from_alt_stack);
    t[OP_2DROP as usize] = op(OP_2DROP, "2DROP", 2, G::BASE, stack::op_2drop);
    t[OP_2DUP as usize] = op(OP_2DUP, "2DUP", 2, G::BASE, stack::op_2dup);
    t[OP_3DUP as usize] = op(OP_3DUP, "3DUP", 3, G::BASE, stack::op_3dup);
    t[OP_2OVER as usize] = op(OP_2OVER, "2OVER", 4, G::BASE, stack::op_2over);
    t[OP_2ROT as usize] = op(OP_2ROT, "2ROT", 6, G::BASE, stack::op_2rot);
    t[OP_2SWAP as usize] = op(OP_2SWAP, "2SWAP", 4, G::BASE, stack::op_2swap);
    t[OP_IFDUP as usize] = op(OP_IFDUP, "IFDUP", 1, G::BASE, stack::op_ifdup);
    t[OP_DEPTH as usize] = op(OP_DEPTH, "DEPTH", 0, G::BASE, stack::op_depth);
    t[OP_DROP as usize] = op(OP_DROP, "DROP", 1, G::BASE, stack::op_drop);
    t[OP_DUP as usize] = op(OP_DUP, "DUP", 1, G::BASE, stack::op_dup);
    t[OP_NIP as usize] = op(OP_NIP, "NIP", 2, G::BASE, stack::op_nip);
    t[OP_OVER as usize] = op(OP_OVER, "OVER", 2, G::BASE, stack::op_over);
    t[OP_PICK as usize] = op(OP_PICK, "PICK", 1, G::LOW, stack::op_pick);
    t[OP_ROLL as usize] = op(OP_ROLL, "ROLL", 1, G::LOW, stack::op_roll);
    t[OP_ROT as usize] = op(OP_ROT, "ROT", 3, G::BASE, stack::op_rot);
    t[OP_SWAP as usize] = op(OP_SWAP, "SWAP", 2, G::BASE, stack::op_swap);
    t[OP_TUCK as usize] = op(OP_TUCK, "TUCK", 2, G::BASE, stack::op_tuck);

    t[OP_CAT as usize] = op(OP_CAT, "CAT", 2, G::SPLICE, splice::op_cat);
    t[OP_SUBSTR as usize] = op(OP_SUBSTR, "SUBSTR", 3, G::SPLICE, splice::op_substr);
    t[OP_LEFT as usize] = op(OP_LEFT, "LEFT", 2, G::SPLICE, splice::op_left);
    t[OP_RIGHT as usize] = op(OP_RIGHT, "RIGHT", 2, G::SPLICE, splice::op_right);
    t[OP_SIZE as usize] = op(OP_SIZE, "SIZE", 1, G::BASE, splice::op_size);
    t[OP_CATPUSHDATA as usize] = op(OP_CATPUSHDATA, "CATPUSHDATA", 2, G::SPLICE, splice::op_cat_push_data);

    t[OP_INVERT as usize] = op(OP_INVERT, "INVERT", 1, G::BASE, bitwise::op_invert);
    t[OP_AND as usize] = op(OP_AND, "AND", 2, G::BASE, bitwise::op_and);
    t[OP_OR as usize] = op(OP_OR, "OR", 2, G::BASE, bitwise::op_or);
    t[OP_XOR as usize] = op(OP_XOR, "XOR", 2, G::BASE, bitwise::op_xor);
    t[OP_EQUAL as usize] = op(OP_EQUAL, "EQUAL", 2, G::BASE, bitwise::op_equal);
    t[OP_EQUALVERIFY as usize] = op(OP_EQUALVERIFY, "EQUALVERIFY", 2, G::BASE, bitwise::op_equal_verify);

    t[OP_1ADD as usize] = op(OP_1ADD, "1ADD", 1, G::LOW, arith::op_1add);
    t[OP_1SUB as usize] = op(OP_1SUB, "1SUB", 1, G::LOW, arith::op_1sub);
    t[OP_2MUL as usize] = op(OP_2MUL, "2MUL", 1, G::LOW, arith::op_2mul);
    t[OP_2DIV as usize] = op(OP_2DIV, "2DIV", 1, G::LOW, arith::op_2div);
    t[OP_NEGATE as usize] = op(OP_NEGATE, "NEGATE", 1, G::LOW, arith::op_negate);
    t[OP_ABS as usize] = op(OP_ABS, "ABS", 1, G::LOW, arith::op_abs);
    t[OP_NOT as usize] = op(OP_NOT, "NOT", 1, G::LOW, arith::op_not);
    t[OP_0NOTEQUAL as usize] = op(OP_0NOTEQUAL, "0NOTEQUAL", 1, G::LOW, arith::op_0notequal);
    t[OP_ADD as usize] = op(OP_ADD, "ADD", 2, G::LOW, arith::op_add);
    t[OP_SUB as usize] = op(OP_SUB, "SUB", 2, G::LOW, arith::op_sub);
    t[OP_MUL as usize] = op(OP_MUL, "MUL", 2, G::MID, arith::op_mul);
    t[OP_DIV as usize] = op(OP_DIV, "DIV", 2, G::MID, arith::op_div);
    t[OP_MOD as usize] = op(OP_MOD, "MOD", 2, G::MID, arith::op_mod);
    t[OP_LSHIFT as usize] = op(OP_LSHIFT, "LSHIFT", 2, G::MID, arith::op_lshift);
    t[OP_RSHIFT as usize] = op(OP_RSHIFT, "RSHIFT", 2, G::MID, arith::op_rshift);
    t[OP_BOOLAND as usize] = op(OP_BOOLAND, "BOOLAND", 2, G::LOW, arith::op_booland);
    t[OP_BOOLOR as usize] = op(OP_BOOLOR, "BOOLOR", 2, G::LOW, arith::op_boolor);
    t[OP_NUMEQUAL as usize] = op(OP_NUMEQUAL, "NUMEQUAL", 2, G::LOW, arith::op_numequal);
    t[OP_NUMEQUALVERIFY as usize] = op(OP_NUMEQUALVERIFY, "NUMEQUALVERIFY", 2, G::LOW, arith::op_numequal_verify);
    t[OP_NUMNOTEQUAL as usize] = op(OP_NUMNOTEQUAL, "NUMNOTEQUAL", 2, G::LOW, arith::op_numnotequal);
    t[OP_LESSTHAN as usize] = op(OP_LESSTHAN, "LESSTHAN", 2, G::LOW, arith::op_lessthan);
    t[OP_GREATERTHAN as usize] = op(OP_GREATERTHAN, "GREATERTHAN", 2, G::LOW, arith::op_greaterthan);
    t[OP_LESSTHANOREQUAL as usize] = op(OP_LESSTHANOREQUAL, "LESSTHANOREQUAL", 2, G::LOW, arith::op_lessthanorequal);
    t[OP_GREATERTHANOREQUAL as usize] = op(OP_GREATERTHANOREQUAL, "GREATERTHANOREQUAL", 2, G::LOW, arith::op_greaterthanorequal);
    t[OP_MIN as usize] = op(OP_MIN, "MIN", 2, G::LOW, arith::op_min);
    t[OP_MAX as usize] = op(OP_MAX, "MAX", 2, G::LOW, arith::op_max);
    t[OP_WITHIN as usize] = op(OP_WITHIN, "WITHIN", 3, G::LOW, arith::op_within);

    t[OP_BLAKE3 as usize] = op(OP_BLAKE3, "BLAKE3", 1, G::HASH, crypto::op_blake3);
    t[OP_HASH160 as usize] = op(OP_HASH160, "HASH160", 1, G::HASH, crypto::op_hash160);
    t[OP_CHECKSIG as usize] = op(OP_CHECKSIG, "CHECKSIG", 3, G::SIGNATURE, crypto::op_checksig);
    t[OP_CHECKMULTISIG as usize] = op(OP_CHECKMULTISIG, "CHECKMULTISIG", 2, G::BASE, crypto::op_checkmultisig);
    t[OP_TXSIGHASH as usize] = op(OP_TXSIGHASH, "TXSIGHASH", 0, G::TX_SIG_HASH, crypto::op_txsighash);

    t[OP_CHECKOUTPUT as usize] = op(OP_CHECKOUTPUT, "CHECKOUTPUT", 5, G::CHECK_OUTPUT, introspection::op_check_output);
    t[OP_ASSET as usize] = op(OP_ASSET, "ASSET", 0, G::BASE, introspection::op_asset);
    t[OP_AMOUNT as usize] = op(OP_AMOUNT, "AMOUNT", 0, G::BASE, introspection::op_amount);
    t[OP_PROGRAM as usize] = op(OP_PROGRAM, "PROGRAM", 0, G::BASE, introspection::op_program);
    t[OP_INDEX as usize] = op(OP_INDEX, "INDEX", 0, G::BASE, introspection::op_index);
    t[OP_ENTRYID as usize] = op(OP_ENTRYID, "ENTRYID", 0, G::BASE, introspection::op_entry_id);
    t[OP_OUTPUTID as usize] = op(OP_OUTPUTID, "OUTPUTID", 0, G::BASE, introspection::op_output_id);

    let mut height = op(OP_BLOCKHEIGHT, "BLOCKHEIGHT", 0, G::BASE, introspection::op_block_height);
    height.since_version = 2;
    t[OP_BLOCKHEIGHT as usize] = height;
    let mut time = op(OP_BLOCKTIME, "BLOCKTIME", 0, G::BASE, introspection::op_block_time);
    time.since_version = 2;
    t[OP_BLOCKTIME as usize] = time;

    t
}

/// The dispatch table, indexed by opcode byte.
pub static OPS: [OpSpec; 256] = build_table();

pub fn spec(opcode: u8) -> &'static OpSpec {
    &OPS[opcode as usize]
}

/// Look up a non-push opcode by name. Accepts any case and an optional `OP_`
/// prefix.
pub fn by_name(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    let bare = upper.strip_prefix("OP_").unwrap_or(&upper);
    OPS.iter()
        .filter(|s| s.is_defined() && !s.is_push())
        .find(|s| s.name == bare)
        .map(|s| s.opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_indexes_match_opcodes() {
        for (i, s) in OPS.iter().enumerate() {
            assert_eq!(s.opcode as usize, i);
        }
    }

    #[test]
    fn test_unassigned_bytes() {
        assert!(!spec(0x50).is_defined());
        assert!(!spec(0x62).is_defined());
        assert!(!spec(0xff).is_defined());
        assert!(spec(OP_CHECKSIG).is_defined());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("checksig"), Some(OP_CHECKSIG));
        assert_eq!(by_name("OP_DUP"), Some(OP_DUP));
        assert_eq!(by_name("2drop"), Some(OP_2DROP));
        assert_eq!(by_name("DATA"), None);
        assert_eq!(by_name("bogus"), None);
    }

    #[test]
    fn test_version_gates() {
        assert_eq!(spec(OP_BLOCKHEIGHT).since_version, 2);
        assert_eq!(spec(OP_BLOCKTIME).since_version, 2);
        assert_eq!(spec(OP_CHECKPREDICATE).since_version, 1);
    }
}
