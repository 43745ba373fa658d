//! Opcode handlers, grouped by family.

pub(crate) mod arith;
pub(crate) mod bitwise;
pub(crate) mod control;
pub(crate) mod crypto;
pub(crate) mod introspection;
pub(crate) mod splice;
pub(crate) mod stack;
