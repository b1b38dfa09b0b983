//! Arithmetic/logic unit
//!
//! Stateless: reads both operand registers, writes the result back into the
//! first one (or into the flags for CMP). Arithmetic wraps modulo 256.

use crate::error::{VmError, VmResult};

use super::isa::Op;
use super::registers::{Flags, RegisterFile};

pub fn apply(
    op: Op,
    regs: &mut RegisterFile,
    flags: &mut Flags,
    reg_a: u8,
    reg_b: u8,
) -> VmResult<()> {
    let a = regs.get(reg_a)?;
    let b = regs.get(reg_b)?;

    let result = match op {
        Op::ADD => a.wrapping_add(b),
        Op::SUB => a.wrapping_sub(b),
        Op::MUL => a.wrapping_mul(b),
        Op::AND => a & b,

        Op::CMP => {
            flags.clear();
            if a < b {
                flags.less = true;
            } else if a > b {
                flags.greater = true;
            } else {
                flags.equal = true;
            }
            return Ok(());
        }

        other => return Err(VmError::UnsupportedOperation(other)),
    };

    regs.set(reg_a, result)
}
