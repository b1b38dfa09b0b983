use std::fmt::Write as _;
use std::io::Write;

use crate::runtime::isa::{self, Op};
use crate::runtime::machine::Machine;
use crate::runtime::memory::{MEMORY_SIZE, Memory};

/// Disassemble the instruction at `addr`, returning its text and length.
pub fn disasm_instruction(memory: &Memory, addr: u8) -> (String, usize) {
    let opcode = memory.read(addr);
    let a = memory.read(addr.wrapping_add(1));
    let b = memory.read(addr.wrapping_add(2));
    let len = isa::operand_count(opcode) + 1;

    let text = match Op::try_from(opcode) {
        Ok(Op::LDI) => format!("LDI R{}, {}", a, b),
        Ok(op) => match op.operand_count() {
            0 => op.mnemonic().to_string(),
            1 => format!("{} R{}", op.mnemonic(), a),
            _ => format!("{} R{}, R{}", op.mnemonic(), a, b),
        },
        Err(byte) => format!(".byte {:#04X}", byte),
    };

    (text, len)
}

/// Listing of memory from `start` up to (not including) `end`, one
/// instruction per line.
pub fn dump_memory(memory: &Memory, start: usize, end: usize) -> String {
    let end = end.min(MEMORY_SIZE);
    let mut out = String::new();
    let mut addr = start;

    while addr < end {
        let (text, len) = disasm_instruction(memory, addr as u8);

        let _ = write!(out, "{:02X}: ", addr);
        for i in 0..3 {
            if i < len && addr + i < MEMORY_SIZE {
                let _ = write!(out, "{:02X} ", memory.read((addr + i) as u8));
            } else {
                out.push_str("   ");
            }
        }
        let _ = writeln!(out, " {}", text);

        addr += len;
    }

    out
}

/// `TRACE: PC | next three bytes | R0..R7`, all two digit hex.
pub fn trace_line<W: Write>(vm: &Machine<W>) -> String {
    let pc = vm.pc();
    let mem = vm.memory();

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
        pc,
        mem.read(pc),
        mem.read(pc.wrapping_add(1)),
        mem.read(pc.wrapping_add(2)),
    );
    for reg in vm.registers().as_slice() {
        let _ = write!(line, " {:02X}", reg);
    }

    line
}

pub fn dump_state<W: Write>(vm: &Machine<W>) -> String {
    let flags = vm.flags();
    let mut out = String::new();

    let _ = writeln!(out, "------------------------------------------------------------");
    let _ = writeln!(
        out,
        "pc: {:02X}\tir: {:02X}\tsp: {:02X}\tsteps: {}",
        vm.pc(),
        vm.ir(),
        vm.registers().sp(),
        vm.steps()
    );
    let _ = writeln!(
        out,
        "fl: {:08b}\tL={} G={} E={}",
        flags.bits(),
        flags.less as u8,
        flags.greater as u8,
        flags.equal as u8
    );
    let _ = writeln!(out, "------------------------------------------------------------");
    for (i, reg) in vm.registers().as_slice().iter().enumerate() {
        let _ = writeln!(out, "R{}: {:02X}", i, reg);
    }

    out
}
