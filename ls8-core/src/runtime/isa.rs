//! LS8 instruction set
//!
//! Every opcode carries its operand count in the top two bits, so the length of
//! an instruction can be derived without knowing what the instruction does.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    HLT = 0b0000_0001,

    // Registers
    LDI = 0b1000_0010,
    PRN = 0b0100_0111,

    // Math
    ADD = 0b1010_0000,
    SUB = 0b1010_0001,
    MUL = 0b1010_0010,
    CMP = 0b1010_0111,
    AND = 0b1010_1000,

    // Stack
    PUSH = 0b0100_0101,
    POP = 0b0100_0110,

    // Calls
    CALL = 0b0101_0000,
    RET = 0b0001_0001,

    // Jumping
    JMP = 0b0101_0100,
    JEQ = 0b0101_0101,
    JNE = 0b0101_0110,
}

/// Every defined opcode, in table order.
pub const ALL_OPS: [Op; 15] = [
    Op::HLT,
    Op::LDI,
    Op::PRN,
    Op::ADD,
    Op::SUB,
    Op::MUL,
    Op::CMP,
    Op::AND,
    Op::PUSH,
    Op::POP,
    Op::CALL,
    Op::RET,
    Op::JMP,
    Op::JEQ,
    Op::JNE,
];

impl TryFrom<u8> for Op {
    /// The byte that did not match any opcode.
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0b0000_0001 => Ok(Op::HLT),
            0b1000_0010 => Ok(Op::LDI),
            0b0100_0111 => Ok(Op::PRN),
            0b1010_0000 => Ok(Op::ADD),
            0b1010_0001 => Ok(Op::SUB),
            0b1010_0010 => Ok(Op::MUL),
            0b1010_0111 => Ok(Op::CMP),
            0b1010_1000 => Ok(Op::AND),
            0b0100_0101 => Ok(Op::PUSH),
            0b0100_0110 => Ok(Op::POP),
            0b0101_0000 => Ok(Op::CALL),
            0b0001_0001 => Ok(Op::RET),
            0b0101_0100 => Ok(Op::JMP),
            0b0101_0101 => Ok(Op::JEQ),
            0b0101_0110 => Ok(Op::JNE),
            _ => Err(byte),
        }
    }
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::HLT => "HLT",
            Op::LDI => "LDI",
            Op::PRN => "PRN",
            Op::ADD => "ADD",
            Op::SUB => "SUB",
            Op::MUL => "MUL",
            Op::CMP => "CMP",
            Op::AND => "AND",
            Op::PUSH => "PUSH",
            Op::POP => "POP",
            Op::CALL => "CALL",
            Op::RET => "RET",
            Op::JMP => "JMP",
            Op::JEQ => "JEQ",
            Op::JNE => "JNE",
        }
    }

    pub fn operand_count(self) -> usize {
        operand_count(self as u8)
    }
}

/// Number of operand bytes following `opcode`, taken from its top two bits.
pub fn operand_count(opcode: u8) -> usize {
    (opcode >> 6) as usize
}

/// Total length in bytes of the instruction starting with `opcode`.
pub fn instruction_len(opcode: u8) -> u8 {
    (opcode >> 6) + 1
}
