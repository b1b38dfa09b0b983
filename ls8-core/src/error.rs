use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::isa::Op;

/// Failure to turn a program file into a memory image. Raised before any
/// instruction executes.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read program file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program at line {line}: expected 8 binary digits, found {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("program is {len} bytes but memory only holds {capacity}")]
    CapacityOverflow { len: usize, capacity: usize },
}

/// Failure while executing a program. The machine is halted when one of these
/// is returned.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("unknown instruction {opcode:#010b} at address {addr:#04X}")]
    UnknownInstruction { addr: u8, opcode: u8 },

    #[error("unsupported ALU operation {0:?}")]
    UnsupportedOperation(Op),

    #[error("invalid register R{0}")]
    InvalidRegister(u8),

    #[error("stack overflow: push with SP at {sp:#04X}")]
    StackOverflow { sp: u8 },

    #[error("stack underflow: pop with SP at {sp:#04X}")]
    StackUnderflow { sp: u8 },

    #[error("step limit of {0} instructions exceeded")]
    StepLimitExceeded(u64),

    #[error("failed to write program output: {0}")]
    Output(#[from] std::io::Error),
}

pub type VmResult<T> = Result<T, VmError>;
