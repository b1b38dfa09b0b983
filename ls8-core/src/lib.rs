//! Core of the LS8 emulator
//!
//! A functional (not cycle-accurate) model of the LS8: 256 bytes of memory,
//! eight 8-bit registers with R7 as the stack pointer, and the L/G/E flags.

pub mod error;
pub mod runtime;

pub use error::{LoadError, VmError, VmResult};
pub use runtime::machine::{Machine, MachineConfig, RunSummary, State};
