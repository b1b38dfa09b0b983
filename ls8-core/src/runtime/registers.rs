use crate::error::{VmError, VmResult};

pub const REGISTER_COUNT: usize = 8;

/// R7 doubles as the stack pointer.
pub const SP: u8 = 7;

/// Stack pointer value of a freshly constructed machine.
pub const SP_INIT: u8 = 0xF4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        let mut regs = [0; REGISTER_COUNT];
        regs[SP as usize] = SP_INIT;
        Self { regs }
    }

    pub fn get(&self, index: u8) -> VmResult<u8> {
        self.regs
            .get(index as usize)
            .copied()
            .ok_or(VmError::InvalidRegister(index))
    }

    pub fn set(&mut self, index: u8, value: u8) -> VmResult<()> {
        let slot = self
            .regs
            .get_mut(index as usize)
            .ok_or(VmError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    pub fn sp(&self) -> u8 {
        self.regs[SP as usize]
    }

    pub fn set_sp(&mut self, value: u8) {
        self.regs[SP as usize] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Condition bits written by CMP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub less: bool,
    pub greater: bool,
    pub equal: bool,
}

impl Flags {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Packed as `00000LGE`, the layout of the LS8 FL register.
    pub fn bits(&self) -> u8 {
        (self.less as u8) << 2 | (self.greater as u8) << 1 | self.equal as u8
    }
}
