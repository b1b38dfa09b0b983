use std::fmt::{Debug, Formatter};

use crate::error::LoadError;

pub const MEMORY_SIZE: usize = 256;

/// Flat 256 byte RAM. Addresses are 8 bit, so every access wraps by
/// construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Copy a program image to address 0. The rest of memory is left as is.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > MEMORY_SIZE {
            return Err(LoadError::CapacityOverflow {
                len: image.len(),
                capacity: MEMORY_SIZE,
            });
        }

        self.cells[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.cells.iter().filter(|&&b| b != 0).count();
        write!(f, "Memory {{ {} of {} bytes non-zero }}", used, MEMORY_SIZE)
    }
}
