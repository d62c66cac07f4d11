use core::ops::{Deref, DerefMut};

use crate::memory::cpu as cpu_mem;

/// Fixed-size, heap-backed RAM block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ram<const N: usize>(Box<[u8; N]>);

/// 2 KiB console work RAM, mirrored through `$1FFF`.
pub type Wram = Ram<{ cpu_mem::INTERNAL_RAM_SIZE }>;
/// Cartridge PRG RAM behind `$6000-$7FFF`.
pub type PrgRam = Ram<{ cpu_mem::PRG_RAM_SIZE }>;

impl<const N: usize> Ram<N> {
    pub fn new() -> Self {
        Self(Box::new([0; N]))
    }

    /// Reads with the offset folded into the block, as address mirrors do.
    #[inline]
    pub fn read(&self, addr: usize) -> u8 {
        self.0[addr % N]
    }

    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) {
        self.0[addr % N] = value;
    }

    pub fn clear(&mut self) {
        self.0.fill(0);
    }
}

impl<const N: usize> Default for Ram<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for Ram<N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl<const N: usize> DerefMut for Ram<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}
