use std::fmt::Debug;

use crate::memory;

pub mod cpu;
pub mod map;
#[cfg(test)]
pub(crate) mod mock;

pub use cpu::{CpuBus, IoPorts};
pub use map::{Device, MemoryMap, Region};

/// Expose the CPU stack page start address for stack helpers.
pub(crate) const STACK_ADDR: u16 = memory::cpu::STACK_PAGE_START;

/// CPU-facing bus abstraction.
///
/// Reads and writes never fail: unmapped addresses return the open-bus value
/// and writes to read-only space are dropped. Interrupt sources are polled by
/// the CPU once per instruction boundary.
pub trait Bus: Debug {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, data: u8);

    /// Consumes a latched NMI edge (PPU vblank with NMI enabled).
    fn take_nmi(&mut self) -> bool {
        false
    }

    /// Returns `true` while any peripheral (cartridge/APU) holds the IRQ line low.
    fn irq_pending(&mut self) -> bool {
        false
    }

    /// Cycles the CPU has to wait for, such as a sprite DMA triggered by the
    /// last write.
    fn take_stall_cycles(&mut self) -> u32 {
        0
    }
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data)
    }

    fn take_nmi(&mut self) -> bool {
        (**self).take_nmi()
    }

    fn irq_pending(&mut self) -> bool {
        (**self).irq_pending()
    }

    fn take_stall_cycles(&mut self) -> u32 {
        (**self).take_stall_cycles()
    }
}
