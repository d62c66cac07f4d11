//! Sorted range table partitioning the CPU address space.

use std::ops::RangeInclusive;

use tracing::warn;

use crate::memory::cpu as cpu_mem;

/// Device that owns a [`Region`] of the CPU address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Nothing drives the data lines; reads return the open-bus value.
    Open,
    /// 2 KiB internal work RAM.
    Wram,
    /// `$2000-$2007` mirrored every 8 bytes.
    PpuRegisters,
    /// `$4000-$401F`: APU channels, sprite DMA and controller ports.
    ApuIo,
    /// `$6000-$7FFF` cartridge RAM.
    SaveRam,
    /// A window into the cartridge PRG ROM; the local offset is a ROM offset.
    Prg,
}

/// One `[start, end]` window. Device-local offsets start at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: u16,
    pub end: u16,
    pub device: Device,
    pub base: usize,
}

impl Region {
    #[inline]
    fn offset(&self, addr: u16) -> usize {
        self.base + (addr - self.start) as usize
    }
}

/// Ordered, gap-free, non-overlapping list of regions covering `$0000-$FFFF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    regions: Vec<Region>,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMap {
    /// A map where the whole address space is open bus.
    pub fn new() -> Self {
        Self {
            regions: vec![Region {
                start: 0x0000,
                end: 0xFFFF,
                device: Device::Open,
                base: 0,
            }],
        }
    }

    /// The console's fixed layout. PRG windows stay open until a mapper
    /// installs its banks.
    pub fn console() -> Self {
        let mut map = Self::new();
        let ram_size = cpu_mem::INTERNAL_RAM_SIZE as u16;
        for mirror in 0..cpu_mem::INTERNAL_RAM_MIRRORS {
            let start = mirror * ram_size;
            map.map_range(Device::Wram, start..=start + ram_size - 1, 0);
        }
        map.map_range(
            Device::PpuRegisters,
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END,
            0,
        );
        map.map_range(Device::ApuIo, cpu_mem::APU_IO_BASE..=cpu_mem::APU_IO_END, 0);
        map.map_range(
            Device::SaveRam,
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END,
            0,
        );
        map
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Finds the owning device and its local offset for `addr`.
    pub fn resolve(&self, addr: u16) -> (Device, usize) {
        // The first region always starts at 0, so the partition point is >= 1.
        let index = self
            .regions
            .partition_point(|region| region.start <= addr)
            .saturating_sub(1);
        let region = &self.regions[index];
        (region.device, region.offset(addr))
    }

    /// Installs `device` over `range`, trimming or splitting whatever was
    /// mapped there before. Trimmed tails keep addressing the same device
    /// bytes, so their `base` advances by the amount cut off.
    pub fn map_range(&mut self, device: Device, range: RangeInclusive<u16>, base: usize) {
        let (start, end) = (*range.start(), *range.end());
        if start > end {
            warn!(start, end, "ignoring inverted memory range");
            return;
        }

        let new = Region {
            start,
            end,
            device,
            base,
        };
        let mut next = Vec::with_capacity(self.regions.len() + 2);
        let mut inserted = false;

        for region in self.regions.drain(..) {
            if region.end < start {
                next.push(region);
                continue;
            }
            if region.start > end {
                if !inserted {
                    next.push(new);
                    inserted = true;
                }
                next.push(region);
                continue;
            }

            if region.start < start {
                next.push(Region {
                    end: start - 1,
                    ..region
                });
            }
            if !inserted {
                next.push(new);
                inserted = true;
            }
            if region.end > end {
                next.push(Region {
                    start: end + 1,
                    base: region.offset(end + 1),
                    ..region
                });
            }
        }

        if !inserted {
            next.push(new);
        }
        self.regions = next;
    }
}
