use tracing::trace;

use crate::{
    apu::Apu,
    bus::{Bus, Device, MemoryMap},
    cartridge::Cartridge,
    controller::Controller,
    memory::{cpu as cpu_mem, ppu::Register as PpuRegister},
    ppu::Ppu,
    ram::Wram,
};

/// Console-side I/O state behind `$4014-$4017` that is not part of the APU.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoPorts {
    pub pads: [Controller; 2],
    /// Cycles owed to a sprite DMA started by the last write.
    stall: u32,
    /// Last value seen on the data bus.
    open_bus: u8,
}

impl IoPorts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// CPU-visible bus that bridges the core to work RAM, the PPU, the APU and
/// the cartridge. It borrows the hardware from the owning console for one
/// CPU slice.
#[derive(Debug)]
pub struct CpuBus<'a> {
    map: &'a mut MemoryMap,
    wram: &'a mut Wram,
    ppu: &'a mut Ppu,
    apu: &'a mut Apu,
    io: &'a mut IoPorts,
    cartridge: &'a mut Cartridge,
}

impl<'a> CpuBus<'a> {
    /// Creates a new bus by borrowing the attached hardware.
    pub(crate) fn new(
        map: &'a mut MemoryMap,
        wram: &'a mut Wram,
        ppu: &'a mut Ppu,
        apu: &'a mut Apu,
        io: &'a mut IoPorts,
        cartridge: &'a mut Cartridge,
    ) -> Self {
        Self {
            map,
            wram,
            ppu,
            apu,
            io,
            cartridge,
        }
    }

    fn read_io(&mut self, addr: u16) -> u8 {
        match addr {
            cpu_mem::APU_STATUS => self.apu.read_status(),
            cpu_mem::CONTROLLER_PORT_1 => self.io.pads[0].read(),
            cpu_mem::CONTROLLER_PORT_2 => self.io.pads[1].read(),
            _ => self.io.open_bus,
        }
    }

    fn write_io(&mut self, addr: u16, data: u8) {
        match addr {
            cpu_mem::OAM_DMA => self.oam_dma(data),
            cpu_mem::CONTROLLER_PORT_1 => {
                for pad in &mut self.io.pads {
                    pad.write_strobe(data);
                }
            }
            _ => self.apu.write(addr, data),
        }
    }

    /// Copies page `$XX00-$XXFF` into OAM starting at the current OAM address.
    fn oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        let mut bytes = [0u8; 256];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read(base | i as u16);
        }
        let start = self.ppu.oam_addr();
        self.ppu.oam_write_block(start, &bytes);
        self.io.stall += cpu_mem::OAM_DMA_CYCLES;
    }
}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let (device, offset) = self.map.resolve(addr);
        let value = match device {
            Device::Wram => self.wram.read(offset),
            Device::PpuRegisters => self.ppu.read_register(PpuRegister::from_offset(offset)),
            Device::ApuIo => self.read_io(addr),
            Device::SaveRam => self.cartridge.save_ram().read(offset),
            Device::Prg => self
                .cartridge
                .prg_byte(offset)
                .unwrap_or(self.io.open_bus),
            Device::Open => self.io.open_bus,
        };
        self.io.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.io.open_bus = data;
        if addr >= cpu_mem::PRG_ROM_START {
            self.cartridge.write(self.map, self.ppu, addr, data);
            return;
        }
        let (device, offset) = self.map.resolve(addr);
        match device {
            Device::Wram => self.wram.write(offset, data),
            Device::PpuRegisters => self
                .ppu
                .write_register(PpuRegister::from_offset(offset), data),
            Device::ApuIo => self.write_io(addr, data),
            Device::SaveRam => self.cartridge.save_ram_mut().write(offset, data),
            Device::Prg | Device::Open => {
                trace!(addr = format_args!("{addr:#06X}"), data, "write to open bus")
            }
        }
    }

    fn take_nmi(&mut self) -> bool {
        self.ppu.take_nmi()
    }

    fn irq_pending(&mut self) -> bool {
        self.apu.irq_pending() || self.cartridge.irq_pending()
    }

    fn take_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.io.stall)
    }
}

/// Side-effect free read for DMC sample fetches. Only memory devices answer;
/// register windows read as zero.
pub(crate) fn peek(map: &MemoryMap, wram: &Wram, cartridge: &Cartridge, addr: u16) -> u8 {
    let (device, offset) = map.resolve(addr);
    match device {
        Device::Wram => wram.read(offset),
        Device::SaveRam => cartridge.save_ram().read(offset),
        Device::Prg => cartridge.prg_byte(offset).unwrap_or(0),
        Device::PpuRegisters | Device::ApuIo | Device::Open => 0,
    }
}
