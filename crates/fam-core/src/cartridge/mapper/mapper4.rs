//! Mapper 4 (MMC3 / TxROM).
//!
//! Eight bank registers selected through `$8000` and written through `$8001`,
//! mirroring at `$A000`, and a scanline counter that raises IRQ once it counts
//! down to zero. The counter is clocked from the hblank hook on every rendered
//! line, standing in for the A12 rising edges of the real chip.

use std::borrow::Cow;

use crate::{
    cartridge::{
        Mirroring,
        mapper::{CHR_BANK_1K, CHR_BANK_2K, Mapper, MapperBus, PRG_BANK_8K},
    },
    reset_kind::ResetKind,
};

const PRG_MODE: u8 = 0x40;
const CHR_INVERSION: u8 = 0x80;
const PRE_RENDER_LINE: u16 = 261;
const VISIBLE_LINES: u16 = 240;

#[derive(Debug, Clone, Default)]
pub struct Mapper4 {
    bank_select: u8,
    registers: [u8; 8],
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    four_screen: bool,
}

impl Mapper4 {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_prg(&self, bus: &mut MapperBus<'_>) {
        let count = bus.prg_bank_count(PRG_BANK_8K);
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = (self.registers[6] & 0x3F) as usize;
        let r7 = (self.registers[7] & 0x3F) as usize;

        let (low, high) = if self.bank_select & PRG_MODE == 0 {
            (r6, second_last)
        } else {
            (second_last, r6)
        };
        bus.map_prg(0x8000, PRG_BANK_8K, low);
        bus.map_prg(0xA000, PRG_BANK_8K, r7);
        bus.map_prg(0xC000, PRG_BANK_8K, high);
        bus.map_prg(0xE000, PRG_BANK_8K, last);
    }

    fn apply_chr(&self, bus: &mut MapperBus<'_>) {
        let invert: u16 = if self.bank_select & CHR_INVERSION != 0 {
            0x1000
        } else {
            0x0000
        };
        let r = |index: usize| self.registers[index] as usize;

        // R0/R1 select 2 KiB banks (low bit ignored), R2-R5 select 1 KiB banks.
        bus.load_chr(invert, CHR_BANK_2K, r(0) >> 1);
        bus.load_chr(invert | 0x0800, CHR_BANK_2K, r(1) >> 1);
        for (slot, index) in (2..6).enumerate() {
            let addr = (invert ^ 0x1000) + (slot as u16) * CHR_BANK_1K as u16;
            bus.load_chr(addr, CHR_BANK_1K, r(index));
        }
    }

    fn clock_counter(&mut self, bus: &mut MapperBus<'_>) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            bus.set_irq(true);
        }
    }
}

impl Mapper for Mapper4 {
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind) {
        if kind == ResetKind::PowerOn {
            *self = Self::default();
            // Common power-on bank layout so the fixed vectors are reachable.
            self.registers = [0, 2, 4, 5, 6, 7, 0, 1];
        }
        self.irq_enabled = false;
        self.four_screen = bus.header_mirroring() == Mirroring::FourScreen;
        let mirroring = bus.header_mirroring();
        bus.set_mirroring(mirroring);
        self.apply_prg(bus);
        self.apply_chr(bus);
    }

    fn write(&mut self, bus: &mut MapperBus<'_>, addr: u16, data: u8) {
        let even = addr & 1 == 0;
        match (addr & 0xE000, even) {
            (0x8000, true) => {
                self.bank_select = data;
                self.apply_prg(bus);
                self.apply_chr(bus);
            }
            (0x8000, false) => {
                self.registers[(self.bank_select & 0x07) as usize] = data;
                self.apply_prg(bus);
                self.apply_chr(bus);
            }
            (0xA000, true) => {
                if !self.four_screen {
                    bus.set_mirroring(if data & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    });
                }
            }
            // PRG RAM protect; the save RAM window is always enabled.
            (0xA000, false) => {}
            (0xC000, true) => self.irq_latch = data,
            (0xC000, false) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (0xE000, true) => {
                self.irq_enabled = false;
                bus.set_irq(false);
            }
            _ => self.irq_enabled = true,
        }
    }

    fn hblank(&mut self, bus: &mut MapperBus<'_>, line: u16) {
        if (line < VISIBLE_LINES || line == PRE_RENDER_LINE) && bus.rendering_enabled() {
            self.clock_counter(bus);
        }
    }

    fn mapper_id(&self) -> u16 {
        4
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("MMC3")
    }
}
