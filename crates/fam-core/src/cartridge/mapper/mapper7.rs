//! Mapper 7 (AxROM): 32 KiB PRG switching plus single-screen mirroring select.

use std::borrow::Cow;

use crate::{
    cartridge::{
        Mirroring,
        mapper::{CHR_BANK_8K, Mapper, MapperBus, PRG_BANK_16K},
    },
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

const BANK_MASK: u8 = 0x07;
const SCREEN_SELECT: u8 = 0x10;

#[derive(Debug, Clone, Default)]
pub struct Mapper7 {
    select: u8,
}

impl Mapper7 {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, bus: &mut MapperBus<'_>) {
        let bank = (self.select & BANK_MASK) as usize;
        bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, bank * 2);
        bus.map_prg(0xC000, PRG_BANK_16K, bank * 2 + 1);
        bus.set_mirroring(if self.select & SCREEN_SELECT != 0 {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        });
    }
}

impl Mapper for Mapper7 {
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind) {
        if kind == ResetKind::PowerOn {
            self.select = 0;
        }
        bus.load_chr(0x0000, CHR_BANK_8K, 0);
        self.apply(bus);
    }

    fn write(&mut self, bus: &mut MapperBus<'_>, _addr: u16, data: u8) {
        self.select = data;
        self.apply(bus);
    }

    fn mapper_id(&self) -> u16 {
        7
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("AxROM")
    }
}
