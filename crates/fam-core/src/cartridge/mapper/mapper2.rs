//! Mapper 2 (UxROM): switchable 16 KiB bank at `$8000`, last bank fixed at
//! `$C000`, 8 KiB CHR RAM.

use std::borrow::Cow;

use crate::{
    cartridge::mapper::{CHR_BANK_8K, Mapper, MapperBus, PRG_BANK_16K},
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

#[derive(Debug, Clone, Default)]
pub struct Mapper2 {
    bank: u8,
}

impl Mapper2 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mapper for Mapper2 {
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind) {
        if kind == ResetKind::PowerOn {
            self.bank = 0;
        }
        let last = bus.prg_bank_count(PRG_BANK_16K) - 1;
        bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, self.bank as usize);
        bus.map_prg(0xC000, PRG_BANK_16K, last);
        bus.load_chr(0x0000, CHR_BANK_8K, 0);
        let mirroring = bus.header_mirroring();
        bus.set_mirroring(mirroring);
    }

    fn write(&mut self, bus: &mut MapperBus<'_>, _addr: u16, data: u8) {
        self.bank = data;
        bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, data as usize);
    }

    fn mapper_id(&self) -> u16 {
        2
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("UxROM")
    }
}
