//! Mapper 3 (CNROM): fixed PRG like NROM, switchable 8 KiB CHR bank.

use std::borrow::Cow;

use crate::{
    cartridge::mapper::{CHR_BANK_8K, Mapper, MapperBus, PRG_BANK_16K},
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

#[derive(Debug, Clone, Default)]
pub struct Mapper3 {
    chr_bank: u8,
}

impl Mapper3 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mapper for Mapper3 {
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind) {
        if kind == ResetKind::PowerOn {
            self.chr_bank = 0;
        }
        let last = bus.prg_bank_count(PRG_BANK_16K) - 1;
        bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, 0);
        bus.map_prg(0xC000, PRG_BANK_16K, last);
        bus.load_chr(0x0000, CHR_BANK_8K, self.chr_bank as usize);
        let mirroring = bus.header_mirroring();
        bus.set_mirroring(mirroring);
    }

    fn write(&mut self, bus: &mut MapperBus<'_>, _addr: u16, data: u8) {
        self.chr_bank = data;
        bus.load_chr(0x0000, CHR_BANK_8K, data as usize);
    }

    fn mapper_id(&self) -> u16 {
        3
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("CNROM")
    }
}
