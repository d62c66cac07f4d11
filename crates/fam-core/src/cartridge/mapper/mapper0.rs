//! Mapper 0 (NROM): fixed 16 or 32 KiB PRG and 8 KiB CHR, no registers.

use std::borrow::Cow;

use tracing::trace;

use crate::{
    cartridge::mapper::{CHR_BANK_8K, Mapper, MapperBus, PRG_BANK_16K},
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

/// `$C000` shows the last 16 KiB bank, so NROM-128 images mirror their
/// single bank into both halves.
#[derive(Debug, Clone, Default)]
pub struct Mapper0;

impl Mapper0 {
    pub fn new() -> Self {
        Self
    }
}

impl Mapper for Mapper0 {
    fn init(&mut self, bus: &mut MapperBus<'_>, _kind: ResetKind) {
        let last = bus.prg_bank_count(PRG_BANK_16K) - 1;
        bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, 0);
        bus.map_prg(0xC000, PRG_BANK_16K, last);
        bus.load_chr(0x0000, CHR_BANK_8K, 0);
        let mirroring = bus.header_mirroring();
        bus.set_mirroring(mirroring);
    }

    fn write(&mut self, _bus: &mut MapperBus<'_>, addr: u16, data: u8) {
        trace!(addr, data, "NROM ignores PRG writes");
    }

    fn mapper_id(&self) -> u16 {
        0
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("NROM")
    }
}
