//! Mapper 1 (MMC1 / SxROM).
//!
//! Registers are programmed one bit at a time through a 5-bit serial shift
//! register. Any write with bit 7 set clears the shift register and forces
//! PRG mode 3; otherwise bit 0 is shifted in LSB first and the fifth write
//! commits the value to the register selected by address bits 13-14:
//!
//! | Address       | Register | Meaning                                       |
//! |---------------|----------|-----------------------------------------------|
//! | `$8000-$9FFF` | control  | mirroring (bits 0-1), PRG mode (2-3), CHR mode (4) |
//! | `$A000-$BFFF` | CHR 0    | 4 KiB bank at `$0000` (or 8 KiB bank, low bit ignored) |
//! | `$C000-$DFFF` | CHR 1    | 4 KiB bank at `$1000` (4 KiB mode only)       |
//! | `$E000-$FFFF` | PRG      | 16/32 KiB PRG bank                            |

use std::borrow::Cow;

use tracing::trace;

use crate::{
    cartridge::{
        Mirroring,
        mapper::{CHR_BANK_4K, CHR_BANK_8K, Mapper, MapperBus, PRG_BANK_16K},
    },
    memory::cpu as cpu_mem,
    reset_kind::ResetKind,
};

const RESET_BIT: u8 = 0x80;
/// PRG mode 3 (fix last bank at `$C000`), forced by a shift-register reset.
const CONTROL_RESET_BITS: u8 = 0x0C;
const CHR_4K_MODE: u8 = 0x10;

#[derive(Debug, Clone)]
pub struct Mapper1 {
    shift: u8,
    count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Default for Mapper1 {
    fn default() -> Self {
        Self {
            shift: 0,
            count: 0,
            control: CONTROL_RESET_BITS,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }
}

impl Mapper1 {
    pub fn new() -> Self {
        Self::default()
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    fn apply_prg(&self, bus: &mut MapperBus<'_>) {
        let bank = (self.prg_bank & 0x0F) as usize;
        let last = bus.prg_bank_count(PRG_BANK_16K) - 1;
        match (self.control >> 2) & 0b11 {
            // 32 KiB mode ignores the low bit of the bank number.
            0 | 1 => {
                bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, bank & !1);
                bus.map_prg(0xC000, PRG_BANK_16K, bank | 1);
            }
            2 => {
                bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, 0);
                bus.map_prg(0xC000, PRG_BANK_16K, bank);
            }
            _ => {
                bus.map_prg(cpu_mem::PRG_ROM_START, PRG_BANK_16K, bank);
                bus.map_prg(0xC000, PRG_BANK_16K, last);
            }
        }
    }

    fn apply_chr(&self, bus: &mut MapperBus<'_>) {
        if self.control & CHR_4K_MODE != 0 {
            bus.load_chr(0x0000, CHR_BANK_4K, self.chr_bank0 as usize);
            bus.load_chr(0x1000, CHR_BANK_4K, self.chr_bank1 as usize);
        } else {
            bus.load_chr(0x0000, CHR_BANK_8K, (self.chr_bank0 >> 1) as usize);
        }
    }

    fn apply_all(&self, bus: &mut MapperBus<'_>) {
        bus.set_mirroring(self.mirroring());
        self.apply_prg(bus);
        self.apply_chr(bus);
    }

    fn commit(&mut self, bus: &mut MapperBus<'_>, addr: u16, value: u8) {
        match (addr >> 13) & 0b11 {
            0 => {
                self.control = value;
                self.apply_all(bus);
            }
            1 => {
                self.chr_bank0 = value;
                self.apply_chr(bus);
            }
            2 => {
                self.chr_bank1 = value;
                self.apply_chr(bus);
            }
            _ => {
                self.prg_bank = value;
                self.apply_prg(bus);
            }
        }
        trace!(addr, value, control = self.control, "MMC1 register commit");
    }
}

impl Mapper for Mapper1 {
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind) {
        match kind {
            ResetKind::PowerOn => {
                *self = Self::default();
                // Mirroring follows the header until the first control write.
                self.control |= match bus.header_mirroring() {
                    Mirroring::Vertical => 0b10,
                    _ => 0b11,
                };
            }
            ResetKind::Soft => {
                self.shift = 0;
                self.count = 0;
                self.control |= CONTROL_RESET_BITS;
            }
        }
        self.apply_all(bus);
    }

    fn write(&mut self, bus: &mut MapperBus<'_>, addr: u16, data: u8) {
        if data & RESET_BIT != 0 {
            self.shift = 0;
            self.count = 0;
            self.control |= CONTROL_RESET_BITS;
            self.apply_prg(bus);
            return;
        }

        self.shift |= (data & 1) << self.count;
        self.count += 1;
        if self.count == 5 {
            let value = self.shift;
            self.shift = 0;
            self.count = 0;
            self.commit(bus, addr, value);
        }
    }

    fn mapper_id(&self) -> u16 {
        1
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("MMC1")
    }
}

#[cfg(test)]
mod tests {
    use crate::cartridge::{Mirroring, mapper::test_support::*};

    fn serial_write(board: &mut Board, addr: u16, value: u8) {
        board.write(addr, 0x80);
        for bit in 0..5 {
            board.write(addr, (value >> bit) & 1);
        }
    }

    #[test]
    fn power_on_fixes_last_bank() {
        let board = Board::new(banked_rom(1, 8, 2, 0));
        assert_eq!(board.prg_kb(0x8000), 0);
        assert_eq!(board.prg_kb(0xC000), 7 * 16);
    }

    #[test]
    fn power_on_mirroring_comes_from_the_header() {
        let board = Board::new(banked_rom(1, 2, 1, 0x01));
        assert_eq!(board.ppu.mirroring(), Mirroring::Vertical);
        let board = Board::new(banked_rom(1, 2, 1, 0x00));
        assert_eq!(board.ppu.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn control_low_bits_select_mirroring() {
        let mut board = Board::new(banked_rom(1, 2, 1, 0));
        let expected = [
            Mirroring::SingleScreenLower,
            Mirroring::SingleScreenUpper,
            Mirroring::Vertical,
            Mirroring::Horizontal,
        ];
        for (mode, mirroring) in expected.into_iter().enumerate() {
            serial_write(&mut board, 0x8000, 0x0C | mode as u8);
            assert_eq!(board.ppu.mirroring(), mirroring, "mode {mode}");
        }
    }

    #[test]
    fn bit_seven_discards_partial_writes() {
        let mut board = Board::new(banked_rom(1, 2, 1, 0));
        board.write(0x8000, 1);
        board.write(0x8000, 1);
        // Reset mid-sequence, then a clean 5-bit write of 0b00010 (vertical).
        board.write(0x8000, 0x80);
        for bit in [0, 1, 0, 0, 0] {
            board.write(0x9FFF, bit);
        }
        assert_eq!(board.ppu.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn prg_modes() {
        let mut board = Board::new(banked_rom(1, 8, 2, 0));

        serial_write(&mut board, 0xE000, 5);
        assert_eq!(board.prg_kb(0x8000), 5 * 16);
        assert_eq!(board.prg_kb(0xC000), 7 * 16);

        // Mode 2: first bank fixed, switch $C000.
        serial_write(&mut board, 0x8000, 0b01000);
        assert_eq!(board.prg_kb(0x8000), 0);
        assert_eq!(board.prg_kb(0xC000), 5 * 16);

        // Mode 0: 32 KiB, low bit ignored.
        serial_write(&mut board, 0x8000, 0b00000);
        assert_eq!(board.prg_kb(0x8000), 4 * 16);
        assert_eq!(board.prg_kb(0xC000), 5 * 16);
    }

    #[test]
    fn chr_modes() {
        let mut board = Board::new(banked_rom(1, 2, 4, 0));

        // 4 KiB mode: two independent halves.
        serial_write(&mut board, 0x8000, 0b11100);
        serial_write(&mut board, 0xA000, 3);
        serial_write(&mut board, 0xC000, 6);
        assert_eq!(board.chr_kb(0x0000), 12);
        assert_eq!(board.chr_kb(0x1000), 24);

        // 8 KiB mode uses CHR 0 with the low bit ignored.
        serial_write(&mut board, 0x8000, 0b01100);
        serial_write(&mut board, 0xA000, 5);
        assert_eq!(board.chr_kb(0x0000), 16);
        assert_eq!(board.chr_kb(0x1000), 20);
    }
}
