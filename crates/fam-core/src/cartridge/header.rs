//! iNES header parsing.
//!
//! ```text
//! Offset  Meaning
//! ------  -----------------------------------------------------------
//! 0-3     "NES" followed by MS-DOS EOF (0x1A)
//! 4       PRG ROM size in 16 KiB units
//! 5       CHR ROM size in 8 KiB units (0 means 8 KiB of CHR RAM)
//! 6       Flags 6: mirroring, battery, trainer, four-screen, mapper low nibble
//! 7       Flags 7: mapper high nibble (the low nibble is ignored here)
//! 8-15    Unused by the boards this core implements
//! ```

use bitflags::bitflags;

use crate::error::Error;

/// Size of the fixed header.
pub const NES_HEADER_LEN: usize = 16;
/// Size of the optional trainer block that sits between header and PRG.
pub const TRAINER_SIZE: usize = 512;
/// PRG ROM unit advertised by byte 4.
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM unit advertised by byte 5.
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const MIRRORING        = 0b0000_0001;
        const BATTERY          = 0b0000_0010;
        const TRAINER          = 0b0000_0100;
        const FOUR_SCREEN      = 0b0000_1000;
        const MAPPER_LOW_MASK  = 0b1111_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const MAPPER_HIGH_MASK = 0b1111_0000;
    }
}

/// Nametable layout selected by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// `$2000=$2400`, `$2800=$2C00` (vertical scrolling games).
    Horizontal,
    /// `$2000=$2800`, `$2400=$2C00` (horizontal scrolling games).
    Vertical,
    /// All four logical tables share the first physical table.
    SingleScreenLower,
    /// All four logical tables share the second physical table.
    SingleScreenUpper,
    /// Cartridge supplies the extra 2 KiB, every table is distinct.
    FourScreen,
}

impl TryFrom<u8> for Mirroring {
    type Error = u8;

    /// Numeric mode codes as used by [`crate::ppu::Ppu::set_mirroring_code`].
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Horizontal,
            1 => Self::Vertical,
            2 => Self::SingleScreenLower,
            3 => Self::SingleScreenUpper,
            4 => Self::FourScreen,
            other => return Err(other),
        })
    }
}

/// Parsed header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// PRG ROM bank count in 16 KiB units.
    pub prg_banks: usize,
    /// CHR ROM bank count in 8 KiB units; zero selects CHR RAM.
    pub chr_banks: usize,
    pub mapper: u16,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub trainer: bool,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < NES_HEADER_LEN {
            return Err(Error::TooShort {
                actual: bytes.len(),
            });
        }
        if &bytes[0..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let flags6 = Flags6::from_bits_truncate(bytes[6]);
        let flags7 = Flags7::from_bits_truncate(bytes[7]);

        Ok(Self {
            prg_banks: bytes[4] as usize,
            chr_banks: bytes[5] as usize,
            mapper: combine_mapper(flags6, flags7),
            mirroring: resolve_mirroring(flags6),
            battery: flags6.contains(Flags6::BATTERY),
            trainer: flags6.contains(Flags6::TRAINER),
        })
    }

    pub fn prg_rom_size(&self) -> usize {
        self.prg_banks * PRG_BANK_SIZE
    }

    pub fn chr_rom_size(&self) -> usize {
        self.chr_banks * CHR_BANK_SIZE
    }
}

fn resolve_mirroring(flags6: Flags6) -> Mirroring {
    if flags6.contains(Flags6::FOUR_SCREEN) {
        Mirroring::FourScreen
    } else if flags6.contains(Flags6::MIRRORING) {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    }
}

fn combine_mapper(flags6: Flags6, flags7: Flags7) -> u16 {
    let lower = (flags6 & Flags6::MAPPER_LOW_MASK).bits() >> 4;
    let upper = (flags7 & Flags7::MAPPER_HIGH_MASK).bits();
    (upper | lower) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_mapper_nibbles() {
        let bytes = [
            b'N', b'E', b'S', 0x1A, 2, 1, 0b0100_0111, 0b0001_0000, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let header = Header::parse(&bytes).expect("header");
        assert_eq!(header.prg_banks, 2);
        assert_eq!(header.chr_banks, 1);
        assert_eq!(header.mapper, 0x14);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(header.battery);
        assert!(header.trainer);
        assert_eq!(header.prg_rom_size(), 32 * 1024);
    }

    #[test]
    fn four_screen_wins_over_mirroring_bit() {
        let mut bytes = [0u8; NES_HEADER_LEN];
        bytes[..4].copy_from_slice(NES_MAGIC);
        bytes[6] = 0b0000_1001;
        let header = Header::parse(&bytes).expect("header");
        assert_eq!(header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = [0u8; NES_HEADER_LEN];
        bytes[..4].copy_from_slice(b"NES\x00");
        assert!(matches!(Header::parse(&bytes), Err(Error::InvalidMagic)));
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(matches!(
            Header::parse(b"NES\x1A"),
            Err(Error::TooShort { actual: 4 })
        ));
    }

    #[test]
    fn mirroring_codes_outside_the_table_are_rejected() {
        assert_eq!(Mirroring::try_from(1), Ok(Mirroring::Vertical));
        assert_eq!(Mirroring::try_from(9), Err(9));
    }
}
