use std::{fs, path::Path};

use sha1::{Digest, Sha1};

use crate::{
    bus::MemoryMap,
    cartridge::header::{Header, NES_HEADER_LEN, TRAINER_SIZE},
    error::Error,
    memory::cpu as cpu_mem,
    ppu::Ppu,
    reset_kind::ResetKind,
    save::SaveRam,
};

pub mod header;
pub mod mapper;

pub use header::Mirroring;
pub use mapper::{Mapper, MapperBus, MapperCtor, MapperRegistry};

/// Immutable cartridge image: header, ROM sections and the save-storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    header: Header,
    prg: Box<[u8]>,
    chr: Box<[u8]>,
    trainer: Option<Box<[u8]>>,
    key: String,
}

impl Rom {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let header = Header::parse(bytes)?;
        let mut cursor = NES_HEADER_LEN;
        let trainer = if header.trainer {
            Some(section(bytes, &mut cursor, TRAINER_SIZE, "trainer")?)
        } else {
            None
        };
        let prg = section(bytes, &mut cursor, header.prg_rom_size(), "PRG ROM")?;
        let chr = section(bytes, &mut cursor, header.chr_rom_size(), "CHR ROM")?;

        Ok(Self {
            header,
            prg,
            chr,
            trainer,
            key: storage_key(bytes),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    /// CHR ROM bytes. Empty for boards with CHR RAM.
    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn trainer(&self) -> Option<&[u8]> {
        self.trainer.as_deref()
    }

    /// Lowercase hex SHA-1 of the whole image file.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A cartridge plugged into the console: image, board logic and PRG RAM.
#[derive(Debug)]
pub struct Cartridge {
    rom: Rom,
    board: Box<dyn Mapper>,
    /// Board as built, before any hook ran. Resets start again from here.
    pristine: Box<dyn Mapper>,
    save: SaveRam,
    irq: bool,
}

impl Cartridge {
    pub fn new(rom: Rom, board: Box<dyn Mapper>) -> Self {
        let mut save = SaveRam::new();
        if let Some(trainer) = rom.trainer() {
            save.load_at(
                (cpu_mem::TRAINER_START - cpu_mem::PRG_RAM_START) as usize,
                trainer,
            );
        }
        Self {
            rom,
            pristine: dyn_clone::clone_box(board.as_ref()),
            board,
            save,
            irq: false,
        }
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn header(&self) -> &Header {
        self.rom.header()
    }

    pub fn board(&self) -> &dyn Mapper {
        self.board.as_ref()
    }

    pub fn is_battery_backed(&self) -> bool {
        self.rom.header().battery
    }

    pub fn save_ram(&self) -> &SaveRam {
        &self.save
    }

    pub fn save_ram_mut(&mut self) -> &mut SaveRam {
        &mut self.save
    }

    /// IRQ line as driven by the board (scanline counters).
    pub fn irq_pending(&self) -> bool {
        self.irq
    }

    pub(crate) fn prg_byte(&self, offset: usize) -> Option<u8> {
        self.rom.prg().get(offset).copied()
    }

    /// Runs the board's `init` hook: initial banks and mirroring. The board
    /// state is rebuilt from the pristine copy first.
    pub(crate) fn init(&mut self, map: &mut MemoryMap, ppu: &mut Ppu, kind: ResetKind) {
        self.board = dyn_clone::clone_box(self.pristine.as_ref());
        self.irq = false;
        ppu.set_chr_writable(self.rom.chr().is_empty());
        self.dispatch(map, ppu, |board, bus| board.init(bus, kind));
    }

    /// Forwards a CPU write that landed in cartridge PRG space.
    pub(crate) fn write(&mut self, map: &mut MemoryMap, ppu: &mut Ppu, addr: u16, data: u8) {
        self.dispatch(map, ppu, |board, bus| board.write(bus, addr, data));
    }

    pub(crate) fn pre_scanline(&mut self, map: &mut MemoryMap, ppu: &mut Ppu, line: u16) {
        self.dispatch(map, ppu, |board, bus| board.pre_scanline(bus, line));
    }

    pub(crate) fn hblank(&mut self, map: &mut MemoryMap, ppu: &mut Ppu, line: u16) {
        self.dispatch(map, ppu, |board, bus| board.hblank(bus, line));
    }

    pub(crate) fn vblank(&mut self, map: &mut MemoryMap, ppu: &mut Ppu) {
        self.dispatch(map, ppu, |board, bus| board.vblank(bus));
    }

    fn dispatch<R>(
        &mut self,
        map: &mut MemoryMap,
        ppu: &mut Ppu,
        f: impl FnOnce(&mut dyn Mapper, &mut MapperBus<'_>) -> R,
    ) -> R {
        let Self {
            rom, board, irq, ..
        } = self;
        let mut bus = MapperBus::new(map, ppu, rom, irq);
        f(board.as_mut(), &mut bus)
    }
}

impl Clone for Cartridge {
    fn clone(&self) -> Self {
        Self {
            rom: self.rom.clone(),
            board: dyn_clone::clone_box(self.board.as_ref()),
            pristine: dyn_clone::clone_box(self.pristine.as_ref()),
            save: self.save.clone(),
            irq: self.irq,
        }
    }
}

/// Parses an image and builds the board registered for its mapper id.
pub fn load_cartridge(bytes: &[u8], registry: &MapperRegistry) -> Result<Cartridge, Error> {
    let rom = Rom::parse(bytes)?;
    let board = registry.build(rom.header().mapper, rom.header())?;
    Ok(Cartridge::new(rom, board))
}

/// Like [`load_cartridge`] but ignores the header's mapper id in favour of `mapper`.
pub fn load_cartridge_as(
    bytes: &[u8],
    registry: &MapperRegistry,
    mapper: u16,
) -> Result<Cartridge, Error> {
    let rom = Rom::parse(bytes)?;
    let board = registry.build(mapper, rom.header())?;
    Ok(Cartridge::new(rom, board))
}

/// Load a cartridge directly from disk.
pub fn load_cartridge_from_file<P>(path: P, registry: &MapperRegistry) -> Result<Cartridge, Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_cartridge(&bytes, registry)
}

fn storage_key(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

fn section(
    bytes: &[u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<Box<[u8]>, Error> {
    if len == 0 {
        return Ok(Box::default());
    }

    let too_short = || Error::SectionTooShort {
        section: name,
        expected: len,
        actual: bytes.len().saturating_sub(*cursor),
    };
    let end = cursor.checked_add(len).ok_or_else(too_short)?;
    let slice = bytes.get(*cursor..end).ok_or_else(too_short)?;

    *cursor = end;
    Ok(slice.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cartridge::header::{CHR_BANK_SIZE, PRG_BANK_SIZE},
        memory::ppu::Register as PpuRegister,
    };

    fn base_header(prg_banks: u8, chr_banks: u8, flags6: u8) -> [u8; NES_HEADER_LEN] {
        [
            b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]
    }

    #[test]
    fn loads_basic_nrom_cartridge() {
        let mut image = base_header(2, 1, 0).to_vec();
        image.extend(vec![0xAA; 2 * PRG_BANK_SIZE]);
        image.extend(vec![0x55; CHR_BANK_SIZE]);

        let cartridge = load_cartridge(&image, &MapperRegistry::default()).expect("cartridge");

        assert_eq!(cartridge.header().prg_banks, 2);
        assert_eq!(cartridge.board().mapper_id(), 0);
        assert_eq!(cartridge.rom().prg().len(), 2 * PRG_BANK_SIZE);
        assert_eq!(cartridge.rom().chr()[0], 0x55);
        assert_eq!(cartridge.rom().key().len(), 40);
    }

    #[test]
    fn clones_carry_their_own_board() {
        let mut image = base_header(2, 1, 0x10).to_vec();
        image.extend(vec![0xAA; 2 * PRG_BANK_SIZE]);
        image.extend(vec![0x55; CHR_BANK_SIZE]);
        let cartridge = load_cartridge(&image, &MapperRegistry::default()).expect("cartridge");

        let copy = cartridge.clone();
        assert_eq!(copy.board().mapper_id(), 1);
        assert_eq!(copy.rom(), cartridge.rom());
    }

    #[test]
    fn chr_rom_survives_data_port_writes() {
        let mut image = base_header(1, 1, 0).to_vec();
        image.extend(vec![0xAA; PRG_BANK_SIZE]);
        image.extend(vec![0x55; CHR_BANK_SIZE]);
        let mut cartridge = load_cartridge(&image, &MapperRegistry::default()).expect("cartridge");

        let mut map = MemoryMap::console();
        let mut ppu = Ppu::new();
        cartridge.init(&mut map, &mut ppu, ResetKind::PowerOn);
        ppu.write_register(PpuRegister::Addr, 0x00);
        ppu.write_register(PpuRegister::Addr, 0x00);
        ppu.write_register(PpuRegister::Data, 0x12);
        assert_eq!(ppu.read_byte(0x0000), 0x55);
    }

    #[test]
    fn trainer_lands_in_prg_ram() {
        let mut image = base_header(1, 0, 0b0000_0100).to_vec();
        image.extend(vec![0xFE; TRAINER_SIZE]);
        image.extend(vec![0xAA; PRG_BANK_SIZE]);

        let cartridge = load_cartridge(&image, &MapperRegistry::default()).expect("cartridge");

        let offset = (cpu_mem::TRAINER_START - cpu_mem::PRG_RAM_START) as usize;
        assert_eq!(cartridge.save_ram().read(offset), 0xFE);
        assert_eq!(cartridge.save_ram().read(offset - 1), 0x00);
        assert_eq!(cartridge.prg_byte(0), Some(0xAA));
    }

    #[test]
    fn errors_when_prg_section_missing() {
        let mut image = base_header(1, 0, 0).to_vec();
        image.extend(vec![0xAA; 1024]);

        let err = load_cartridge(&image, &MapperRegistry::default()).expect_err("short PRG");
        assert!(matches!(
            err,
            Error::SectionTooShort {
                section: "PRG ROM",
                expected: PRG_BANK_SIZE,
                actual: 1024,
            }
        ));
    }

    #[test]
    fn unknown_mapper_is_fatal() {
        let mut image = base_header(1, 0, 0xF0).to_vec();
        image[7] = 0xF0;
        image.extend(vec![0; PRG_BANK_SIZE]);

        let err = load_cartridge(&image, &MapperRegistry::default()).expect_err("mapper 255");
        assert!(matches!(err, Error::UnsupportedMapper(255)));
    }

    #[test]
    fn identical_images_share_a_storage_key() {
        let mut image = base_header(1, 0, 0).to_vec();
        image.extend(vec![0x11; PRG_BANK_SIZE]);
        let a = Rom::parse(&image).expect("rom");
        let b = Rom::parse(&image).expect("rom");
        image[NES_HEADER_LEN] = 0x12;
        let c = Rom::parse(&image).expect("rom");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}
