use std::{borrow::Cow, collections::BTreeMap, fmt::Debug};

use dyn_clone::DynClone;
use tracing::{debug, warn};

use crate::{
    bus::{Device, MemoryMap},
    cartridge::{
        Rom,
        header::{Header, Mirroring},
    },
    error::Error,
    ppu::Ppu,
    reset_kind::ResetKind,
};

pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper3;
pub mod mapper4;
pub mod mapper7;

pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper4::Mapper4;
pub use mapper7::Mapper7;

pub(crate) const PRG_BANK_8K: usize = 8 * 1024;
pub(crate) const PRG_BANK_16K: usize = 16 * 1024;
pub(crate) const PRG_BANK_32K: usize = 32 * 1024;
pub(crate) const CHR_BANK_1K: usize = 1024;
pub(crate) const CHR_BANK_2K: usize = 2 * 1024;
pub(crate) const CHR_BANK_4K: usize = 4 * 1024;
pub(crate) const CHR_BANK_8K: usize = 8 * 1024;

/// Cartridge board logic.
///
/// Boards never read ROM themselves: they program the CPU memory map with
/// PRG windows and copy CHR banks into the PPU pattern tables through the
/// [`MapperBus`] handed to every hook. Hooks other than `init` and `write`
/// are optional.
pub trait Mapper: DynClone + Debug + Send {
    /// Installs the initial PRG/CHR banks and mirroring.
    fn init(&mut self, bus: &mut MapperBus<'_>, kind: ResetKind);

    /// Called for every CPU write that lands in `$8000-$FFFF`.
    fn write(&mut self, bus: &mut MapperBus<'_>, addr: u16, data: u8);

    /// Runs before the PPU renders `line`.
    fn pre_scanline(&mut self, _bus: &mut MapperBus<'_>, _line: u16) {}

    /// Runs after the PPU rendered `line`, before the CPU executes it.
    fn hblank(&mut self, _bus: &mut MapperBus<'_>, _line: u16) {}

    /// Runs once per frame at the start of line 241.
    fn vblank(&mut self, _bus: &mut MapperBus<'_>) {}

    fn mapper_id(&self) -> u16;

    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(format!("Mapper {}", self.mapper_id()))
    }
}

dyn_clone::clone_trait_object!(Mapper);

/// Capability view handed to board hooks.
///
/// Borrows the CPU memory map, the PPU and the image for the duration of one
/// hook call; boards keep no references between calls.
#[derive(Debug)]
pub struct MapperBus<'a> {
    map: &'a mut MemoryMap,
    ppu: &'a mut Ppu,
    rom: &'a Rom,
    irq: &'a mut bool,
}

impl<'a> MapperBus<'a> {
    pub(crate) fn new(
        map: &'a mut MemoryMap,
        ppu: &'a mut Ppu,
        rom: &'a Rom,
        irq: &'a mut bool,
    ) -> Self {
        Self { map, ppu, rom, irq }
    }

    /// Mirroring advertised by the header.
    pub fn header_mirroring(&self) -> Mirroring {
        self.rom.header().mirroring
    }

    /// Number of `size`-byte PRG banks, at least one.
    pub fn prg_bank_count(&self, size: usize) -> usize {
        (self.rom.prg().len() / size).max(1)
    }

    /// Number of `size`-byte CHR ROM banks; zero for CHR RAM boards.
    pub fn chr_bank_count(&self, size: usize) -> usize {
        self.rom.chr().len() / size
    }

    pub fn has_chr_ram(&self) -> bool {
        self.rom.chr().is_empty()
    }

    /// Maps PRG bank `bank` (in `size` units, wrapped) at CPU address `start`.
    pub fn map_prg(&mut self, start: u16, size: usize, bank: usize) {
        let bank = bank % self.prg_bank_count(size);
        let end = start as usize + size - 1;
        if end > u16::MAX as usize {
            warn!(start, size, "PRG window runs past $FFFF");
            return;
        }
        self.map.map_range(Device::Prg, start..=end as u16, bank * size);
    }

    /// Copies CHR ROM bank `bank` (in `size` units, wrapped) into the PPU
    /// pattern tables at `ppu_addr`. CHR RAM boards keep their pattern data
    /// in the PPU, so the call does nothing for them.
    pub fn load_chr(&mut self, ppu_addr: u16, size: usize, bank: usize) {
        let count = self.chr_bank_count(size);
        if count == 0 {
            return;
        }
        let offset = (bank % count) * size;
        match self.rom.chr().get(offset..offset + size) {
            Some(data) => self.ppu.write_block(ppu_addr, data),
            None => debug!(bank, size, "CHR bank outside image"),
        }
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.ppu.set_mirroring(mirroring);
    }

    /// Drives the cartridge IRQ line.
    pub fn set_irq(&mut self, asserted: bool) {
        *self.irq = asserted;
    }

    pub fn irq(&self) -> bool {
        *self.irq
    }

    /// Whether the PPU is fetching background or sprite tiles.
    pub fn rendering_enabled(&self) -> bool {
        self.ppu.rendering_enabled()
    }
}

/// Constructor for a board given the parsed header.
pub type MapperCtor = fn(&Header) -> Box<dyn Mapper>;

/// Compiled registry of board implementations selected by mapper id.
///
/// The built-in boards are always present; hosts can register further
/// constructors (or override built-ins) before loading a cartridge.
#[derive(Debug, Clone, Default)]
pub struct MapperRegistry {
    extra: BTreeMap<u16, MapperCtor>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: u16, ctor: MapperCtor) -> &mut Self {
        self.extra.insert(id, ctor);
        self
    }

    pub fn supports(&self, id: u16) -> bool {
        self.extra.contains_key(&id) || builtin(id).is_some()
    }

    pub fn build(&self, id: u16, header: &Header) -> Result<Box<dyn Mapper>, Error> {
        let ctor = self
            .extra
            .get(&id)
            .copied()
            .or_else(|| builtin(id))
            .ok_or(Error::UnsupportedMapper(id))?;
        let board = ctor(header);
        debug!(id, name = %board.name(), "built cartridge board");
        Ok(board)
    }
}

fn builtin(id: u16) -> Option<MapperCtor> {
    Some(match id {
        0 => build::<Mapper0>,
        1 => build::<Mapper1>,
        2 => build::<Mapper2>,
        3 => build::<Mapper3>,
        4 => build::<Mapper4>,
        7 => build::<Mapper7>,
        _ => return None,
    })
}

fn build<M: Mapper + Default + 'static>(_header: &Header) -> Box<dyn Mapper> {
    Box::new(M::default())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::header::Header;

    #[derive(Debug, Clone)]
    struct Custom;

    impl Mapper for Custom {
        fn init(&mut self, bus: &mut MapperBus<'_>, _kind: ResetKind) {
            bus.map_prg(0x8000, PRG_BANK_32K, 0);
        }

        fn write(&mut self, _bus: &mut MapperBus<'_>, _addr: u16, _data: u8) {}

        fn mapper_id(&self) -> u16 {
            1234
        }
    }

    fn custom(_header: &Header) -> Box<dyn Mapper> {
        Box::new(Custom)
    }

    fn header(mapper: u16) -> Header {
        Header {
            prg_banks: 2,
            chr_banks: 1,
            mapper,
            mirroring: Mirroring::Horizontal,
            battery: false,
            trainer: false,
        }
    }

    #[test]
    fn builtin_boards_are_registered() {
        let registry = MapperRegistry::new();
        for id in [0, 1, 2, 3, 4, 7] {
            let board = registry.build(id, &header(id)).expect("builtin");
            assert_eq!(board.mapper_id(), id);
        }
        assert!(!registry.supports(5));
    }

    #[test]
    fn registered_constructors_extend_the_registry() {
        let mut registry = MapperRegistry::new();
        registry.register(1234, custom);
        let board = registry.build(1234, &header(1234)).expect("custom");
        assert_eq!(board.name(), "Mapper 1234");
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let err = MapperRegistry::new()
            .build(99, &header(99))
            .expect_err("unknown");
        assert!(matches!(err, Error::UnsupportedMapper(99)));
    }
}
