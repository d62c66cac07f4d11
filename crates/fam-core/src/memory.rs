//! Shared definitions for the console memory map.
//!
//! Address constants live here so the bus, the mappers and the tests agree on
//! one hardware layout instead of scattering magic numbers.

/// CPU address space layout.
pub mod cpu {
    /// First address of the hardware stack page.
    pub const STACK_PAGE_START: u16 = 0x0100;

    /// Reset vector (`$FFFC/$FFFD`).
    pub const RESET_VECTOR: u16 = 0xFFFC;
    /// NMI vector (`$FFFA/$FFFB`).
    pub const NMI_VECTOR: u16 = 0xFFFA;
    /// IRQ/BRK vector (`$FFFE/$FFFF`).
    pub const IRQ_VECTOR: u16 = 0xFFFE;

    /// Size of the CPU internal RAM block (2 KiB mirrored through `$1FFF`).
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    /// Number of internal RAM mirrors below `$2000`.
    pub const INTERNAL_RAM_MIRRORS: u16 = 4;

    /// PPU register window, eight registers mirrored every 8 bytes.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    pub const PPU_REGISTER_END: u16 = 0x3FFF;

    /// APU and I/O register window.
    pub const APU_IO_BASE: u16 = 0x4000;
    pub const APU_IO_END: u16 = 0x401F;

    /// Sprite DMA trigger (`$4014`).
    pub const OAM_DMA: u16 = 0x4014;
    /// APU status register (`$4015`).
    pub const APU_STATUS: u16 = 0x4015;
    /// Controller port 1 strobe/read address (`$4016`).
    pub const CONTROLLER_PORT_1: u16 = 0x4016;
    /// Controller port 2 read, frame counter write (`$4017`).
    pub const CONTROLLER_PORT_2: u16 = 0x4017;

    /// Expansion area with nothing attached.
    pub const EXPANSION_BASE: u16 = 0x4020;
    pub const EXPANSION_END: u16 = 0x5FFF;

    /// Battery-backed PRG RAM window.
    pub const PRG_RAM_START: u16 = 0x6000;
    pub const PRG_RAM_END: u16 = 0x7FFF;
    pub const PRG_RAM_SIZE: usize = 0x2000;
    /// Trainer images are copied to this address at load time.
    pub const TRAINER_START: u16 = 0x7000;

    /// Cartridge PRG ROM window.
    pub const PRG_ROM_START: u16 = 0x8000;
    pub const PRG_ROM_END: u16 = 0xFFFF;

    /// Cycles the CPU is stalled while a sprite DMA copies 256 bytes.
    pub const OAM_DMA_CYCLES: u32 = 513;
}

/// PPU address space layout.
pub mod ppu {
    /// The PPU decodes 14 address bits.
    pub const ADDR_MASK: u16 = 0x3FFF;

    pub const PATTERN_TABLE_SIZE: usize = 0x1000;
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;

    pub const NAMETABLE_BASE: u16 = 0x2000;
    pub const NAMETABLE_SIZE: usize = 0x0400;
    /// Offset of the attribute table inside each nametable.
    pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;

    pub const PALETTE_BASE: u16 = 0x3F00;
    pub const PALETTE_SIZE: usize = 0x20;

    pub const OAM_SIZE: usize = 0x100;

    /// Mask selecting the register behind a CPU address in `$2000-$3FFF`.
    pub const REGISTER_SELECT_MASK: u16 = 0x0007;

    /// CPU-visible PPU registers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` - PPUCTRL
        Control = 0x2000,
        /// `$2001` - PPUMASK
        Mask = 0x2001,
        /// `$2002` - PPUSTATUS
        Status = 0x2002,
        /// `$2003` - OAMADDR
        OamAddr = 0x2003,
        /// `$2004` - OAMDATA
        OamData = 0x2004,
        /// `$2005` - PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` - PPUADDR
        Addr = 0x2006,
        /// `$2007` - PPUDATA
        Data = 0x2007,
    }

    impl Register {
        /// Resolves the register for a device-local offset (any value, the
        /// low three bits select the register).
        pub const fn from_offset(offset: usize) -> Self {
            match offset as u16 & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}

/// APU register layout.
pub mod apu {
    /// CPU-visible APU registers in `$4000-$4017`.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        Pulse1Control = 0x4000,
        Pulse1Sweep = 0x4001,
        Pulse1TimerLow = 0x4002,
        Pulse1TimerHigh = 0x4003,
        Pulse2Control = 0x4004,
        Pulse2Sweep = 0x4005,
        Pulse2TimerLow = 0x4006,
        Pulse2TimerHigh = 0x4007,
        TriangleLinear = 0x4008,
        TriangleTimerLow = 0x400A,
        TriangleTimerHigh = 0x400B,
        NoiseControl = 0x400C,
        NoisePeriod = 0x400E,
        NoiseLength = 0x400F,
        DmcControl = 0x4010,
        DmcDirectLoad = 0x4011,
        DmcAddress = 0x4012,
        DmcLength = 0x4013,
        Status = 0x4015,
        FrameCounter = 0x4017,
    }

    impl Register {
        /// Resolves a CPU address to an APU register.
        ///
        /// Returns `None` for the unused holes and for `$4014`/`$4016`, which
        /// belong to sprite DMA and the controllers.
        pub const fn from_cpu_addr(addr: u16) -> Option<Self> {
            Some(match addr {
                0x4000 => Self::Pulse1Control,
                0x4001 => Self::Pulse1Sweep,
                0x4002 => Self::Pulse1TimerLow,
                0x4003 => Self::Pulse1TimerHigh,
                0x4004 => Self::Pulse2Control,
                0x4005 => Self::Pulse2Sweep,
                0x4006 => Self::Pulse2TimerLow,
                0x4007 => Self::Pulse2TimerHigh,
                0x4008 => Self::TriangleLinear,
                0x400A => Self::TriangleTimerLow,
                0x400B => Self::TriangleTimerHigh,
                0x400C => Self::NoiseControl,
                0x400E => Self::NoisePeriod,
                0x400F => Self::NoiseLength,
                0x4010 => Self::DmcControl,
                0x4011 => Self::DmcDirectLoad,
                0x4012 => Self::DmcAddress,
                0x4013 => Self::DmcLength,
                0x4015 => Self::Status,
                0x4017 => Self::FrameCounter,
                _ => return None,
            })
        }
    }
}
