//! CPU-visible PPU register state and the loopy scroll latches.

use bitflags::bitflags;

use crate::memory::ppu as ppu_mem;

bitflags! {
    /// `$2000` PPUCTRL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Control: u8 {
        const NAMETABLE        = 0b0000_0011;
        const INCREMENT_32     = 0b0000_0100;
        const SPRITE_TABLE     = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16   = 0b0010_0000;
        const MASTER_SLAVE     = 0b0100_0000;
        const GENERATE_NMI     = 0b1000_0000;
    }
}

impl Control {
    pub(crate) fn nametable_index(self) -> u8 {
        self.bits() & Control::NAMETABLE.bits()
    }

    /// Step applied to `v` after every `$2007` access.
    pub(crate) fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) { 32 } else { 1 }
    }

    pub(crate) fn sprite_table(self) -> u16 {
        if self.contains(Control::SPRITE_TABLE) {
            ppu_mem::PATTERN_TABLE_SIZE as u16
        } else {
            0
        }
    }

    pub(crate) fn background_table(self) -> u16 {
        if self.contains(Control::BACKGROUND_TABLE) {
            ppu_mem::PATTERN_TABLE_SIZE as u16
        } else {
            0
        }
    }

    pub(crate) fn sprite_height(self) -> u16 {
        if self.contains(Control::SPRITE_SIZE_16) { 16 } else { 8 }
    }

    pub(crate) fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}

bitflags! {
    /// `$2001` PPUMASK.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// B G R S B s b g
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Mask: u8 {
        const GRAYSCALE            = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT    = 0b0000_0100;
        const SHOW_BACKGROUND      = 0b0000_1000;
        const SHOW_SPRITES         = 0b0001_0000;
        const EMPHASIZE_RED        = 0b0010_0000;
        const EMPHASIZE_GREEN      = 0b0100_0000;
        const EMPHASIZE_BLUE       = 0b1000_0000;
    }
}

impl Mask {
    pub(crate) fn rendering_enabled(self) -> bool {
        self.intersects(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }

    /// Background pixel visible at column `x` after left-edge clipping.
    pub(crate) fn background_at(self, x: usize) -> bool {
        self.contains(Mask::SHOW_BACKGROUND) && (x >= 8 || self.contains(Mask::SHOW_BACKGROUND_LEFT))
    }

    /// Sprite pixel visible at column `x` after left-edge clipping.
    pub(crate) fn sprites_at(self, x: usize) -> bool {
        self.contains(Mask::SHOW_SPRITES) && (x >= 8 || self.contains(Mask::SHOW_SPRITES_LEFT))
    }

    pub(crate) fn emphasis(self) -> Mask {
        self & (Mask::EMPHASIZE_RED | Mask::EMPHASIZE_GREEN | Mask::EMPHASIZE_BLUE)
    }
}

bitflags! {
    /// `$2002` PPUSTATUS. The low five bits read back as open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct Status: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VERTICAL_BLANK  = 0b1000_0000;
    }
}

/// 15-bit loopy VRAM address.
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X
/// ||| || +++++-------- coarse Y
/// ||| ++-------------- nametable select
/// +++----------------- fine Y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct VramAddr(u16);

impl VramAddr {
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE: u16 = 0x0C00;
    const NAMETABLE_X: u16 = 0x0400;
    const NAMETABLE_Y: u16 = 0x0800;
    const FINE_Y: u16 = 0x7000;
    const HORIZONTAL: u16 = Self::COARSE_X | Self::NAMETABLE_X;

    pub(crate) fn new(raw: u16) -> Self {
        Self(raw & 0x7FFF)
    }

    pub(crate) fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    pub(crate) fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    pub(crate) fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_X) | (u16::from(value) & 0x1F);
    }

    fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((u16::from(value) & 0x1F) << 5);
    }

    fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::FINE_Y) | ((u16::from(value) & 0x07) << 12);
    }

    pub(crate) fn set_nametable(&mut self, index: u8) {
        self.0 = (self.0 & !Self::NAMETABLE) | ((u16::from(index) & 0x03) << 10);
    }

    /// Address of the nametable byte for the current tile.
    pub(crate) fn tile_addr(self) -> u16 {
        ppu_mem::NAMETABLE_BASE | (self.0 & 0x0FFF)
    }

    /// Address of the attribute byte covering the current tile.
    pub(crate) fn attribute_addr(self) -> u16 {
        ppu_mem::NAMETABLE_BASE
            | ppu_mem::ATTRIBUTE_OFFSET
            | (self.0 & Self::NAMETABLE)
            | ((self.coarse_y() >> 2) << 3)
            | (self.coarse_x() >> 2)
    }

    /// Shift selecting the 2-bit palette of the current tile's quadrant.
    pub(crate) fn attribute_shift(self) -> u8 {
        (((self.coarse_y() & 0x02) << 1) | (self.coarse_x() & 0x02)) as u8
    }

    pub(crate) fn increment(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & 0x7FFF;
    }

    /// Moves one tile right, switching horizontal nametable on wrap.
    pub(crate) fn increment_coarse_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !Self::COARSE_X;
            self.0 ^= Self::NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Moves one pixel row down. Coarse Y wraps after row 29 into the other
    /// vertical nametable; rows 30/31 (attribute space) wrap without switching.
    pub(crate) fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !Self::FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= Self::NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y as u8 + 1),
        }
    }

    pub(crate) fn copy_horizontal(&mut self, from: VramAddr) {
        self.0 = (self.0 & !Self::HORIZONTAL) | (from.0 & Self::HORIZONTAL);
    }
}

/// `v`, `t`, fine X and the shared `$2005`/`$2006` write toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Scroll {
    pub(crate) v: VramAddr,
    pub(crate) t: VramAddr,
    pub(crate) x: u8,
    pub(crate) w: bool,
}

impl Scroll {
    pub(crate) fn write_scroll(&mut self, value: u8) {
        if self.w {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0x07);
        } else {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0x07;
        }
        self.w = !self.w;
    }

    /// High byte first; the second write also copies `t` into `v`.
    pub(crate) fn write_addr(&mut self, value: u8) {
        if self.w {
            self.t = VramAddr::new((self.t.raw() & 0x7F00) | u16::from(value));
            self.v = self.t;
        } else {
            self.t = VramAddr::new((self.t.raw() & 0x00FF) | (u16::from(value & 0x3F) << 8));
        }
        self.w = !self.w;
    }
}

/// Register file behind `$2000-$2007`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registers {
    pub(crate) control: Control,
    pub(crate) mask: Mask,
    pub(crate) status: Status,
    pub(crate) oam_addr: u8,
    pub(crate) scroll: Scroll,
    /// Delayed `$2007` read value for addresses below the palette.
    pub(crate) read_buffer: u8,
    /// Last value written to any register; drives unreadable registers.
    pub(crate) latch: u8,
}

impl Registers {
    /// `$2000` also feeds the nametable select bits into `t`.
    pub(crate) fn write_control(&mut self, value: u8) {
        self.control = Control::from_bits_retain(value);
        self.scroll.t.set_nametable(self.control.nametable_index());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_writes_split_into_coarse_and_fine_parts() {
        let mut scroll = Scroll::default();
        scroll.write_scroll(0b1010_1101);
        assert_eq!(scroll.t.coarse_x(), 0b10101);
        assert_eq!(scroll.x, 0b101);
        scroll.write_scroll(0b0110_0011);
        assert_eq!(scroll.t.coarse_y(), 0b01100);
        assert_eq!(scroll.t.fine_y(), 0b011);
        assert!(!scroll.w);
    }

    #[test]
    fn second_address_write_loads_v() {
        let mut scroll = Scroll::default();
        scroll.write_addr(0xFF);
        assert_eq!(scroll.v.raw(), 0);
        scroll.write_addr(0x20);
        assert_eq!(scroll.t.raw(), 0x3F20);
        assert_eq!(scroll.v, scroll.t);
    }

    #[test]
    fn coarse_x_wrap_switches_nametable() {
        let mut v = VramAddr::new(31);
        v.increment_coarse_x();
        assert_eq!(v.coarse_x(), 0);
        assert_eq!(v.raw() & 0x0400, 0x0400);
    }

    #[test]
    fn row_29_wraps_into_the_next_vertical_table() {
        let mut v = VramAddr::new(0x7000 | (29 << 5));
        v.increment_y();
        assert_eq!(v.coarse_y(), 0);
        assert_eq!(v.fine_y(), 0);
        assert_eq!(v.raw() & 0x0800, 0x0800);

        let mut v = VramAddr::new(0x7000 | (31 << 5));
        v.increment_y();
        assert_eq!(v.coarse_y(), 0);
        assert_eq!(v.raw() & 0x0800, 0);
    }

    #[test]
    fn attribute_address_follows_tile_quadrant() {
        let v = VramAddr::new((0x0400) | (5 << 5) | 7);
        assert_eq!(v.tile_addr(), 0x2400 + 5 * 32 + 7);
        assert_eq!(v.attribute_addr(), 0x27C0 + 8 + 1);
        assert_eq!(v.attribute_shift(), 2);
    }

    #[test]
    fn control_write_updates_t_nametable() {
        let mut regs = Registers::default();
        regs.write_control(0b1000_0010);
        assert_eq!(regs.scroll.t.raw() & 0x0C00, 0x0800);
        assert!(regs.control.nmi_enabled());
    }
}
