use bitflags::bitflags;

use super::{Ppu, SCREEN_WIDTH, registers::Status};

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SpriteAttributes: u8 {
        const PALETTE         = 0b0000_0011;
        const BEHIND          = 0b0010_0000;
        const FLIP_HORIZONTAL = 0b0100_0000;
        const FLIP_VERTICAL   = 0b1000_0000;
    }
}

/// Most sprites the PPU draws on one line.
pub(crate) const SPRITES_PER_LINE: usize = 8;

// Line buffer cell layout.
pub(crate) const PIXEL_PRESENT: u8 = 0x80;
pub(crate) const PIXEL_BEHIND: u8 = 0x40;
pub(crate) const PIXEL_SPRITE_ZERO: u8 = 0x20;
/// Sprite palette entry, `palette << 2 | colour`.
pub(crate) const PIXEL_ENTRY: u8 = 0x0F;

/// Sprite pixels prepared for the next scanline.
#[derive(Debug, Clone)]
pub(crate) struct SpriteLine {
    pub(crate) pixels: [u8; SCREEN_WIDTH],
    /// Sprite 0 contributes at least one opaque pixel.
    pub(crate) has_zero: bool,
}

impl Default for SpriteLine {
    fn default() -> Self {
        Self {
            pixels: [0; SCREEN_WIDTH],
            has_zero: false,
        }
    }
}

impl SpriteLine {
    pub(crate) fn clear(&mut self) {
        self.pixels.fill(0);
        self.has_zero = false;
    }
}

impl Ppu {
    /// Fills the sprite line buffer for the line after `line`.
    ///
    /// OAM Y holds the line before the sprite's first row, so a sprite shows
    /// on `line + 1` when `0 <= line - y < height`. Lower OAM indices win
    /// overlapping pixels regardless of their background priority.
    pub(super) fn evaluate_sprites(&mut self, line: u16) {
        self.sprite_line.clear();
        let control = self.regs.control;
        let height = control.sprite_height();
        let mut found = 0;

        for index in 0..64 {
            let base = index * 4;
            let [y, tile, attr, x] = [
                self.oam[base],
                self.oam[base + 1],
                self.oam[base + 2],
                self.oam[base + 3],
            ];
            let row = line.wrapping_sub(u16::from(y));
            if row >= height {
                continue;
            }
            if found == SPRITES_PER_LINE {
                self.regs.status.insert(Status::SPRITE_OVERFLOW);
                break;
            }
            found += 1;

            let attrs = SpriteAttributes::from_bits_truncate(attr);
            let row = if attrs.contains(SpriteAttributes::FLIP_VERTICAL) {
                height - 1 - row
            } else {
                row
            };
            let addr = if height == 16 {
                let table = u16::from(tile & 0x01) * 0x1000;
                let tile = u16::from(tile & 0xFE) + (row >> 3);
                table + tile * 16 + (row & 0x07)
            } else {
                control.sprite_table() + u16::from(tile) * 16 + row
            };
            let lo = self.read_byte(addr);
            let hi = self.read_byte(addr + 8);

            let mut cell = ((attrs & SpriteAttributes::PALETTE).bits() << 2) | PIXEL_PRESENT;
            if attrs.contains(SpriteAttributes::BEHIND) {
                cell |= PIXEL_BEHIND;
            }
            if index == 0 {
                cell |= PIXEL_SPRITE_ZERO;
            }

            for col in 0..8u8 {
                let bit = if attrs.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                    col
                } else {
                    7 - col
                };
                let color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
                let sx = usize::from(x) + usize::from(col);
                if color == 0 || sx >= SCREEN_WIDTH {
                    continue;
                }
                let slot = &mut self.sprite_line.pixels[sx];
                if *slot & PIXEL_PRESENT == 0 {
                    *slot = cell | color;
                    if index == 0 {
                        self.sprite_line.has_zero = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ppu::{self as ppu_mem, Register};

    fn ppu_with_tile() -> Ppu {
        let mut ppu = Ppu::new();
        // Tile 1: left column set on every row, colour 1.
        ppu.write_block(0x0010, &[0x80; 8]);
        ppu.write_register(Register::Mask, 0x18);
        // Park every sprite below the screen.
        ppu.oam_write_block(0, &[0xFF; ppu_mem::OAM_SIZE]);
        ppu
    }

    fn place(ppu: &mut Ppu, index: u8, sprite: [u8; 4]) {
        ppu.oam_write_block(index * 4, &sprite);
    }

    #[test]
    fn sprite_lands_on_the_line_after_its_y() {
        let mut ppu = ppu_with_tile();
        place(&mut ppu, 0, [20, 1, 0x01, 40]);

        ppu.evaluate_sprites(19);
        assert_eq!(ppu.sprite_line.pixels[40], 0);

        ppu.evaluate_sprites(20);
        let cell = ppu.sprite_line.pixels[40];
        assert_eq!(cell & PIXEL_PRESENT, PIXEL_PRESENT);
        assert_eq!(cell & PIXEL_SPRITE_ZERO, PIXEL_SPRITE_ZERO);
        assert_eq!(cell & PIXEL_ENTRY, 0b0101);
        assert!(ppu.sprite_line.has_zero);
    }

    #[test]
    fn horizontal_flip_mirrors_the_row() {
        let mut ppu = ppu_with_tile();
        place(&mut ppu, 3, [0, 1, 0x40, 8]);
        ppu.evaluate_sprites(0);
        assert_eq!(ppu.sprite_line.pixels[8], 0);
        assert_ne!(ppu.sprite_line.pixels[15], 0);
        assert!(!ppu.sprite_line.has_zero);
    }

    #[test]
    fn ninth_sprite_sets_overflow() {
        let mut ppu = ppu_with_tile();
        for index in 0..9 {
            place(&mut ppu, index, [10, 1, 0, index * 10]);
        }
        ppu.evaluate_sprites(10);
        assert!(ppu.regs.status.contains(Status::SPRITE_OVERFLOW));
        assert_ne!(ppu.sprite_line.pixels[70], 0);
        assert_eq!(ppu.sprite_line.pixels[80], 0);
    }

    #[test]
    fn lower_index_wins_overlaps() {
        let mut ppu = ppu_with_tile();
        place(&mut ppu, 0, [0, 1, 0x20, 50]);
        place(&mut ppu, 1, [0, 1, 0x03, 50]);
        ppu.evaluate_sprites(0);
        let cell = ppu.sprite_line.pixels[50];
        assert_eq!(cell & PIXEL_BEHIND, PIXEL_BEHIND);
        assert_eq!(cell & PIXEL_ENTRY, 0b0001);
    }

    #[test]
    fn tall_sprites_use_the_tile_bit_as_table_select() {
        let mut ppu = ppu_with_tile();
        ppu.write_register(Register::Control, 0x20);
        // Bottom half of the 8x16 pair starting at tile 2 in table $1000.
        ppu.write_block(0x1030, &[0x01; 8]);
        place(&mut ppu, 0, [0, 0x03, 0, 0]);
        ppu.evaluate_sprites(9);
        assert_ne!(ppu.sprite_line.pixels[7], 0);
        assert_eq!(ppu.sprite_line.pixels[0], 0);
    }
}
