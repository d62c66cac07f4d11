//! NTSC colour lookup with greyscale and emphasis applied.

use super::registers::Mask;

/// Number of distinct master palette entries.
pub const MASTER_PALETTE_LEN: usize = 64;

#[rustfmt::skip]
const NTSC_RGB: [(u8, u8, u8); MASTER_PALETTE_LEN] = [
    (124, 124, 124), (0, 0, 252),     (0, 0, 188),     (68, 40, 188),
    (148, 0, 132),   (168, 0, 32),    (168, 16, 0),    (136, 20, 0),
    (80, 48, 0),     (0, 120, 0),     (0, 104, 0),     (0, 88, 0),
    (0, 64, 88),     (0, 0, 0),       (0, 0, 0),       (0, 0, 0),
    (188, 188, 188), (0, 120, 248),   (0, 88, 248),    (104, 68, 252),
    (216, 0, 204),   (228, 0, 88),    (248, 56, 0),    (228, 92, 16),
    (172, 124, 0),   (0, 184, 0),     (0, 168, 0),     (0, 168, 68),
    (0, 136, 136),   (0, 0, 0),       (0, 0, 0),       (0, 0, 0),
    (248, 248, 248), (60, 188, 252),  (104, 136, 252), (152, 120, 248),
    (248, 120, 248), (248, 88, 152),  (248, 120, 88),  (252, 160, 68),
    (248, 184, 0),   (184, 248, 24),  (88, 216, 84),   (88, 248, 152),
    (0, 232, 216),   (120, 120, 120), (0, 0, 0),       (0, 0, 0),
    (252, 252, 252), (164, 228, 252), (184, 184, 248), (216, 184, 248),
    (248, 184, 248), (248, 164, 192), (240, 208, 176), (252, 224, 168),
    (248, 216, 120), (216, 248, 120), (184, 248, 184), (184, 248, 216),
    (0, 252, 252),   (248, 216, 248), (0, 0, 0),       (0, 0, 0),
];

/// Packs a colour as `0xAABBGGRR`, i.e. RGBA bytes in memory order on
/// little-endian hosts.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (u32::from(b) << 16) | (u32::from(g) << 8) | u32::from(r)
}

fn tint(channel: u8, emphasized: bool) -> u8 {
    if emphasized {
        (channel >> 1) + 128
    } else {
        channel >> 1
    }
}

/// Packed colours for the current emphasis bits. Rebuilt only when the
/// emphasis bits change.
#[derive(Debug, Clone)]
pub(crate) struct ColorTable {
    emphasis: Mask,
    colors: [u32; MASTER_PALETTE_LEN],
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut table = Self {
            emphasis: Mask::empty(),
            colors: [0; MASTER_PALETTE_LEN],
        };
        table.rebuild();
        table
    }
}

impl ColorTable {
    pub(crate) fn update(&mut self, mask: Mask) {
        if mask.emphasis() != self.emphasis {
            self.emphasis = mask.emphasis();
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let emphasis = self.emphasis;
        for (slot, &(r, g, b)) in self.colors.iter_mut().zip(NTSC_RGB.iter()) {
            *slot = if emphasis.is_empty() {
                pack_rgb(r, g, b)
            } else {
                pack_rgb(
                    tint(r, emphasis.contains(Mask::EMPHASIZE_RED)),
                    tint(g, emphasis.contains(Mask::EMPHASIZE_GREEN)),
                    tint(b, emphasis.contains(Mask::EMPHASIZE_BLUE)),
                )
            };
        }
    }

    /// Colour for palette RAM value `entry`; greyscale keeps only the
    /// luminance column.
    #[inline]
    pub(crate) fn color(&self, entry: u8, mask: Mask) -> u32 {
        let entry = if mask.contains(Mask::GRAYSCALE) {
            entry & 0x30
        } else {
            entry & 0x3F
        };
        self.colors[entry as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_little_endian_rgba() {
        assert_eq!(pack_rgb(0x11, 0x22, 0x33), 0xFF33_2211);
    }

    #[test]
    fn greyscale_drops_hue_bits() {
        let table = ColorTable::default();
        assert_eq!(
            table.color(0x16, Mask::GRAYSCALE),
            table.color(0x10, Mask::empty())
        );
    }

    #[test]
    fn emphasis_halves_and_lifts_channels() {
        let mut table = ColorTable::default();
        let mask = Mask::EMPHASIZE_RED;
        table.update(mask);
        // Entry 0x20 is (248, 248, 248).
        assert_eq!(table.color(0x20, mask), pack_rgb(124 + 128, 124, 124));
        table.update(Mask::empty());
        assert_eq!(table.color(0x20, Mask::empty()), pack_rgb(248, 248, 248));
    }
}
