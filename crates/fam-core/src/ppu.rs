//! Scanline-granular Picture Processing Unit.
//!
//! The PPU owns its whole 14-bit address space: two pattern tables (filled by
//! the cartridge board with CHR banks, or written directly for CHR RAM), four
//! physical nametables aliased through the current [`Mirroring`], palette RAM
//! and OAM. Rendering happens one line at a time:
//!
//! 1. [`Ppu::pre_render`] updates scroll/vblank state at the start of a line.
//! 2. [`Ppu::render_scanline`] draws the background, composites the sprite
//!    line prepared on the previous call and evaluates sprites for the next
//!    line.
//!
//! Lines 8..232 of the 240 visible lines are emitted, matching an NTSC
//! television's overscan.

pub mod palette;
mod registers;
mod sprite;

use tracing::trace;

use crate::{
    cartridge::Mirroring,
    memory::ppu::{self as ppu_mem, Register},
    reset_kind::ResetKind,
};
use palette::ColorTable;
use registers::{Mask, Registers, Status, VramAddr};
use sprite::{PIXEL_BEHIND, PIXEL_ENTRY, PIXEL_PRESENT, PIXEL_SPRITE_ZERO, SpriteLine};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 224;
/// First visible line copied to the output frame.
pub const FIRST_OUTPUT_LINE: u16 = 8;
pub const VISIBLE_LINES: u16 = 240;
pub const VBLANK_LINE: u16 = 241;
pub const PRE_RENDER_LINE: u16 = 261;
pub const SCANLINES_PER_FRAME: u16 = 262;

/// Physical nametable used for each of the four logical tables.
fn nametable_layout(mirroring: Mirroring) -> [usize; 4] {
    match mirroring {
        Mirroring::Horizontal => [0, 0, 1, 1],
        Mirroring::Vertical => [0, 1, 0, 1],
        Mirroring::SingleScreenLower => [0; 4],
        Mirroring::SingleScreenUpper => [1; 4],
        Mirroring::FourScreen => [0, 1, 2, 3],
    }
}

/// `$3F10/$3F14/$3F18/$3F1C` alias the background entries below them.
#[inline]
fn palette_index(addr: u16) -> usize {
    let index = usize::from(addr) & (ppu_mem::PALETTE_SIZE - 1);
    if index & 0x13 == 0x10 { index & 0x0F } else { index }
}

/// One background tile row as fetched for the current `v`.
#[derive(Debug, Clone, Copy, Default)]
struct TileRow {
    lo: u8,
    hi: u8,
    palette: u8,
}

impl TileRow {
    /// Background palette entry at `fine_x`; zero for transparent pixels.
    #[inline]
    fn entry(self, fine_x: u8) -> u8 {
        let bit = 7 - fine_x;
        let color = (((self.hi >> bit) & 1) << 1) | ((self.lo >> bit) & 1);
        if color == 0 { 0 } else { (self.palette << 2) | color }
    }
}

#[derive(Debug, Clone)]
pub struct Ppu {
    regs: Registers,
    patterns: Box<[[u8; ppu_mem::PATTERN_TABLE_SIZE]; 2]>,
    nametables: Box<[[u8; ppu_mem::NAMETABLE_SIZE]; 4]>,
    layout: [usize; 4],
    mirroring: Mirroring,
    palette: [u8; ppu_mem::PALETTE_SIZE],
    oam: [u8; ppu_mem::OAM_SIZE],
    sprite_line: SpriteLine,
    colors: ColorTable,
    /// Set on the vblank edge while NMI output is enabled; consumed by the CPU.
    nmi_latch: bool,
    /// Pattern tables accept `$2007` writes (CHR RAM boards).
    chr_writable: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            patterns: Box::new([[0; ppu_mem::PATTERN_TABLE_SIZE]; 2]),
            nametables: Box::new([[0; ppu_mem::NAMETABLE_SIZE]; 4]),
            layout: nametable_layout(Mirroring::Horizontal),
            mirroring: Mirroring::Horizontal,
            palette: [0; ppu_mem::PALETTE_SIZE],
            oam: [0; ppu_mem::OAM_SIZE],
            sprite_line: SpriteLine::default(),
            colors: ColorTable::default(),
            nmi_latch: false,
            chr_writable: true,
        }
    }

    /// Power-on clears every memory; a soft reset only clears the register
    /// file, as the console's reset line does.
    pub fn reset(&mut self, kind: ResetKind) {
        match kind {
            ResetKind::PowerOn => *self = Self::new(),
            ResetKind::Soft => {
                self.regs = Registers::default();
                self.colors.update(Mask::empty());
                self.sprite_line.clear();
                self.nmi_latch = false;
            }
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Marks the pattern tables as CHR RAM (`true`) or a CHR ROM copy.
    pub fn set_chr_writable(&mut self, writable: bool) {
        self.chr_writable = writable;
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        if mirroring != self.mirroring {
            trace!(?mirroring, "nametable mirroring changed");
        }
        self.mirroring = mirroring;
        self.layout = nametable_layout(mirroring);
    }

    /// Numeric form of [`Ppu::set_mirroring`]; unknown codes are ignored.
    pub fn set_mirroring_code(&mut self, code: u8) {
        if let Ok(mirroring) = Mirroring::try_from(code) {
            self.set_mirroring(mirroring);
        }
    }

    pub fn rendering_enabled(&self) -> bool {
        self.regs.mask.rendering_enabled()
    }

    /// Consumes the pending NMI request.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_latch)
    }

    pub fn in_vblank(&self) -> bool {
        self.regs.status.contains(Status::VERTICAL_BLANK)
    }

    // ---- internal address space ------------------------------------------

    fn nametable_slot(&self, addr: u16) -> (usize, usize) {
        let relative = usize::from(addr.wrapping_sub(ppu_mem::NAMETABLE_BASE) & 0x0FFF);
        (self.layout[relative >> 10], relative & (ppu_mem::NAMETABLE_SIZE - 1))
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::ADDR_MASK;
        match addr {
            0x0000..=ppu_mem::PATTERN_TABLE_END => {
                self.patterns[usize::from(addr >> 12)][usize::from(addr & 0x0FFF)]
            }
            ppu_mem::NAMETABLE_BASE..ppu_mem::PALETTE_BASE => {
                let (table, offset) = self.nametable_slot(addr);
                self.nametables[table][offset]
            }
            _ => self.palette[palette_index(addr)],
        }
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        let addr = addr & ppu_mem::ADDR_MASK;
        match addr {
            0x0000..=ppu_mem::PATTERN_TABLE_END => {
                self.patterns[usize::from(addr >> 12)][usize::from(addr & 0x0FFF)] = value;
            }
            ppu_mem::NAMETABLE_BASE..ppu_mem::PALETTE_BASE => {
                let (table, offset) = self.nametable_slot(addr);
                self.nametables[table][offset] = value;
            }
            _ => self.palette[palette_index(addr)] = value & 0x3F,
        }
    }

    /// Length of the contiguous run starting at `addr` inside one backing array.
    fn run_len(&self, addr: u16, wanted: usize) -> usize {
        match addr {
            0x0000..=ppu_mem::PATTERN_TABLE_END => {
                wanted.min(ppu_mem::PATTERN_TABLE_SIZE - usize::from(addr & 0x0FFF))
            }
            ppu_mem::NAMETABLE_BASE..ppu_mem::PALETTE_BASE => {
                let (_, offset) = self.nametable_slot(addr);
                wanted
                    .min(ppu_mem::NAMETABLE_SIZE - offset)
                    .min(usize::from(ppu_mem::PALETTE_BASE - addr))
            }
            _ => 1,
        }
    }

    /// Copies `data` into the address space starting at `addr`, wrapping at
    /// `$3FFF`.
    pub fn write_block(&mut self, addr: u16, data: &[u8]) {
        let mut addr = addr & ppu_mem::ADDR_MASK;
        let mut rest = data;
        while !rest.is_empty() {
            let len = self.run_len(addr, rest.len());
            match addr {
                0x0000..=ppu_mem::PATTERN_TABLE_END => {
                    let start = usize::from(addr & 0x0FFF);
                    self.patterns[usize::from(addr >> 12)][start..start + len]
                        .copy_from_slice(&rest[..len]);
                }
                ppu_mem::NAMETABLE_BASE..ppu_mem::PALETTE_BASE => {
                    let (table, start) = self.nametable_slot(addr);
                    self.nametables[table][start..start + len].copy_from_slice(&rest[..len]);
                }
                _ => self.write_byte(addr, rest[0]),
            }
            rest = &rest[len..];
            addr = (addr + len as u16) & ppu_mem::ADDR_MASK;
        }
    }

    /// Fills `out` from the address space starting at `addr`.
    pub fn read_block(&self, addr: u16, out: &mut [u8]) {
        let mut addr = addr & ppu_mem::ADDR_MASK;
        let mut done = 0;
        while done < out.len() {
            let len = self.run_len(addr, out.len() - done);
            let dst = &mut out[done..done + len];
            match addr {
                0x0000..=ppu_mem::PATTERN_TABLE_END => {
                    let start = usize::from(addr & 0x0FFF);
                    dst.copy_from_slice(&self.patterns[usize::from(addr >> 12)][start..start + len]);
                }
                ppu_mem::NAMETABLE_BASE..ppu_mem::PALETTE_BASE => {
                    let (table, start) = self.nametable_slot(addr);
                    dst.copy_from_slice(&self.nametables[table][start..start + len]);
                }
                _ => dst[0] = self.read_byte(addr),
            }
            done += len;
            addr = (addr + len as u16) & ppu_mem::ADDR_MASK;
        }
    }

    pub fn oam_read(&self, index: u8) -> u8 {
        self.oam[usize::from(index)]
    }

    pub fn oam_write(&mut self, index: u8, value: u8) {
        self.oam[usize::from(index)] = value;
    }

    /// Current `$2003` OAM address, where sprite DMA starts writing.
    pub fn oam_addr(&self) -> u8 {
        self.regs.oam_addr
    }

    /// Writes `data` into OAM starting at `start`, wrapping after 256 bytes.
    pub fn oam_write_block(&mut self, start: u8, data: &[u8]) {
        for (i, &value) in data.iter().enumerate() {
            self.oam[usize::from(start.wrapping_add(i as u8))] = value;
        }
    }

    // ---- CPU register window ---------------------------------------------

    pub fn write_register(&mut self, register: Register, value: u8) {
        self.regs.latch = value;
        match register {
            Register::Control => {
                let was_enabled = self.regs.control.nmi_enabled();
                self.regs.write_control(value);
                // Enabling NMI output during vblank raises a fresh edge.
                if !was_enabled && self.regs.control.nmi_enabled() && self.in_vblank() {
                    self.nmi_latch = true;
                }
            }
            Register::Mask => {
                self.regs.mask = Mask::from_bits_retain(value);
                self.colors.update(self.regs.mask);
            }
            Register::Status => {}
            Register::OamAddr => self.regs.oam_addr = value,
            Register::OamData => {
                self.oam_write(self.regs.oam_addr, value);
                self.regs.oam_addr = self.regs.oam_addr.wrapping_add(1);
            }
            Register::Scroll => self.regs.scroll.write_scroll(value),
            Register::Addr => self.regs.scroll.write_addr(value),
            Register::Data => {
                let addr = self.regs.scroll.v.raw() & ppu_mem::ADDR_MASK;
                if self.chr_writable || addr > ppu_mem::PATTERN_TABLE_END {
                    self.write_byte(addr, value);
                } else {
                    trace!(addr, value, "write to CHR ROM ignored");
                }
                self.advance_data_addr();
            }
        }
    }

    pub fn read_register(&mut self, register: Register) -> u8 {
        match register {
            Register::Status => self.read_status(),
            Register::OamData => self.oam_read(self.regs.oam_addr),
            Register::Data => {
                let addr = self.regs.scroll.v.raw() & ppu_mem::ADDR_MASK;
                let value = if addr >= ppu_mem::PALETTE_BASE {
                    // Palette reads are immediate; the buffer picks up the
                    // nametable byte underneath.
                    self.regs.read_buffer = self.read_byte(addr - 0x1000);
                    self.read_byte(addr)
                } else {
                    let next = self.read_byte(addr);
                    std::mem::replace(&mut self.regs.read_buffer, next)
                };
                self.advance_data_addr();
                value
            }
            _ => self.regs.latch,
        }
    }

    /// `$2002`: returns the status flags, then clears vblank and the write toggle.
    pub fn read_status(&mut self) -> u8 {
        let value = self.regs.status.bits() | (self.regs.latch & 0x1F);
        self.regs.status.remove(Status::VERTICAL_BLANK);
        self.regs.scroll.w = false;
        value
    }

    fn advance_data_addr(&mut self) {
        let step = self.regs.control.vram_increment();
        self.regs.scroll.v.increment(step);
    }

    // ---- scanline rendering ----------------------------------------------

    /// Start-of-line bookkeeping for `line` (0..262).
    pub fn pre_render(&mut self, line: u16) {
        match line {
            0 => {
                if self.rendering_enabled() {
                    self.regs.scroll.v = self.regs.scroll.t;
                }
            }
            1..VISIBLE_LINES => {
                if self.rendering_enabled() {
                    let t = self.regs.scroll.t;
                    self.regs.scroll.v.copy_horizontal(t);
                }
            }
            VBLANK_LINE => {
                self.regs.status.insert(Status::VERTICAL_BLANK);
                if self.regs.control.nmi_enabled() {
                    self.nmi_latch = true;
                }
            }
            PRE_RENDER_LINE => {
                self.regs.status.remove(
                    Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
                );
                self.sprite_line.clear();
            }
            _ => {}
        }
    }

    /// Renders visible `line` into `frame` (a `SCREEN_WIDTH * SCREEN_HEIGHT`
    /// buffer) when given. Without a frame only the state that the CPU can
    /// observe is updated: scroll position, sprite 0 hit and overflow.
    pub fn render_scanline(&mut self, line: u16, frame: Option<&mut [u32]>) {
        if line >= VISIBLE_LINES {
            return;
        }
        let row = frame.and_then(|frame| output_row(frame, line));

        if !self.rendering_enabled() {
            self.sprite_line.clear();
            if let Some(row) = row {
                let backdrop = self.colors.color(self.palette[0], self.regs.mask);
                row.fill(backdrop);
            }
            return;
        }

        self.draw_line(row);
        self.regs.scroll.v.increment_y();
        self.evaluate_sprites(line);
    }

    fn fetch_tile(&self, v: VramAddr) -> TileRow {
        let tile = self.read_byte(v.tile_addr());
        let palette = (self.read_byte(v.attribute_addr()) >> v.attribute_shift()) & 0x03;
        let addr = self.regs.control.background_table() + u16::from(tile) * 16 + v.fine_y();
        TileRow {
            lo: self.read_byte(addr),
            hi: self.read_byte(addr + 8),
            palette,
        }
    }

    fn draw_line(&mut self, mut row: Option<&mut [u32]>) {
        let mask = self.regs.mask;
        let zero_can_hit = self.sprite_line.has_zero
            && mask.contains(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
            && !self.regs.status.contains(Status::SPRITE_ZERO_HIT);
        if row.is_none() && !zero_can_hit {
            return;
        }

        let mut v = self.regs.scroll.v;
        let mut fine_x = self.regs.scroll.x;
        let mut tile = self.fetch_tile(v);

        for x in 0..SCREEN_WIDTH {
            let background = if mask.background_at(x) { tile.entry(fine_x) } else { 0 };
            let sprite = if mask.sprites_at(x) { self.sprite_line.pixels[x] } else { 0 };
            let sprite_opaque = sprite & PIXEL_PRESENT != 0;

            if background != 0 && sprite_opaque && sprite & PIXEL_SPRITE_ZERO != 0 && x != 255 {
                self.regs.status.insert(Status::SPRITE_ZERO_HIT);
            }

            if let Some(row) = &mut row {
                let entry = if sprite_opaque && (background == 0 || sprite & PIXEL_BEHIND == 0) {
                    0x10 | (sprite & PIXEL_ENTRY)
                } else {
                    background
                };
                row[x] = self.colors.color(self.palette[usize::from(entry)], mask);
            }

            fine_x += 1;
            if fine_x == 8 {
                fine_x = 0;
                v.increment_coarse_x();
                tile = self.fetch_tile(v);
            }
        }
    }
}

/// Output slice for visible `line`, if the line is inside the emitted window.
fn output_row(frame: &mut [u32], line: u16) -> Option<&mut [u32]> {
    let y = usize::from(line.checked_sub(FIRST_OUTPUT_LINE)?);
    if y >= SCREEN_HEIGHT {
        return None;
    }
    frame.get_mut(y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame() -> Vec<u32> {
        vec![0; SCREEN_WIDTH * SCREEN_HEIGHT]
    }

    /// Pattern table 0 tile 1 is solid colour 1; nametable 0 is all tile 1.
    fn solid_background() -> Ppu {
        let mut ppu = Ppu::new();
        ppu.write_block(0x0010, &[0xFF; 8]);
        ppu.write_block(0x2000, &[0x01; 0x3C0]);
        ppu.write_byte(0x3F00, 0x0F);
        ppu.write_byte(0x3F01, 0x30);
        ppu
    }

    #[test]
    fn horizontal_mirroring_aliases_vertical_pairs() {
        let mut ppu = Ppu::new();
        ppu.set_mirroring(Mirroring::Horizontal);
        ppu.write_byte(0x2005, 0xAB);
        assert_eq!(ppu.read_byte(0x2405), 0xAB);
        assert_eq!(ppu.read_byte(0x2805), 0x00);

        ppu.set_mirroring_code(1);
        assert_eq!(ppu.mirroring(), Mirroring::Vertical);
        ppu.write_byte(0x2405, 0xCD);
        assert_eq!(ppu.read_byte(0x2C05), 0xCD);
        assert_eq!(ppu.read_byte(0x3405), 0xCD);

        ppu.set_mirroring_code(7);
        assert_eq!(ppu.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn sprite_palette_backdrops_alias_background() {
        let mut ppu = Ppu::new();
        ppu.write_byte(0x3F10, 0x21);
        assert_eq!(ppu.read_byte(0x3F00), 0x21);
        ppu.write_byte(0x3F15, 0x05);
        assert_eq!(ppu.read_byte(0x3F05), 0x00);
        assert_eq!(ppu.read_byte(0x3F35), 0x05);
    }

    #[test]
    fn block_copies_cross_backing_arrays() {
        let mut ppu = Ppu::new();
        let data: Vec<u8> = (0..=255).collect();
        ppu.write_block(0x0F80, &data);
        assert_eq!(ppu.read_byte(0x0FFF), 0x7F);
        assert_eq!(ppu.read_byte(0x1000), 0x80);

        let mut back = vec![0; 256];
        ppu.read_block(0x0F80, &mut back);
        assert_eq!(back, data);
    }

    #[test]
    fn data_port_reads_are_buffered_below_the_palette() {
        let mut ppu = Ppu::new();
        ppu.write_byte(0x2100, 0x11);
        ppu.write_byte(0x2101, 0x22);
        ppu.write_register(Register::Addr, 0x21);
        ppu.write_register(Register::Addr, 0x00);

        assert_eq!(ppu.read_register(Register::Data), 0x00);
        assert_eq!(ppu.read_register(Register::Data), 0x11);
        assert_eq!(ppu.read_register(Register::Data), 0x22);
    }

    #[test]
    fn palette_reads_are_immediate() {
        let mut ppu = Ppu::new();
        ppu.write_byte(0x3F02, 0x2A);
        ppu.write_register(Register::Addr, 0x3F);
        ppu.write_register(Register::Addr, 0x02);
        assert_eq!(ppu.read_register(Register::Data), 0x2A);
    }

    #[test]
    fn chr_rom_ignores_data_port_writes() {
        let mut ppu = Ppu::new();
        ppu.write_block(0x0010, &[0xAA; 16]);
        ppu.set_chr_writable(false);
        ppu.write_register(Register::Addr, 0x00);
        ppu.write_register(Register::Addr, 0x10);
        ppu.write_register(Register::Data, 0x55);
        assert_eq!(ppu.read_byte(0x0010), 0xAA);

        // Nametables stay writable, and the address still advances.
        ppu.write_register(Register::Addr, 0x20);
        ppu.write_register(Register::Addr, 0x00);
        ppu.write_register(Register::Data, 0x55);
        assert_eq!(ppu.read_byte(0x2000), 0x55);

        ppu.set_chr_writable(true);
        ppu.write_register(Register::Addr, 0x00);
        ppu.write_register(Register::Addr, 0x10);
        ppu.write_register(Register::Data, 0x55);
        assert_eq!(ppu.read_byte(0x0010), 0x55);
    }

    #[test]
    fn data_writes_step_by_32_when_selected() {
        let mut ppu = Ppu::new();
        ppu.write_register(Register::Control, 0x04);
        ppu.write_register(Register::Addr, 0x20);
        ppu.write_register(Register::Addr, 0x00);
        ppu.write_register(Register::Data, 0x01);
        ppu.write_register(Register::Data, 0x02);
        assert_eq!(ppu.read_byte(0x2000), 0x01);
        assert_eq!(ppu.read_byte(0x2020), 0x02);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut ppu = Ppu::new();
        ppu.pre_render(VBLANK_LINE);
        ppu.write_register(Register::Scroll, 0x10);

        let status = ppu.read_status();
        assert_eq!(status & 0x80, 0x80);
        assert!(!ppu.in_vblank());
        assert!(!ppu.regs.scroll.w);
        assert_eq!(ppu.read_status() & 0x80, 0);
    }

    #[test]
    fn vblank_raises_nmi_only_when_enabled() {
        let mut ppu = Ppu::new();
        ppu.pre_render(VBLANK_LINE);
        assert!(!ppu.take_nmi());

        // Enabling NMI while vblank is still set raises it immediately.
        ppu.write_register(Register::Control, 0x80);
        assert!(ppu.take_nmi());
        assert!(!ppu.take_nmi());

        ppu.pre_render(PRE_RENDER_LINE);
        ppu.pre_render(VBLANK_LINE);
        assert!(ppu.take_nmi());
    }

    #[test]
    fn disabled_rendering_shows_the_backdrop() {
        let mut ppu = solid_background();
        let mut frame = blank_frame();
        ppu.render_scanline(FIRST_OUTPUT_LINE, Some(&mut frame));
        let backdrop = ppu.colors.color(0x0F, Mask::empty());
        assert!(frame[..SCREEN_WIDTH].iter().all(|&px| px == backdrop));
    }

    #[test]
    fn background_row_is_drawn_with_left_clip() {
        let mut ppu = solid_background();
        ppu.write_register(Register::Mask, 0x08);
        let mut frame = blank_frame();
        for line in 0..VISIBLE_LINES {
            ppu.pre_render(line);
            ppu.render_scanline(line, Some(&mut frame));
        }
        let white = ppu.colors.color(0x30, Mask::empty());
        let black = ppu.colors.color(0x0F, Mask::empty());
        // Lines 8 and 231 are the first and last emitted rows.
        for row in frame.chunks(SCREEN_WIDTH).step_by(SCREEN_HEIGHT - 1) {
            assert_eq!(row[0], black);
            assert_eq!(row[7], black);
            assert!(row[8..].iter().all(|&px| px == white));
        }
        assert!(output_row(&mut frame, FIRST_OUTPUT_LINE + SCREEN_HEIGHT as u16).is_none());
        assert!(output_row(&mut frame, FIRST_OUTPUT_LINE - 1).is_none());
    }

    #[test]
    fn sprite_zero_hit_is_detected_without_a_frame() {
        let mut ppu = solid_background();
        ppu.write_register(Register::Mask, 0x1E);
        // Sprite 0 uses the same solid tile, shown from line 31.
        ppu.oam_write_block(0, &[30, 1, 0, 100]);

        for line in 0..VISIBLE_LINES {
            ppu.pre_render(line);
            ppu.render_scanline(line, None);
            if line == 30 {
                assert_eq!(ppu.regs.status.bits() & 0x40, 0);
            }
        }
        assert_eq!(ppu.read_status() & 0x40, 0x40);

        ppu.pre_render(PRE_RENDER_LINE);
        assert_eq!(ppu.read_status() & 0x40, 0);
    }

    #[test]
    fn vertical_scroll_wraps_into_the_next_nametable() {
        let mut ppu = Ppu::new();
        ppu.set_mirroring(Mirroring::Horizontal);
        ppu.write_register(Register::Mask, 0x08);
        ppu.write_register(Register::Scroll, 0);
        ppu.write_register(Register::Scroll, 239);
        ppu.pre_render(0);
        // 239 = coarse Y 29, fine Y 7: one more row lands in table 2 row 0.
        ppu.render_scanline(0, None);
        ppu.render_scanline(1, None);
        assert_eq!(ppu.regs.scroll.v.raw() & 0x0800, 0x0800);
        assert_eq!(ppu.regs.scroll.v.coarse_y(), 0);
    }

    #[test]
    fn soft_reset_keeps_memories() {
        let mut ppu = Ppu::new();
        ppu.write_byte(0x2000, 0x42);
        ppu.write_register(Register::Mask, 0x18);
        ppu.reset(ResetKind::Soft);
        assert_eq!(ppu.read_byte(0x2000), 0x42);
        assert!(!ppu.rendering_enabled());
        ppu.reset(ResetKind::PowerOn);
        assert_eq!(ppu.read_byte(0x2000), 0x00);
    }
}
