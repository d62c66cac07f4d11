//! Delta modulation channel.

use super::{SLICE_SAMPLES, tables::DMC_RATES, timer::Timer};

const SAMPLE_BASE: u16 = 0xC000;
const SAMPLE_ADDR_STRIDE: u16 = 64;
const SAMPLE_LEN_STRIDE: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Dmc {
    irq_enabled: bool,
    looping: bool,
    rate_index: u8,
    /// 7-bit delta accumulator.
    level: u8,
    sample_addr: u16,
    sample_len: u16,
    current_addr: u16,
    bytes_remaining: u16,
    shift: u8,
    bits_remaining: u8,
    silence: bool,
    irq: bool,
    timer: Timer,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            irq_enabled: false,
            looping: false,
            rate_index: 0,
            level: 0,
            sample_addr: SAMPLE_BASE,
            sample_len: 1,
            current_addr: SAMPLE_BASE,
            bytes_remaining: 0,
            shift: 0,
            bits_remaining: 0,
            silence: true,
            irq: false,
            timer: Timer::default(),
        }
    }
}

impl Dmc {
    /// `IL-- RRRR`
    pub(super) fn write_control(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        self.looping = value & 0x40 != 0;
        self.rate_index = value & 0x0F;
        if !self.irq_enabled {
            self.irq = false;
        }
    }

    pub(super) fn write_direct_load(&mut self, value: u8) {
        self.level = value & 0x7F;
    }

    pub(super) fn write_address(&mut self, value: u8) {
        self.sample_addr = SAMPLE_BASE + u16::from(value) * SAMPLE_ADDR_STRIDE;
    }

    pub(super) fn write_length(&mut self, value: u8) {
        self.sample_len = u16::from(value) * SAMPLE_LEN_STRIDE + 1;
    }

    /// `$4015` bit 4. Enabling an idle channel restarts the sample.
    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.irq = false;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart();
        }
    }

    fn restart(&mut self) {
        self.current_addr = self.sample_addr;
        self.bytes_remaining = self.sample_len;
    }

    pub(super) fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    pub(super) fn irq_pending(&self) -> bool {
        self.irq
    }

    /// Starts a new 8-bit output cycle, fetching the next sample byte.
    fn refill(&mut self, reader: &mut dyn FnMut(u16) -> u8) {
        self.bits_remaining = 8;
        if self.bytes_remaining == 0 {
            self.silence = true;
            return;
        }
        self.shift = reader(self.current_addr);
        self.silence = false;
        self.current_addr = match self.current_addr {
            0xFFFF => 0x8000,
            addr => addr + 1,
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.looping {
                self.restart();
            } else if self.irq_enabled {
                self.irq = true;
            }
        }
    }

    fn clock_bit(&mut self, reader: &mut dyn FnMut(u16) -> u8) {
        if self.bits_remaining == 0 {
            self.refill(reader);
        }
        if !self.silence {
            if self.shift & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shift >>= 1;
        self.bits_remaining -= 1;
    }

    pub(super) fn output(&mut self, reader: &mut dyn FnMut(u16) -> u8) -> [u8; SLICE_SAMPLES] {
        let period = u32::from(DMC_RATES[usize::from(self.rate_index)]);
        let mut out = [0; SLICE_SAMPLES];
        for sample in out.iter_mut() {
            for _ in 0..self.timer.tick(period) {
                self.clock_bit(reader);
            }
            *sample = self.level;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ones_raise_the_level_and_end_raises_irq() {
        let mut dmc = Dmc::default();
        dmc.write_control(0x8F);
        dmc.write_length(0);
        dmc.write_direct_load(0x40);
        dmc.set_enabled(true);

        let mut fetched = Vec::new();
        let out = dmc.output(&mut |addr| {
            fetched.push(addr);
            0xFF
        });

        assert_eq!(fetched, vec![SAMPLE_BASE]);
        assert_eq!(out[SLICE_SAMPLES - 1], 0x40 + 16);
        assert!(!dmc.active());
        assert!(dmc.irq_pending());
    }

    #[test]
    fn address_wraps_to_8000() {
        let mut dmc = Dmc::default();
        dmc.write_control(0x4F);
        dmc.current_addr = 0xFFFF;
        dmc.bytes_remaining = 2;

        let mut fetched = Vec::new();
        dmc.output(&mut |addr| {
            fetched.push(addr);
            0
        });
        assert_eq!(&fetched[..2], &[0xFFFF, 0x8000]);
    }
}
