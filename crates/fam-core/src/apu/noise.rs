//! Noise channel: 15-bit LFSR clocked from the NTSC period table.

use super::{
    FrameClock, SLICE_SAMPLES, envelope::Envelope, length_counter::LengthCounter,
    tables::NOISE_PERIODS, timer::Timer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Noise {
    /// Short mode taps bit 6 instead of bit 1.
    short: bool,
    period_index: u8,
    lfsr: u16,
    timer: Timer,
    envelope: Envelope,
    length: LengthCounter,
    enabled: bool,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            short: false,
            period_index: 0,
            lfsr: 1,
            timer: Timer::default(),
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            enabled: false,
        }
    }
}

impl Noise {
    /// `--LC VVVV`
    pub(super) fn write_control(&mut self, value: u8) {
        self.envelope.write(value);
    }

    /// `M--- PPPP`
    pub(super) fn write_period(&mut self, value: u8) {
        self.short = value & 0x80 != 0;
        self.period_index = value & 0x0F;
    }

    pub(super) fn write_length(&mut self, value: u8) {
        self.length.load(value >> 3, self.enabled);
        self.envelope.restart();
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.clear();
        }
    }

    pub(super) fn length_active(&self) -> bool {
        self.length.active()
    }

    fn shift(&mut self) {
        let tap = if self.short { 6 } else { 1 };
        let feedback = (self.lfsr ^ (self.lfsr >> tap)) & 1;
        self.lfsr = (self.lfsr >> 1) | (feedback << 14);
    }

    pub(super) fn output(&mut self, clock: FrameClock) -> [u8; SLICE_SAMPLES] {
        if clock.quarter {
            self.envelope.clock();
        }
        if clock.half {
            self.length.clock(self.envelope.halts_length());
        }

        let audible = self.enabled && self.length.active();
        let volume = self.envelope.volume();
        let period = u32::from(NOISE_PERIODS[usize::from(self.period_index)]);
        let mut out = [0; SLICE_SAMPLES];
        for sample in out.iter_mut() {
            for _ in 0..self.timer.tick(period) {
                self.shift();
            }
            if audible && self.lfsr & 1 == 0 {
                *sample = volume;
            }
        }
        out
    }
}
