//! Triangle channel and its linear counter.

use super::{
    FrameClock, SLICE_SAMPLES, length_counter::LengthCounter, tables::TRIANGLE_SEQUENCE,
    timer::Timer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(super) struct Triangle {
    /// Halts the length counter and keeps the linear counter reloading.
    control: bool,
    linear_period: u8,
    linear: u8,
    linear_reload: bool,
    period: u16,
    step: u8,
    timer: Timer,
    length: LengthCounter,
    enabled: bool,
}

impl Triangle {
    /// `CRRR RRRR`
    pub(super) fn write_linear(&mut self, value: u8) {
        self.control = value & 0x80 != 0;
        self.linear_period = value & 0x7F;
    }

    /// Low period byte; the sequencer phase is kept.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.period = (self.period & 0x0700) | u16::from(value);
    }

    pub(super) fn write_timer_high(&mut self, value: u8) {
        self.period = (self.period & 0x00FF) | (u16::from(value & 0x07) << 8);
        self.length.load(value >> 3, self.enabled);
        self.linear_reload = true;
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

    fn clock_frame(&mut self, clock: FrameClock) {
        if clock.quarter {
            if self.linear_reload {
                self.linear = self.linear_period;
            } else if self.linear > 0 {
                self.linear -= 1;
            }
            if !self.control {
                self.linear_reload = false;
            }
        }
        if clock.half {
            self.length.clock(self.control);
        }
    }

    /// One step lasts `T + 1` CPU cycles. A silenced channel, or one with an
    /// ultrasonic period below 2, holds its current level.
    pub(super) fn output(&mut self, clock: FrameClock) -> [u8; SLICE_SAMPLES] {
        self.clock_frame(clock);

        let running =
            self.enabled && self.length.active() && self.linear > 0 && self.period >= 2;
        let step_cycles = u32::from(self.period) + 1;
        let mut out = [0; SLICE_SAMPLES];
        for sample in out.iter_mut() {
            if running {
                let steps = self.timer.tick(step_cycles);
                self.step = ((u32::from(self.step) + steps) & 0x1F) as u8;
            }
            *sample = TRIANGLE_SEQUENCE[usize::from(self.step)];
        }
        out
    }
}
