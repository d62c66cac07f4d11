//! Pulse channels with their sweep units.

use super::{
    FrameClock, SLICE_SAMPLES, envelope::Envelope, length_counter::LengthCounter,
    tables::PULSE_DUTY_TABLE, timer::Timer,
};

/// The two pulse channels differ only in how the sweep negates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum PulseChannel {
    /// Ones' complement: subtracts one extra.
    Pulse1,
    /// Twos' complement.
    Pulse2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Sweep {
    enabled: bool,
    negate: bool,
    shift: u8,
    period: u8,
    divider: u8,
    reload: bool,
    channel: PulseChannel,
}

impl Sweep {
    fn new(channel: PulseChannel) -> Self {
        Self {
            enabled: false,
            negate: false,
            shift: 0,
            period: 0,
            divider: 0,
            reload: false,
            channel,
        }
    }

    /// `EPPP NSSS`
    fn write(&mut self, value: u8) {
        self.enabled = value & 0x80 != 0;
        self.period = (value >> 4) & 0x07;
        self.negate = value & 0x08 != 0;
        self.shift = value & 0x07;
        self.reload = true;
    }

    fn target(&self, timer: u16) -> u16 {
        let delta = timer >> self.shift;
        match (self.negate, self.channel) {
            (false, _) => timer + delta,
            (true, PulseChannel::Pulse1) => timer.saturating_sub(delta + 1),
            (true, PulseChannel::Pulse2) => timer.saturating_sub(delta),
        }
    }

    fn mutes(&self, timer: u16) -> bool {
        timer < 8 || self.target(timer) > 0x07FF
    }

    /// Half-frame clock; may rewrite the channel period.
    fn clock(&mut self, timer: &mut u16) {
        if self.divider == 0 && self.enabled && self.shift > 0 && !self.mutes(*timer) {
            *timer = self.target(*timer);
        }
        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Pulse {
    duty: u8,
    step: u8,
    /// 11-bit timer period `T`; one duty step lasts `2 * (T + 1)` CPU cycles.
    period: u16,
    timer: Timer,
    envelope: Envelope,
    length: LengthCounter,
    sweep: Sweep,
    enabled: bool,
}

impl Pulse {
    pub(super) fn new(channel: PulseChannel) -> Self {
        Self {
            duty: 0,
            step: 0,
            period: 0,
            timer: Timer::default(),
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            sweep: Sweep::new(channel),
            enabled: false,
        }
    }

    /// `DDLC VVVV`
    pub(super) fn write_control(&mut self, value: u8) {
        self.duty = value >> 6;
        self.envelope.write(value);
    }

    pub(super) fn write_sweep(&mut self, value: u8) {
        self.sweep.write(value);
    }

    /// Low period byte. The running step keeps its phase; the new period
    /// applies from the next step.
    pub(super) fn write_timer_low(&mut self, value: u8) {
        self.period = (self.period & 0x0700) | u16::from(value);
    }

    /// `LLLL LTTT`: length index and period high bits; restarts the duty
    /// sequence and the envelope.
    pub(super) fn write_timer_high(&mut self, value: u8) {
        self.period = (self.period & 0x00FF) | (u16::from(value & 0x07) << 8);
        self.length.load(value >> 3, self.enabled);
        self.step = 0;
        self.envelope.restart();
        self.sweep.reload = true;
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
            self.envelope.clock();
        }
        if clock.half {
            self.length.clock(self.envelope.halts_length());
            self.sweep.clock(&mut self.period);
        }
    }

    pub(super) fn output(&mut self, clock: FrameClock) -> [u8; SLICE_SAMPLES] {
        self.clock_frame(clock);

        let mut out = [0; SLICE_SAMPLES];
        let step_cycles = 2 * (u32::from(self.period) + 1);
        let audible = self.enabled && self.length.active() && !self.sweep.mutes(self.period);
        let volume = self.envelope.volume();
        let duty = &PULSE_DUTY_TABLE[usize::from(self.duty & 0x03)];

        for sample in out.iter_mut() {
            let steps = self.timer.tick(step_cycles);
            self.step = ((u32::from(self.step) + steps) & 0x07) as u8;
            if audible && duty[usize::from(self.step)] != 0 {
                *sample = volume;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse1_negate_subtracts_one_more() {
        let mut sweep = Sweep::new(PulseChannel::Pulse1);
        sweep.write(0b1000_1001);
        assert_eq!(sweep.target(0x100), 0x100 - 0x80 - 1);

        let mut sweep = Sweep::new(PulseChannel::Pulse2);
        sweep.write(0b1000_1001);
        assert_eq!(sweep.target(0x100), 0x80);
    }

    #[test]
    fn overflowing_target_mutes() {
        let mut sweep = Sweep::new(PulseChannel::Pulse2);
        sweep.write(0b0000_0000);
        assert!(sweep.mutes(0x7FF));
        assert!(sweep.mutes(7));
        assert!(!sweep.mutes(0x3FF));
    }

    #[test]
    fn length_load_requires_enable() {
        let mut pulse = Pulse::new(PulseChannel::Pulse1);
        pulse.write_timer_high(0x08);
        assert!(!pulse.length_active());
        pulse.set_enabled(true);
        pulse.write_timer_high(0x08);
        assert!(pulse.length_active());
        pulse.set_enabled(false);
        assert!(!pulse.length_active());
    }

    #[test]
    fn timer_low_keeps_the_duty_phase() {
        let mut pulse = Pulse::new(PulseChannel::Pulse1);
        pulse.set_enabled(true);
        pulse.write_control(0xBF);
        pulse.write_timer_low(0xFF);
        pulse.write_timer_high(0x01);
        pulse.output(FrameClock::default());
        let step = pulse.step;
        pulse.write_timer_low(0x80);
        assert_eq!(pulse.step, step);
        assert_eq!(pulse.period, 0x180);
    }
}
