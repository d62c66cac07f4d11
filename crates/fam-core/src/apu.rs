//! Audio Processing Unit (APU).
//!
//! Five channels (2x pulse, triangle, noise, DMC) behind the `$4000-$4017`
//! registers. Audio is produced in slices: the frame orchestrator calls
//! [`Apu::step_frame`] at four fixed scanlines, each call advancing the
//! frame sequencer by one step and rendering [`SLICE_SAMPLES`] 8-bit PCM
//! samples through the nonlinear mixer.

mod dmc;
mod envelope;
mod frame_sequencer;
mod length_counter;
mod noise;
mod pulse;
mod tables;
mod timer;
mod triangle;

use tracing::trace;

use crate::{memory::apu::Register, reset_kind::ResetKind};

pub use frame_sequencer::{FrameClock, FrameMode};

use dmc::Dmc;
use frame_sequencer::FrameSequencer;
use noise::Noise;
use pulse::{Pulse, PulseChannel};
use tables::{PULSE_MIX, TND_MIX};
use triangle::Triangle;

/// NTSC CPU clock in Hz.
pub const CPU_CLOCK_NTSC: u32 = 1_789_773;
pub const SAMPLE_RATE: u32 = 22_080;
pub const SLICE_SAMPLES: usize = 92;
pub const SLICES_PER_FRAME: usize = 4;
pub const FRAME_SAMPLES: usize = SLICE_SAMPLES * SLICES_PER_FRAME;

/// CPU cycles per output sample in 16.16 fixed point.
pub(crate) const CYCLES_PER_SAMPLE: u32 =
    (((CPU_CLOCK_NTSC as u64) << 16) / SAMPLE_RATE as u64) as u32;

/// `$4015` read bits.
mod status {
    pub(super) const PULSE1: u8 = 0x01;
    pub(super) const PULSE2: u8 = 0x02;
    pub(super) const TRIANGLE: u8 = 0x04;
    pub(super) const NOISE: u8 = 0x08;
    pub(super) const DMC: u8 = 0x10;
    pub(super) const FRAME_IRQ: u8 = 0x40;
    pub(super) const DMC_IRQ: u8 = 0x80;
}

#[derive(Debug, Clone)]
pub struct Apu {
    pulse: [Pulse; 2],
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    sequencer: FrameSequencer,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            pulse: [
                Pulse::new(PulseChannel::Pulse1),
                Pulse::new(PulseChannel::Pulse2),
            ],
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            sequencer: FrameSequencer::default(),
        }
    }

    /// Power-on clears everything. A soft reset silences the channels as a
    /// `$4015 = 0` write would and drops pending interrupts.
    pub fn reset(&mut self, kind: ResetKind) {
        match kind {
            ResetKind::PowerOn => *self = Self::new(),
            ResetKind::Soft => {
                self.write_status(0);
                self.sequencer.clear_irq();
            }
        }
    }

    /// Write to a CPU address in `$4000-$4017`; addresses that are not APU
    /// registers are ignored.
    pub fn write(&mut self, addr: u16, value: u8) {
        match Register::from_cpu_addr(addr) {
            Some(register) => self.write_register(register, value),
            None => trace!(addr = format_args!("{addr:#06X}"), "write outside APU registers"),
        }
    }

    pub fn write_register(&mut self, register: Register, value: u8) {
        match register {
            Register::Pulse1Control => self.pulse[0].write_control(value),
            Register::Pulse1Sweep => self.pulse[0].write_sweep(value),
            Register::Pulse1TimerLow => self.pulse[0].write_timer_low(value),
            Register::Pulse1TimerHigh => self.pulse[0].write_timer_high(value),
            Register::Pulse2Control => self.pulse[1].write_control(value),
            Register::Pulse2Sweep => self.pulse[1].write_sweep(value),
            Register::Pulse2TimerLow => self.pulse[1].write_timer_low(value),
            Register::Pulse2TimerHigh => self.pulse[1].write_timer_high(value),
            Register::TriangleLinear => self.triangle.write_linear(value),
            Register::TriangleTimerLow => self.triangle.write_timer_low(value),
            Register::TriangleTimerHigh => self.triangle.write_timer_high(value),
            Register::NoiseControl => self.noise.write_control(value),
            Register::NoisePeriod => self.noise.write_period(value),
            Register::NoiseLength => self.noise.write_length(value),
            Register::DmcControl => self.dmc.write_control(value),
            Register::DmcDirectLoad => self.dmc.write_direct_load(value),
            Register::DmcAddress => self.dmc.write_address(value),
            Register::DmcLength => self.dmc.write_length(value),
            Register::Status => self.write_status(value),
            Register::FrameCounter => self.sequencer.write(value),
        }
    }

    /// `$4015` write: `---D NT21` channel enables.
    fn write_status(&mut self, value: u8) {
        self.pulse[0].set_enabled(value & status::PULSE1 != 0);
        self.pulse[1].set_enabled(value & status::PULSE2 != 0);
        self.triangle.set_enabled(value & status::TRIANGLE != 0);
        self.noise.set_enabled(value & status::NOISE != 0);
        self.dmc.set_enabled(value & status::DMC != 0);
    }

    /// `$4015` read. Clears the frame interrupt flag.
    pub fn read_status(&mut self) -> u8 {
        let mut value = 0;
        for (active, bit) in [
            (self.pulse[0].length_active(), status::PULSE1),
            (self.pulse[1].length_active(), status::PULSE2),
            (self.triangle.length_active(), status::TRIANGLE),
            (self.noise.length_active(), status::NOISE),
            (self.dmc.active(), status::DMC),
            (self.sequencer.irq_pending(), status::FRAME_IRQ),
            (self.dmc.irq_pending(), status::DMC_IRQ),
        ] {
            if active {
                value |= bit;
            }
        }
        self.sequencer.clear_irq();
        value
    }

    /// Level of the APU's IRQ output (frame sequencer or DMC end).
    pub fn irq_pending(&self) -> bool {
        self.sequencer.irq_pending() || self.dmc.irq_pending()
    }

    pub fn frame_mode(&self) -> FrameMode {
        self.sequencer.mode()
    }

    /// Runs one sequencer step and renders one slice of PCM. `reader` fetches
    /// DMC sample bytes from CPU address space.
    pub fn step_frame(&mut self, reader: &mut dyn FnMut(u16) -> u8) -> [u8; SLICE_SAMPLES] {
        let clock = self.sequencer.next();
        let pulse1 = self.pulse[0].output(clock);
        let pulse2 = self.pulse[1].output(clock);
        let triangle = self.triangle.output(clock);
        let noise = self.noise.output(clock);
        let dmc = self.dmc.output(reader);

        let mut out = [0; SLICE_SAMPLES];
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = mix(pulse1[i], pulse2[i], triangle[i], noise[i], dmc[i]);
        }
        out
    }
}

/// Nonlinear mix of the channel levels into one 8-bit sample.
pub fn mix(pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> u8 {
    let pulse = PULSE_MIX[usize::from(pulse1 + pulse2).min(30)];
    let tnd_index = 3 * usize::from(triangle) + 2 * usize::from(noise) + usize::from(dmc);
    let tnd = TND_MIX[tnd_index.min(202)];
    ((pulse + tnd) * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_samples(_addr: u16) -> u8 {
        0
    }

    #[test]
    fn mixer_spans_the_byte_range() {
        assert_eq!(mix(0, 0, 0, 0, 0), 0);
        assert_eq!(mix(15, 15, 15, 15, 127), 255);
        assert!(mix(15, 0, 0, 0, 0) > mix(8, 0, 0, 0, 0));
    }

    #[test]
    fn status_reports_length_counters_and_clears_frame_irq() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0x0F);
        apu.write(0x4003, 0x08);
        apu.write(0x400F, 0x08);

        for _ in 0..SLICES_PER_FRAME {
            apu.step_frame(&mut no_samples);
        }
        assert!(apu.irq_pending());

        let value = apu.read_status();
        assert_eq!(value & 0x0F, 0x09);
        assert_eq!(value & 0x40, 0x40);
        assert!(!apu.irq_pending());
        assert_eq!(apu.read_status() & 0x40, 0);
    }

    #[test]
    fn disabling_a_channel_clears_its_length() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0x01);
        apu.write(0x4003, 0x08);
        assert_eq!(apu.read_status() & 0x01, 0x01);
        apu.write(0x4015, 0x00);
        assert_eq!(apu.read_status() & 0x01, 0x00);
    }

    /// Average distance in samples between rising edges of `samples`.
    fn mean_period(samples: &[u8]) -> f64 {
        let rising: Vec<usize> = samples
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1] > pair[0])
            .map(|(i, _)| i)
            .collect();
        assert!(rising.len() >= 2, "no rising edges in {} samples", samples.len());
        let span = (rising[rising.len() - 1] - rising[0]) as f64;
        span / (rising.len() - 1) as f64
    }

    #[test]
    fn pulse_period_matches_timer_value() {
        let mut apu = Apu::new();
        let timer: u16 = 0x0FD;
        apu.write(0x4015, 0x01);
        apu.write(0x4000, 0xBF); // 50% duty, constant volume 15, halt
        apu.write(0x4002, (timer & 0xFF) as u8);
        apu.write(0x4003, 0x08 | (timer >> 8) as u8);

        let mut samples = Vec::new();
        for _ in 0..SLICES_PER_FRAME * 10 {
            samples.extend_from_slice(&apu.step_frame(&mut no_samples));
        }

        let cycles = 8.0 * 2.0 * (f64::from(timer) + 1.0);
        let expected = cycles * f64::from(SAMPLE_RATE) / f64::from(CPU_CLOCK_NTSC);
        let measured = mean_period(&samples);
        assert!(
            (measured - expected).abs() < 0.5,
            "measured {measured}, expected {expected}"
        );
    }

    #[test]
    fn dmc_reader_sees_cpu_addresses() {
        let mut apu = Apu::new();
        apu.write(0x4010, 0x0F);
        apu.write(0x4012, 0x01);
        apu.write(0x4013, 0x00);
        apu.write(0x4015, 0x10);

        let mut seen = Vec::new();
        apu.step_frame(&mut |addr| {
            seen.push(addr);
            0xAA
        });
        assert_eq!(seen, vec![0xC040]);
        assert_eq!(apu.read_status() & 0x10, 0);
    }
}
