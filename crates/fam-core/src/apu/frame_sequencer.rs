//! Frame sequencer: distributes quarter/half-frame clocks across the four
//! audio slices of each video frame.

/// Clocks delivered to the channels at the start of one slice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameClock {
    /// Envelopes and the triangle linear counter.
    pub quarter: bool,
    /// Length counters and sweep units.
    pub half: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameMode {
    #[default]
    FourStep,
    FiveStep,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct FrameSequencer {
    mode: FrameMode,
    step: u8,
    irq_inhibit: bool,
    irq_pending: bool,
}

impl FrameSequencer {
    /// `$4017`: `MI-- ----`. Restarts the sequence.
    pub(super) fn write(&mut self, value: u8) {
        self.mode = if value & 0x80 != 0 {
            FrameMode::FiveStep
        } else {
            FrameMode::FourStep
        };
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_pending = false;
        }
        self.step = 0;
    }

    pub(super) fn mode(&self) -> FrameMode {
        self.mode
    }

    pub(super) fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    pub(super) fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    /// Advances one step and returns the clocks it fires.
    pub(super) fn next(&mut self) -> FrameClock {
        let step = self.step;
        match self.mode {
            FrameMode::FourStep => {
                self.step = (step + 1) % 4;
                if self.step == 0 && !self.irq_inhibit {
                    self.irq_pending = true;
                }
                FrameClock {
                    quarter: true,
                    half: step % 2 == 1,
                }
            }
            FrameMode::FiveStep => {
                self.step = (step + 1) % 5;
                FrameClock {
                    quarter: step != 3,
                    half: step == 1 || step == 4,
                }
            }
        }
    }
}
