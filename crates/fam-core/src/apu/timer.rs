use super::CYCLES_PER_SAMPLE;

/// Sample-rate divider: accumulates CPU cycles in 16.16 fixed point and
/// reports how many channel steps of a given length have elapsed.
///
/// The remainder carries across period changes, so rewriting a period never
/// restarts the waveform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Timer {
    acc: u32,
}

impl Timer {
    /// Advances by one output sample; `period` is in CPU cycles per step.
    #[inline]
    pub(super) fn tick(&mut self, period: u32) -> u32 {
        let period = period.max(1) << 16;
        self.acc += CYCLES_PER_SAMPLE;
        let steps = self.acc / period;
        self.acc %= period;
        steps
    }
}
