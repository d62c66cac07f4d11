//! Length counter shared by the pulse, triangle and noise channels.

use super::tables::LENGTH_TABLE;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct LengthCounter {
    value: u8,
}

impl LengthCounter {
    /// Loads the table entry for `index`; disabled channels ignore loads.
    pub(super) fn load(&mut self, index: u8, enabled: bool) {
        if enabled {
            self.value = LENGTH_TABLE[usize::from(index & 0x1F)];
        }
    }

    pub(super) fn clear(&mut self) {
        self.value = 0;
    }

    pub(super) fn active(&self) -> bool {
        self.value > 0
    }

    /// Half-frame clock.
    pub(super) fn clock(&mut self, halt: bool) {
        if !halt && self.value > 0 {
            self.value -= 1;
        }
    }
}
