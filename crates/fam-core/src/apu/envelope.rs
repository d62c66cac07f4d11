//! Volume envelope of the pulse and noise channels.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Envelope {
    /// Also halts the channel's length counter.
    looping: bool,
    constant: bool,
    /// Constant volume, or the divider period in envelope mode.
    param: u8,
    start: bool,
    divider: u8,
    decay: u8,
}

impl Envelope {
    /// `--LC VVVV` part of the channel control register.
    pub(super) fn write(&mut self, value: u8) {
        self.looping = value & 0x20 != 0;
        self.constant = value & 0x10 != 0;
        self.param = value & 0x0F;
    }

    pub(super) fn restart(&mut self) {
        self.start = true;
    }

    pub(super) fn halts_length(&self) -> bool {
        self.looping
    }

    /// Quarter-frame clock.
    pub(super) fn clock(&mut self) {
        if std::mem::take(&mut self.start) {
            self.decay = 15;
            self.divider = self.param;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.param;
            self.decay = match self.decay {
                0 if self.looping => 15,
                0 => 0,
                level => level - 1,
            };
        }
    }

    pub(super) fn volume(&self) -> u8 {
        if self.constant { self.param } else { self.decay }
    }
}
