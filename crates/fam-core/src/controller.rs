//! Standard pad readable through `$4016/$4017`.
//!
//! Buttons arrive once per frame from the host. Every press seen since the
//! last strobe is kept in a sticky mask and OR-ed into the serial output, so
//! a press shorter than a frame still reaches a game that polls late.

/// Button ordering follows the pad's shift register bit layout (A first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Upper data lines float high.
const OPEN_BUS_BITS: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controller {
    strobe: bool,
    current: u8,
    sticky: u8,
    index: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches this frame's button mask.
    pub fn set_buttons(&mut self, buttons: u8) {
        self.current = buttons;
        self.sticky |= buttons;
    }

    pub fn buttons(&self) -> u8 {
        self.current
    }

    /// `$4016` strobe bit. Falling from 1 to 0 restarts the serial read and
    /// forgets presses that are no longer held.
    pub fn write_strobe(&mut self, data: u8) {
        let strobe = data & 0x01 != 0;
        if self.strobe && !strobe {
            self.sticky = 0;
            self.index = 0;
        }
        self.strobe = strobe;
    }

    /// Next button bit, A first. Reads past the eighth return 1; while the
    /// strobe is held every read returns A.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.index = 0;
        }
        let bit = match self.index {
            0..=7 => ((self.current | self.sticky) >> self.index) & 0x01,
            _ => 1,
        };
        self.index = self.index.saturating_add(1);
        bit | OPEN_BUS_BITS
    }
}
