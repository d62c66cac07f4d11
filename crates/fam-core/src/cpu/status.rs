use bitflags::bitflags;

bitflags! {
    /// Processor status register (P).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N V _ B D I Z C
    /// ```
    ///
    /// `B` and `_` only exist in the copy pushed to the stack; `D` is stored
    /// but arithmetic is always binary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const CARRY     = 0b0000_0001;
        const ZERO      = 0b0000_0010;
        const INTERRUPT = 0b0000_0100;
        const DECIMAL   = 0b0000_1000;
        const BREAK     = 0b0001_0000;
        const UNUSED    = 0b0010_0000;
        const OVERFLOW  = 0b0100_0000;
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::INTERRUPT | Status::UNUSED
    }
}

impl Status {
    /// Zero and negative from an 8-bit result.
    pub(crate) fn set_zn(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    pub(crate) fn carry(self) -> u8 {
        (self & Status::CARRY).bits()
    }

    /// Byte pushed by PHP/BRK (`brk == true`) or by hardware interrupts.
    pub(crate) fn pushed(self, brk: bool) -> u8 {
        let mut value = self | Status::UNUSED;
        value.set(Status::BREAK, brk);
        value.bits()
    }

    /// Value restored by PLP/RTI: `B` is dropped, `_` reads as set.
    pub(crate) fn pulled(value: u8) -> Self {
        (Status::from_bits_retain(value) - Status::BREAK) | Status::UNUSED
    }
}
