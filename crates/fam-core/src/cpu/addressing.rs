use std::fmt::Display;

/// 6502 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// `CLC`, `RTS`: no operand.
    Implied,
    /// `ASL A`
    Accumulator,
    /// `LDA #$42`
    Immediate,
    /// `LDA $1234`
    Absolute,
    /// `LDA $1234,X`; crossing a page may cost a cycle.
    AbsoluteX,
    /// `LDA $1234,Y`; crossing a page may cost a cycle.
    AbsoluteY,
    /// `JMP ($1234)`. The high byte is fetched without carrying into the
    /// pointer's page, so `($10FF)` reads `$10FF` and `$1000`.
    Indirect,
    /// `LDA $42`
    ZeroPage,
    /// `LDA $42,X`, wrapping inside the zero page.
    ZeroPageX,
    /// `LDX $42,Y`, wrapping inside the zero page.
    ZeroPageY,
    /// `LDA ($42,X)`
    IndirectX,
    /// `LDA ($42),Y`
    IndirectY,
    /// Branch offset, signed, relative to the next instruction.
    Relative,
}

impl Addressing {
    /// Operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            Addressing::Implied | Addressing::Accumulator => 0,
            Addressing::Absolute
            | Addressing::AbsoluteX
            | Addressing::AbsoluteY
            | Addressing::Indirect => 2,
            _ => 1,
        }
    }
}

impl Display for Addressing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Addressing::Implied => "imp",
            Addressing::Accumulator => "acc",
            Addressing::Immediate => "imm",
            Addressing::Absolute => "abs",
            Addressing::AbsoluteX => "abs,x",
            Addressing::AbsoluteY => "abs,y",
            Addressing::Indirect => "(ind)",
            Addressing::ZeroPage => "zp",
            Addressing::ZeroPageX => "zp,x",
            Addressing::ZeroPageY => "zp,y",
            Addressing::IndirectX => "(zp,x)",
            Addressing::IndirectY => "(zp),y",
            Addressing::Relative => "rel",
        };
        f.write_str(text)
    }
}
