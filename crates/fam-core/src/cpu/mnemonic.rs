use std::fmt::Display;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    // Load/Store
    LAS,
    LAX,
    LDA,
    LDX,
    LDY,
    SAX,
    SHA,
    SHX,
    SHY,
    STA,
    STX,
    STY,
    // Transfer
    SHS,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
    // Stack
    PHA,
    PHP,
    PLA,
    PLP,
    // Shift
    ASL,
    LSR,
    ROL,
    ROR,
    // Logic
    AND,
    BIT,
    EOR,
    ORA,
    // Arithmetic
    ADC,
    ANC,
    ARR,
    ASR,
    CMP,
    CPX,
    CPY,
    DCP,
    ISC,
    RLA,
    RRA,
    SBC,
    SBX,
    SLO,
    SRE,
    XAA,
    // Increment/Decrement
    DEC,
    DEX,
    DEY,
    INC,
    INX,
    INY,
    // Control flow
    BRK,
    JMP,
    JSR,
    RTI,
    RTS,
    // Branch
    BCC,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BVC,
    BVS,
    // Flags
    CLC,
    CLD,
    CLI,
    CLV,
    SEC,
    SED,
    SEI,
    JAM,
    NOP,
}

impl Mnemonic {
    /// Opcodes that lock the bus (`JAM`) or whose result depends on analog
    /// effects are not emulated.
    pub const fn is_supported(self) -> bool {
        !matches!(
            self,
            Mnemonic::JAM
                | Mnemonic::LAS
                | Mnemonic::SHA
                | Mnemonic::SHX
                | Mnemonic::SHY
                | Mnemonic::SHS
                | Mnemonic::XAA
        )
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
