use std::fmt::Display;

use tracing::{Level, trace, warn};

use crate::bus::{Bus, STACK_ADDR};
use crate::cpu::addressing::Addressing;
use crate::cpu::lookup::{Instruction, LOOKUP_TABLE};
use crate::memory::cpu::{IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
use crate::reset_kind::ResetKind;

mod addressing;
mod cycle;
mod lookup;
mod mnemonic;
mod operations;
mod status;

pub use status::Status;

/// CPU cycles available per scanline (341 PPU dots / 3).
pub const CYCLES_PER_SCANLINE: u32 = 114;
/// Cost charged for an opcode that is not emulated.
const UNSUPPORTED_OPCODE_CYCLES: u32 = 20;
/// Cost of pushing state and jumping through a vector.
const INTERRUPT_CYCLES: u32 = 7;

/// Interrupt latched for the next instruction boundary.
///
/// Variants are ordered by priority, so a newly requested interrupt only
/// replaces a pending one that compares lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Interrupt {
    #[default]
    None,
    Irq,
    Brk,
    Nmi,
    Reset,
}

/// Resolved operand of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    Address(u16),
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Implied => Ok(()),
            Operand::Accumulator => f.write_str("A"),
            Operand::Immediate(value) => write!(f, "#${value:02X}"),
            Operand::Address(addr) => write!(f, "${addr:04X}"),
        }
    }
}

/// One executed instruction as printed in the trace log.
struct Disassembly {
    pc: u16,
    opcode: u8,
    instruction: Instruction,
    operand: Operand,
}

impl Display for Disassembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operand = self.operand.to_string();
        write!(
            f,
            "{:04X}  {:02X}  {} {:<6} [{}]",
            self.pc, self.opcode, self.instruction.mnemonic, operand, self.instruction.addressing,
        )
    }
}

/// Register file as seen from outside, mainly for tests and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    // Registers
    a: u8,     //Accumulator
    x: u8,     //X Index Register
    y: u8,     //Y Index Register
    s: u8,     //Stack Pointer
    p: Status, //Processor Status
    pc: u16,   //Program Counter

    pending: Interrupt,
    /// Cycles consumed in the current scanline; may run past the budget and
    /// the surplus is carried into the next line.
    cycles: u32,
    /// Scanline currently executing, for diagnostics.
    line: u16,
    /// One bit per opcode value already reported as unsupported.
    warned: [u64; 4],
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Create a new CPU instance with power-on register values.
    /// Does not fetch the reset vector; call [`Cpu::reset`] for that.
    pub fn new() -> Self {
        Self {
            a: 0x00,
            x: 0x00,
            y: 0x00,
            s: 0xFF,
            p: Status::default(),
            pc: 0x0000,
            pending: Interrupt::None,
            cycles: 0,
            line: 0,
            warned: [0; 4],
        }
    }

    /// Loads PC from the reset vector and masks interrupts.
    ///
    /// Power-on clears the registers and puts the stack pointer at `$FF`; the
    /// reset button keeps them and moves the stack pointer down by three, as
    /// the hardware's suppressed pushes do.
    pub fn reset(&mut self, bus: &mut impl Bus, kind: ResetKind) {
        match kind {
            ResetKind::PowerOn => {
                self.a = 0;
                self.x = 0;
                self.y = 0;
                self.s = 0xFF;
                self.p = Status::default();
                self.warned = [0; 4];
            }
            ResetKind::Soft => {
                self.s = self.s.wrapping_sub(3);
            }
        }
        self.p.insert(Status::INTERRUPT);
        self.pc = read_word(bus, RESET_VECTOR);
        self.cycles = 0;
        self.pending = Interrupt::None;
    }

    /// Latches `kind` unless a higher-priority interrupt is already waiting.
    pub fn request_interrupt(&mut self, kind: Interrupt) {
        if kind > self.pending {
            self.pending = kind;
        }
    }

    pub fn pending_interrupt(&self) -> Interrupt {
        self.pending
    }

    /// Runs instructions until this scanline's cycle budget is used up.
    pub fn execute(&mut self, bus: &mut impl Bus, line: u16) {
        self.line = line;
        while self.cycles < CYCLES_PER_SCANLINE {
            let spent = self.step(bus);
            self.cycles += spent + bus.take_stall_cycles();
        }
        self.cycles -= CYCLES_PER_SCANLINE;
    }

    /// Services a pending interrupt or executes one instruction, returning
    /// the cycles it took.
    pub fn step(&mut self, bus: &mut impl Bus) -> u32 {
        self.poll_interrupts(bus);
        if let Some(cycles) = self.service_interrupt(bus) {
            return cycles;
        }

        let opcode_pc = self.pc;
        let opcode = self.fetch(bus);
        let instruction = LOOKUP_TABLE[opcode as usize];
        if !instruction.mnemonic.is_supported() {
            self.report_unsupported(opcode, opcode_pc);
            return UNSUPPORTED_OPCODE_CYCLES;
        }

        let (operand, crossed) = self.resolve(bus, instruction.addressing);
        if tracing::enabled!(Level::TRACE) {
            let disassembly = Disassembly {
                pc: opcode_pc,
                opcode,
                instruction,
                operand,
            };
            trace!(line = self.line, "{} {}", disassembly, self);
        }
        let taken = self.run(bus, instruction.mnemonic, operand);
        instruction.cycle.cost(crossed, taken)
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            a: self.a,
            x: self.x,
            y: self.y,
            s: self.s,
            p: self.p,
        }
    }

    /// NMI is edge triggered and consumed; IRQ is a level, so a pending IRQ
    /// is withdrawn once every source releases the line.
    fn poll_interrupts(&mut self, bus: &mut impl Bus) {
        if bus.take_nmi() {
            self.request_interrupt(Interrupt::Nmi);
        }
        if bus.irq_pending() {
            self.request_interrupt(Interrupt::Irq);
        } else if self.pending == Interrupt::Irq {
            self.pending = Interrupt::None;
        }
    }

    fn service_interrupt(&mut self, bus: &mut impl Bus) -> Option<u32> {
        let masked = self.p.contains(Status::INTERRUPT);
        let (vector, brk, cycles) = match self.pending {
            Interrupt::None => return None,
            Interrupt::Reset => {
                trace!(pc = self.pc, "reset requested");
                self.reset(bus, ResetKind::Soft);
                return Some(INTERRUPT_CYCLES);
            }
            Interrupt::Nmi => (NMI_VECTOR, false, INTERRUPT_CYCLES),
            Interrupt::Irq if !masked => (IRQ_VECTOR, false, INTERRUPT_CYCLES),
            // The BRK opcode already paid for its seven cycles.
            Interrupt::Brk if !masked => (IRQ_VECTOR, true, 0),
            Interrupt::Irq | Interrupt::Brk => return None,
        };

        let [lo, hi] = self.pc.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
        self.push(bus, self.p.pushed(brk));
        self.p.insert(Status::INTERRUPT);
        self.pc = read_word(bus, vector);
        self.pending = Interrupt::None;
        Some(cycles)
    }

    fn report_unsupported(&mut self, opcode: u8, pc: u16) {
        let (word, bit) = (usize::from(opcode >> 6), 1u64 << (opcode & 0x3F));
        if self.warned[word] & bit == 0 {
            self.warned[word] |= bit;
            warn!(
                opcode = format_args!("{opcode:#04X}"),
                pc = format_args!("{pc:#06X}"),
                line = self.line,
                "unsupported opcode, skipping"
            );
        } else {
            trace!(
                opcode = format_args!("{opcode:#04X}"),
                pc = format_args!("{pc:#06X}"),
                "unsupported opcode"
            );
        }
    }

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Decodes the operand bytes and reports whether indexing crossed a page.
    fn resolve(&mut self, bus: &mut impl Bus, addressing: Addressing) -> (Operand, bool) {
        match addressing {
            Addressing::Implied => (Operand::Implied, false),
            Addressing::Accumulator => (Operand::Accumulator, false),
            Addressing::Immediate => (Operand::Immediate(self.fetch(bus)), false),
            Addressing::ZeroPage => (Operand::Address(u16::from(self.fetch(bus))), false),
            Addressing::ZeroPageX => {
                let addr = self.fetch(bus).wrapping_add(self.x);
                (Operand::Address(u16::from(addr)), false)
            }
            Addressing::ZeroPageY => {
                let addr = self.fetch(bus).wrapping_add(self.y);
                (Operand::Address(u16::from(addr)), false)
            }
            Addressing::Absolute => (Operand::Address(self.fetch_word(bus)), false),
            Addressing::AbsoluteX => {
                let base = self.fetch_word(bus);
                indexed(base, self.x)
            }
            Addressing::AbsoluteY => {
                let base = self.fetch_word(bus);
                indexed(base, self.y)
            }
            Addressing::Indirect => {
                let ptr = self.fetch_word(bus);
                // The high byte never carries out of the pointer's page.
                let lo = bus.read(ptr);
                let hi = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
                (Operand::Address(u16::from_le_bytes([lo, hi])), false)
            }
            Addressing::IndirectX => {
                let zp = self.fetch(bus).wrapping_add(self.x);
                (Operand::Address(read_zp_word(bus, zp)), false)
            }
            Addressing::IndirectY => {
                let zp = self.fetch(bus);
                let base = read_zp_word(bus, zp);
                indexed(base, self.y)
            }
            Addressing::Relative => {
                let offset = self.fetch(bus) as i8;
                let target = self.pc.wrapping_add(offset as u16);
                (Operand::Address(target), page_crossed(self.pc, target))
            }
        }
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(STACK_ADDR | u16::from(self.s), value);
        self.s = self.s.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(STACK_ADDR | u16::from(self.s))
    }
}

impl Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[a:0x{:02x},x:0x{:02x},y:0x{:02x},s:0x{:02x},p:0x{:02x},pc:0x{:04x}]",
            self.a,
            self.x,
            self.y,
            self.s,
            self.p.bits(),
            self.pc
        )
    }
}

fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
    let lo = bus.read(addr);
    let hi = bus.read(addr.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

fn read_zp_word(bus: &mut impl Bus, zp: u8) -> u16 {
    let lo = bus.read(u16::from(zp));
    let hi = bus.read(u16::from(zp.wrapping_add(1)));
    u16::from_le_bytes([lo, hi])
}

fn indexed(base: u16, index: u8) -> (Operand, bool) {
    let addr = base.wrapping_add(u16::from(index));
    (Operand::Address(addr), page_crossed(base, addr))
}

#[inline]
fn page_crossed(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}
