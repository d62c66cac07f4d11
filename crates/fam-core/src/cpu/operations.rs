//! Instruction semantics. Every handler works on an already resolved
//! [`Operand`]; branches report whether they were taken so the caller can
//! charge the extra cycles.

use crate::bus::Bus;
use crate::cpu::{Cpu, Interrupt, Operand, mnemonic::Mnemonic, status::Status};

impl Cpu {
    pub(super) fn run(&mut self, bus: &mut impl Bus, mnemonic: Mnemonic, operand: Operand) -> bool {
        match mnemonic {
            // Load/Store
            Mnemonic::LDA => {
                self.a = self.load(bus, operand);
                self.p.set_zn(self.a);
            }
            Mnemonic::LDX => {
                self.x = self.load(bus, operand);
                self.p.set_zn(self.x);
            }
            Mnemonic::LDY => {
                self.y = self.load(bus, operand);
                self.p.set_zn(self.y);
            }
            Mnemonic::LAX => {
                let value = self.load(bus, operand);
                self.a = value;
                self.x = value;
                self.p.set_zn(value);
            }
            Mnemonic::STA => self.store(bus, operand, self.a),
            Mnemonic::STX => self.store(bus, operand, self.x),
            Mnemonic::STY => self.store(bus, operand, self.y),
            Mnemonic::SAX => self.store(bus, operand, self.a & self.x),

            // Transfer
            Mnemonic::TAX => {
                self.x = self.a;
                self.p.set_zn(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.p.set_zn(self.y);
            }
            Mnemonic::TSX => {
                self.x = self.s;
                self.p.set_zn(self.x);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.p.set_zn(self.a);
            }
            Mnemonic::TXS => self.s = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.p.set_zn(self.a);
            }

            // Stack
            Mnemonic::PHA => self.push(bus, self.a),
            Mnemonic::PHP => self.push(bus, self.p.pushed(true)),
            Mnemonic::PLA => {
                self.a = self.pull(bus);
                self.p.set_zn(self.a);
            }
            Mnemonic::PLP => self.p = Status::pulled(self.pull(bus)),

            // Shift
            Mnemonic::ASL => {
                self.modify(bus, operand, Self::asl);
            }
            Mnemonic::LSR => {
                self.modify(bus, operand, Self::lsr);
            }
            Mnemonic::ROL => {
                self.modify(bus, operand, Self::rol);
            }
            Mnemonic::ROR => {
                self.modify(bus, operand, Self::ror);
            }

            // Logic
            Mnemonic::AND => {
                self.a &= self.load(bus, operand);
                self.p.set_zn(self.a);
            }
            Mnemonic::EOR => {
                self.a ^= self.load(bus, operand);
                self.p.set_zn(self.a);
            }
            Mnemonic::ORA => {
                self.a |= self.load(bus, operand);
                self.p.set_zn(self.a);
            }
            Mnemonic::BIT => {
                let value = self.load(bus, operand);
                self.p.set(Status::ZERO, self.a & value == 0);
                self.p.set(Status::OVERFLOW, value & 0x40 != 0);
                self.p.set(Status::NEGATIVE, value & 0x80 != 0);
            }

            // Arithmetic
            Mnemonic::ADC => {
                let value = self.load(bus, operand);
                self.add(value);
            }
            Mnemonic::SBC => {
                let value = self.load(bus, operand);
                self.add(!value);
            }
            Mnemonic::CMP => {
                let value = self.load(bus, operand);
                self.compare(self.a, value);
            }
            Mnemonic::CPX => {
                let value = self.load(bus, operand);
                self.compare(self.x, value);
            }
            Mnemonic::CPY => {
                let value = self.load(bus, operand);
                self.compare(self.y, value);
            }

            // Undocumented combined operations
            Mnemonic::SLO => {
                let value = self.modify(bus, operand, Self::asl);
                self.a |= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::RLA => {
                let value = self.modify(bus, operand, Self::rol);
                self.a &= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::SRE => {
                let value = self.modify(bus, operand, Self::lsr);
                self.a ^= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::RRA => {
                let value = self.modify(bus, operand, Self::ror);
                self.add(value);
            }
            Mnemonic::DCP => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_sub(1));
                self.compare(self.a, value);
            }
            Mnemonic::ISC => {
                let value = self.modify(bus, operand, |_, v| v.wrapping_add(1));
                self.add(!value);
            }
            Mnemonic::ANC => {
                self.a &= self.load(bus, operand);
                self.p.set_zn(self.a);
                self.p.set(Status::CARRY, self.a & 0x80 != 0);
            }
            Mnemonic::ASR => {
                let value = self.a & self.load(bus, operand);
                self.a = self.lsr(value);
                self.p.set_zn(self.a);
            }
            Mnemonic::ARR => {
                let value = self.a & self.load(bus, operand);
                self.a = (value >> 1) | (self.p.carry() << 7);
                self.p.set_zn(self.a);
                self.p.set(Status::CARRY, self.a & 0x40 != 0);
                self.p
                    .set(Status::OVERFLOW, ((self.a >> 6) ^ (self.a >> 5)) & 0x01 != 0);
            }
            Mnemonic::SBX => {
                let value = self.load(bus, operand);
                let masked = self.a & self.x;
                self.p.set(Status::CARRY, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.p.set_zn(self.x);
            }

            // Increment/Decrement
            Mnemonic::INC => {
                self.modify(bus, operand, |cpu, v| {
                    let v = v.wrapping_add(1);
                    cpu.p.set_zn(v);
                    v
                });
            }
            Mnemonic::DEC => {
                self.modify(bus, operand, |cpu, v| {
                    let v = v.wrapping_sub(1);
                    cpu.p.set_zn(v);
                    v
                });
            }
            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.p.set_zn(self.x);
            }
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.p.set_zn(self.y);
            }
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.p.set_zn(self.x);
            }
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.p.set_zn(self.y);
            }

            // Control flow
            Mnemonic::BRK => {
                // Skip the padding byte; the vectoring happens at the next
                // instruction boundary.
                self.pc = self.pc.wrapping_add(1);
                self.request_interrupt(Interrupt::Brk);
            }
            Mnemonic::JMP => self.pc = address(operand),
            Mnemonic::JSR => {
                let [lo, hi] = self.pc.wrapping_sub(1).to_le_bytes();
                self.push(bus, hi);
                self.push(bus, lo);
                self.pc = address(operand);
            }
            Mnemonic::RTS => {
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            Mnemonic::RTI => {
                self.p = Status::pulled(self.pull(bus));
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.pc = u16::from_le_bytes([lo, hi]);
            }

            // Branch
            Mnemonic::BCC => return self.branch(operand, !self.p.contains(Status::CARRY)),
            Mnemonic::BCS => return self.branch(operand, self.p.contains(Status::CARRY)),
            Mnemonic::BNE => return self.branch(operand, !self.p.contains(Status::ZERO)),
            Mnemonic::BEQ => return self.branch(operand, self.p.contains(Status::ZERO)),
            Mnemonic::BPL => return self.branch(operand, !self.p.contains(Status::NEGATIVE)),
            Mnemonic::BMI => return self.branch(operand, self.p.contains(Status::NEGATIVE)),
            Mnemonic::BVC => return self.branch(operand, !self.p.contains(Status::OVERFLOW)),
            Mnemonic::BVS => return self.branch(operand, self.p.contains(Status::OVERFLOW)),

            // Flags
            Mnemonic::CLC => self.p.remove(Status::CARRY),
            Mnemonic::CLD => self.p.remove(Status::DECIMAL),
            Mnemonic::CLI => self.p.remove(Status::INTERRUPT),
            Mnemonic::CLV => self.p.remove(Status::OVERFLOW),
            Mnemonic::SEC => self.p.insert(Status::CARRY),
            Mnemonic::SED => self.p.insert(Status::DECIMAL),
            Mnemonic::SEI => self.p.insert(Status::INTERRUPT),

            Mnemonic::NOP => {
                // Multi-byte NOPs still perform their read.
                if let Operand::Address(addr) = operand {
                    bus.read(addr);
                }
            }

            // Filtered out by `is_supported` before dispatch.
            Mnemonic::JAM
            | Mnemonic::LAS
            | Mnemonic::SHA
            | Mnemonic::SHX
            | Mnemonic::SHY
            | Mnemonic::SHS
            | Mnemonic::XAA => {}
        }
        false
    }

    fn load(&self, bus: &mut impl Bus, operand: Operand) -> u8 {
        match operand {
            Operand::Immediate(value) => value,
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator | Operand::Implied => self.a,
        }
    }

    fn store(&mut self, bus: &mut impl Bus, operand: Operand, value: u8) {
        match operand {
            Operand::Address(addr) => bus.write(addr, value),
            Operand::Accumulator => self.a = value,
            Operand::Immediate(_) | Operand::Implied => {}
        }
    }

    /// Read-modify-write on the accumulator or memory; returns the new value.
    fn modify(
        &mut self,
        bus: &mut impl Bus,
        operand: Operand,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) -> u8 {
        let value = self.load(bus, operand);
        let value = f(self, value);
        self.store(bus, operand, value);
        value
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.p.set(Status::CARRY, value & 0x80 != 0);
        let value = value << 1;
        self.p.set_zn(value);
        value
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.p.set(Status::CARRY, value & 0x01 != 0);
        let value = value >> 1;
        self.p.set_zn(value);
        value
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry = self.p.carry();
        self.p.set(Status::CARRY, value & 0x80 != 0);
        let value = (value << 1) | carry;
        self.p.set_zn(value);
        value
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry = self.p.carry();
        self.p.set(Status::CARRY, value & 0x01 != 0);
        let value = (value >> 1) | (carry << 7);
        self.p.set_zn(value);
        value
    }

    /// Binary add with carry. SBC is an add of the inverted operand.
    fn add(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.p.carry());
        let result = sum as u8;
        self.p.set(Status::CARRY, sum > 0xFF);
        self.p.set(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.p.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.p.set(Status::CARRY, register >= value);
        self.p.set_zn(register.wrapping_sub(value));
    }

    fn branch(&mut self, operand: Operand, condition: bool) -> bool {
        if condition {
            self.pc = address(operand);
        }
        condition
    }
}

fn address(operand: Operand) -> u16 {
    match operand {
        Operand::Address(addr) => addr,
        Operand::Immediate(value) => u16::from(value),
        Operand::Implied | Operand::Accumulator => 0,
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::mock::MockBus;
    use crate::cpu::{Cpu, Status};
    use crate::reset_kind::ResetKind;

    /// Runs `program` from `$8000` for `steps` instructions.
    fn run(program: &[u8], steps: usize) -> (Cpu, MockBus) {
        let mut bus = MockBus::with_program(0x8000, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus, ResetKind::PowerOn);
        for _ in 0..steps {
            cpu.step(&mut bus);
        }
        (cpu, bus)
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        // CLC; LDA #$50; ADC #$50
        let (cpu, _) = run(&[0x18, 0xA9, 0x50, 0x69, 0x50], 3);
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.p.contains(Status::OVERFLOW | Status::NEGATIVE));
        assert!(!cpu.p.contains(Status::CARRY));

        // SEC; LDA #$FF; ADC #$01
        let (cpu, _) = run(&[0x38, 0xA9, 0xFF, 0x69, 0x01], 3);
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.p.contains(Status::CARRY));
        assert!(!cpu.p.contains(Status::OVERFLOW));
    }

    #[test]
    fn sbc_borrows_through_carry() {
        // SEC; LDA #$10; SBC #$20
        let (cpu, _) = run(&[0x38, 0xA9, 0x10, 0xE9, 0x20], 3);
        assert_eq!(cpu.a, 0xF0);
        assert!(!cpu.p.contains(Status::CARRY));

        // Undocumented $EB behaves like $E9.
        let (cpu, _) = run(&[0x38, 0xA9, 0x10, 0xEB, 0x08], 3);
        assert_eq!(cpu.a, 0x08);
        assert!(cpu.p.contains(Status::CARRY));
    }

    #[test]
    fn adc_matches_wide_arithmetic() {
        use rand::Rng;

        let mut rng = rand::rng();
        for _ in 0..256 {
            let (a, m, carry) = (rng.random::<u8>(), rng.random::<u8>(), rng.random_bool(0.5));
            // SEC/CLC; LDA #a; ADC #m
            let set = if carry { 0x38 } else { 0x18 };
            let (cpu, _) = run(&[set, 0xA9, a, 0x69, m], 3);

            let sum = u16::from(a) + u16::from(m) + u16::from(carry);
            let signed = i16::from(a as i8) + i16::from(m as i8) + i16::from(carry);
            assert_eq!(cpu.a, sum as u8);
            assert_eq!(cpu.p.contains(Status::CARRY), sum > 0xFF);
            assert_eq!(
                cpu.p.contains(Status::OVERFLOW),
                !(-128..=127).contains(&signed)
            );
        }
    }

    #[test]
    fn decimal_flag_is_kept_but_ignored() {
        // SED; CLC; LDA #$09; ADC #$01
        let (cpu, _) = run(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01], 4);
        assert_eq!(cpu.a, 0x0A);
        assert!(cpu.p.contains(Status::DECIMAL));
    }

    #[test]
    fn compare_sets_carry_when_register_is_not_less() {
        // LDA #$40; CMP #$40; CPX #$01
        let (cpu, _) = run(&[0xA9, 0x40, 0xC9, 0x40], 2);
        assert!(cpu.p.contains(Status::CARRY | Status::ZERO));
        let (cpu, _) = run(&[0xE0, 0x01], 1);
        assert!(!cpu.p.contains(Status::CARRY));
        assert!(cpu.p.contains(Status::NEGATIVE));
    }

    #[test]
    fn shifts_work_on_memory_and_accumulator() {
        // LDA #$81; ASL A; ROR $10 (mem 0x01, carry in 1)
        let (cpu, bus) = {
            let mut bus = MockBus::with_program(0x8000, &[0xA9, 0x81, 0x0A, 0x66, 0x10]);
            bus.mem[0x10] = 0x01;
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus, ResetKind::PowerOn);
            for _ in 0..3 {
                cpu.step(&mut bus);
            }
            (cpu, bus)
        };
        assert_eq!(cpu.a, 0x02);
        assert_eq!(bus.mem[0x10], 0x80);
        assert!(cpu.p.contains(Status::CARRY));
        assert!(cpu.p.contains(Status::NEGATIVE));
    }

    #[test]
    fn jsr_and_rts_round_trip() {
        // JSR $8005; NOP; NOP; LDX #$07; RTS
        let (cpu, bus) = run(&[0x20, 0x05, 0x80, 0xEA, 0xEA, 0xA2, 0x07, 0x60], 3);
        assert_eq!(cpu.x, 0x07);
        assert_eq!(cpu.pc, 0x8003);
        // Return address minus one was pushed high byte first.
        assert_eq!(bus.mem[0x01FF], 0x80);
        assert_eq!(bus.mem[0x01FE], 0x02);
    }

    #[test]
    fn php_plp_handle_break_and_unused_bits() {
        // PHP; PLA; PHA; PLP
        let (cpu, bus) = run(&[0x08, 0x68, 0x48, 0x28], 4);
        assert_eq!(bus.mem[0x01FF] & 0x30, 0x30);
        assert!(!cpu.p.contains(Status::BREAK));
        assert!(cpu.p.contains(Status::UNUSED));
    }

    #[test]
    fn undocumented_combined_operations() {
        let mut bus = MockBus::with_program(
            0x8000,
            &[
                0xA7, 0x20, // LAX $20
                0x87, 0x21, // SAX $21
                0xC7, 0x22, // DCP $22
                0xE7, 0x23, // ISC $23
                0x07, 0x24, // SLO $24
            ],
        );
        bus.mem[0x20] = 0x0F;
        bus.mem[0x22] = 0x10;
        bus.mem[0x23] = 0xFF;
        bus.mem[0x24] = 0x40;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus, ResetKind::PowerOn);

        cpu.step(&mut bus);
        assert_eq!((cpu.a, cpu.x), (0x0F, 0x0F));
        cpu.step(&mut bus);
        assert_eq!(bus.mem[0x21], 0x0F);
        cpu.step(&mut bus);
        assert_eq!(bus.mem[0x22], 0x0F);
        assert!(cpu.p.contains(Status::ZERO | Status::CARRY));
        cpu.step(&mut bus);
        assert_eq!(bus.mem[0x23], 0x00);
        assert_eq!(cpu.a, 0x0F);
        cpu.step(&mut bus);
        assert_eq!(bus.mem[0x24], 0x80);
        assert_eq!(cpu.a, 0x8F);
    }

    #[test]
    fn immediate_undocumented_operations() {
        // LDA #$FF; ANC #$80
        let (cpu, _) = run(&[0xA9, 0xFF, 0x0B, 0x80], 2);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.p.contains(Status::CARRY | Status::NEGATIVE));

        // LDA #$FF; ALR #$03
        let (cpu, _) = run(&[0xA9, 0xFF, 0x4B, 0x03], 2);
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.p.contains(Status::CARRY));

        // SEC; LDA #$FF; ARR #$C0
        let (cpu, _) = run(&[0x38, 0xA9, 0xFF, 0x6B, 0xC0], 3);
        assert_eq!(cpu.a, 0xE0);
        assert!(cpu.p.contains(Status::CARRY));
        assert!(!cpu.p.contains(Status::OVERFLOW));

        // LDA #$F0; LDX #$3C; SBX #$10
        let (cpu, _) = run(&[0xA9, 0xF0, 0xA2, 0x3C, 0xCB, 0x10], 3);
        assert_eq!(cpu.x, 0x20);
        assert!(cpu.p.contains(Status::CARRY));
    }

    #[test]
    fn bit_copies_high_bits_of_memory() {
        let mut bus = MockBus::with_program(0x8000, &[0xA9, 0x01, 0x24, 0x30]);
        bus.mem[0x30] = 0xC0;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus, ResetKind::PowerOn);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert!(cpu.p.contains(Status::ZERO | Status::OVERFLOW | Status::NEGATIVE));
        assert_eq!(cpu.a, 0x01);
    }
}
