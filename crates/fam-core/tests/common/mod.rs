#![allow(dead_code)]

use anyhow::{Context, Result};
use fam_core::{
    Famicom,
    request::{Command, InitParam, Request, Response},
};

pub const PRG_BANK: usize = 0x4000;
pub const CHR_BANK: usize = 0x2000;

/// Synthetic iNES image. Code and vectors live in the last 16 KiB bank,
/// which every board under test keeps fixed at `$C000`.
#[derive(Debug, Clone)]
pub struct Image {
    mapper: u8,
    flags6: u8,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Image {
    pub fn new(mapper: u8, prg_banks: usize, chr_banks: usize) -> Self {
        Self {
            mapper,
            flags6: 0,
            prg: vec![0; prg_banks * PRG_BANK],
            chr: vec![0; chr_banks * CHR_BANK],
        }
    }

    pub fn battery(mut self) -> Self {
        self.flags6 |= 0x02;
        self
    }

    fn fixed_offset(&self, addr: u16) -> usize {
        self.prg.len() - PRG_BANK + usize::from(addr & 0x3FFF)
    }

    pub fn code_at(mut self, addr: u16, code: &[u8]) -> Self {
        let start = self.fixed_offset(addr);
        self.prg[start..start + code.len()].copy_from_slice(code);
        self
    }

    pub fn vectors(self, nmi: u16, reset: u16, irq: u16) -> Self {
        let mut bytes = Vec::with_capacity(6);
        for vector in [nmi, reset, irq] {
            bytes.extend(vector.to_le_bytes());
        }
        self.code_at(0xFFFA, &bytes)
    }

    /// Writes `value` at `offset` of switchable 16 KiB bank `bank`.
    pub fn prg_byte(mut self, bank: usize, offset: usize, value: u8) -> Self {
        self.prg[bank * PRG_BANK + offset] = value;
        self
    }

    pub fn chr_mut(&mut self) -> &mut [u8] {
        &mut self.chr
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = vec![
            b'N',
            b'E',
            b'S',
            0x1A,
            (self.prg.len() / PRG_BANK) as u8,
            (self.chr.len() / CHR_BANK) as u8,
            (self.mapper << 4) | self.flags6,
            self.mapper & 0xF0,
        ];
        bytes.resize(16, 0);
        bytes.extend_from_slice(&self.prg);
        bytes.extend_from_slice(&self.chr);
        bytes
    }
}

/// Grows a program placed at `origin` and resolves jump targets as it goes.
#[derive(Debug, Clone)]
pub struct Program {
    origin: u16,
    code: Vec<u8>,
}

impl Program {
    pub fn new(origin: u16) -> Self {
        Self {
            origin,
            code: Vec::new(),
        }
    }

    /// CPU address of the next emitted byte.
    pub fn here(&self) -> u16 {
        self.origin + self.code.len() as u16
    }

    pub fn emit(&mut self, bytes: &[u8]) -> &mut Self {
        self.code.extend_from_slice(bytes);
        self
    }

    /// `LDA #value` followed by `STA addr` for each address.
    pub fn store(&mut self, value: u8, addrs: &[u16]) -> &mut Self {
        self.emit(&[0xA9, value]);
        for addr in addrs {
            let [lo, hi] = addr.to_le_bytes();
            self.emit(&[0x8D, lo, hi]);
        }
        self
    }

    /// Relative branch opcode back to `target`.
    pub fn branch_to(&mut self, opcode: u8, target: u16) -> &mut Self {
        let next = self.here().wrapping_add(2);
        let offset = target.wrapping_sub(next) as i16;
        self.emit(&[opcode, offset as i8 as u8])
    }

    /// `JMP *`.
    pub fn spin(&mut self) -> &mut Self {
        let [lo, hi] = self.here().to_le_bytes();
        self.emit(&[0x4C, lo, hi])
    }

    pub fn origin(&self) -> u16 {
        self.origin
    }

    pub fn bytes(&self) -> &[u8] {
        &self.code
    }
}

/// Powers a console on with `image` and returns it with the response of
/// the first frame.
pub fn boot(image: &Image) -> Result<(Famicom, Response)> {
    let mut famicom = Famicom::new();
    famicom.execute(Request::new(Command::SetParameter(InitParam::Rom(
        image.build(),
    ))))?;
    let response = famicom
        .execute(Request::frame([0; 2]))
        .context("first frame")?;
    Ok((famicom, response))
}

pub fn run_frames(famicom: &mut Famicom, frames: usize) -> Result<Response> {
    let mut last = Response::default();
    for frame in 0..frames {
        last = famicom
            .execute(Request::frame([0; 2]))
            .with_context(|| format!("frame {frame}"))?;
    }
    Ok(last)
}

pub fn save_byte(famicom: &Famicom, offset: usize) -> Result<u8> {
    let cartridge = famicom.cartridge().context("no cartridge inserted")?;
    Ok(cartridge.save_ram().read(offset))
}
