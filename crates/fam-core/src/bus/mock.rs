use crate::bus::Bus;

/// Flat 64 KiB RAM with manually driven interrupt lines.
#[derive(Debug)]
pub(crate) struct MockBus {
    pub(crate) mem: Vec<u8>,
    pub(crate) nmi: bool,
    pub(crate) irq: bool,
}

impl Default for MockBus {
    fn default() -> Self {
        Self {
            mem: vec![0; 0x1_0000],
            nmi: false,
            irq: false,
        }
    }
}

impl MockBus {
    /// Places `program` at `origin` and points the reset vector at it.
    pub(crate) fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut bus = Self::default();
        bus.load(origin, program);
        bus.set_vector(crate::memory::cpu::RESET_VECTOR, origin);
        bus
    }

    pub(crate) fn load(&mut self, origin: u16, bytes: &[u8]) {
        let start = origin as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub(crate) fn set_vector(&mut self, vector: u16, target: u16) {
        let [lo, hi] = target.to_le_bytes();
        self.mem[vector as usize] = lo;
        self.mem[vector as usize + 1] = hi;
    }
}

impl Bus for MockBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }

    fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi)
    }

    fn irq_pending(&mut self) -> bool {
        self.irq
    }
}
