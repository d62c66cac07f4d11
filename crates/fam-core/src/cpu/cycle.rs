/// Base cost of an opcode and which penalties apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Cycle {
    /// Fixed cost.
    Normal(u8),
    /// +1 when indexing crosses a page (read instructions).
    Cross(u8),
    /// +1 when taken, +1 more when the target is on another page.
    Branch(u8),
}

pub(crate) const fn n(cycle: u8) -> Cycle {
    Cycle::Normal(cycle)
}

pub(crate) const fn c(cycle: u8) -> Cycle {
    Cycle::Cross(cycle)
}

pub(crate) const fn b(cycle: u8) -> Cycle {
    Cycle::Branch(cycle)
}

impl Cycle {
    pub(crate) const fn base(self) -> u32 {
        match self {
            Cycle::Normal(cycle) | Cycle::Cross(cycle) | Cycle::Branch(cycle) => cycle as u32,
        }
    }

    pub(crate) const fn cost(self, crossed: bool, taken: bool) -> u32 {
        let base = self.base();
        match self {
            Cycle::Normal(_) => base,
            Cycle::Cross(_) => base + crossed as u32,
            Cycle::Branch(_) if taken => base + 1 + crossed as u32,
            Cycle::Branch(_) => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalties_only_apply_to_their_kind() {
        assert_eq!(n(4).cost(true, true), 4);
        assert_eq!(c(4).cost(true, false), 5);
        assert_eq!(c(4).cost(false, false), 4);
        assert_eq!(b(2).cost(true, false), 2);
        assert_eq!(b(2).cost(false, true), 3);
        assert_eq!(b(2).cost(true, true), 4);
    }
}
