use crate::virtual_machine::operand::Register;

/// The fixed register pair.
///
/// `%res` has no public setter: only the engine's arithmetic writes it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    res: i64,
    rxx: i64,
}

impl Registers {
    /// Creates a register pair with both registers at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of `reg`.
    pub fn get(&self, reg: Register) -> i64 {
        match reg {
            Register::Res => self.res,
            Register::Rxx => self.rxx,
        }
    }

    pub fn res(&self) -> i64 {
        self.res
    }

    pub fn rxx(&self) -> i64 {
        self.rxx
    }

    pub(super) fn set_res(&mut self, value: i64) {
        self.res = value;
    }

    pub(super) fn set_rxx(&mut self, value: i64) {
        self.rxx = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_start_at_zero() {
        let regs = Registers::new();
        assert_eq!(regs.get(Register::Res), 0);
        assert_eq!(regs.get(Register::Rxx), 0);
    }

    #[test]
    fn setters_are_independent() {
        let mut regs = Registers::new();
        regs.set_rxx(7);
        assert_eq!((regs.res(), regs.rxx()), (0, 7));
        regs.set_res(-3);
        assert_eq!((regs.get(Register::Res), regs.get(Register::Rxx)), (-3, 7));
    }
}
