//! Test utilities for engine and loader testing.

#[cfg(test)]
pub mod utils {
    use crate::virtual_machine::assembler::assemble_source;
    use crate::virtual_machine::operand::Address;
    use crate::virtual_machine::vm::{Outcome, VM};

    /// Builds an address from a bare name.
    pub fn addr(name: &str) -> Address {
        Address::new(name).unwrap()
    }

    /// Assembles `source`, runs it to completion and returns the finished VM,
    /// the outcome and everything `PRINT` emitted.
    pub fn run_source(source: &str) -> (VM, Outcome, Vec<i64>) {
        let program = assemble_source(source).unwrap();
        let mut vm = VM::new(program);
        let mut out = Vec::new();
        let outcome = vm.run(&mut out);
        (vm, outcome, out)
    }
}
