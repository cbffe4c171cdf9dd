//! Simulated processor executing a tiny ten-instruction assembly language.
//!
//! Programs are parsed by the assembler into typed instructions and executed
//! strictly in order by the [`vm::VM`]. The first failing instruction halts
//! the run with a [`errors::Halt`] naming its index and fault.
//!
//! # Architecture
//!
//! - **Registers**: `%res` (arithmetic result, read-only to programs) and
//!   `%rxx` (general purpose), both `i64` and zero at start
//! - **Memory**: sparse named cells, allocated on store and removed on free
//! - **Stack**: unbounded LIFO of `i64`
//! - **Output**: `PRINT` emits through an injected [`output::OutputSink`]
//!
//! # Modules
//!
//! - [`assembler`]: Program text parsing and diagnostics
//! - [`errors`]: Load-time errors, runtime faults and halts
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`operand`]: Registers, addresses and operand syntax
//! - [`output`]: `PRINT` destinations
//! - [`program`]: Decoded instructions and programs
//! - [`vm`]: Execution engine and run driver

pub mod assembler;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod output;
pub mod program;
pub mod vm;
