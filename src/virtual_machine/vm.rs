//! Core execution engine.
//!
//! The VM executes a decoded [`Program`] strictly in order against two
//! registers, a sparse named memory and a value stack. Every operand of an
//! instruction is resolved before any state is touched, so a failing
//! instruction leaves no partial effect. The first failure halts the run for
//! good. All arithmetic uses wrapping semantics to prevent overflow panics.
//!
//! # Run states
//!
//! ```text
//! Ready -> Running -> Halted(Normal)
//!                  -> Halted(Error(halt))
//! ```
//!
//! `Halted` is terminal: further [`VM::step`] / [`VM::run`] calls execute
//! nothing and report the same outcome.

mod memory;
mod registers;
mod stack;

pub use memory::Memory;
pub use registers::Registers;
pub use stack::Stack;

use crate::debug;
use crate::virtual_machine::errors::{Fault, Halt};
use crate::virtual_machine::operand::{Address, IncTarget, Operand};
use crate::virtual_machine::output::OutputSink;
use crate::virtual_machine::program::{Instruction, Program};
use std::fmt::Write;

/// How a finished run ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Every instruction executed.
    Normal,
    /// An instruction failed; nothing after it executed.
    Error(Halt),
}

impl Outcome {
    pub fn is_normal(&self) -> bool {
        matches!(self, Outcome::Normal)
    }

    /// Returns the halt diagnostic, if the run failed.
    pub fn halt(&self) -> Option<&Halt> {
        match self {
            Outcome::Normal => None,
            Outcome::Error(halt) => Some(halt),
        }
    }

    pub fn into_result(self) -> Result<(), Halt> {
        match self {
            Outcome::Normal => Ok(()),
            Outcome::Error(halt) => Err(halt),
        }
    }
}

/// Run driver state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Constructed, nothing executed yet.
    Ready,
    /// At least one instruction executed and more remain.
    Running,
    /// Terminal.
    Halted(Outcome),
}

/// Registers, memory and stack, plus the per-instruction semantics.
#[derive(Debug, Default)]
struct Machine {
    registers: Registers,
    memory: Memory,
    stack: Stack,
}

impl Machine {
    /// Produces the value an operand denotes. Never mutates.
    ///
    /// Returns [`Fault::UnallocatedMemory`] for an unallocated address.
    fn resolve(&self, operand: &Operand) -> Result<i64, Fault> {
        match operand {
            Operand::Literal(v) => Ok(*v),
            Operand::Register(reg) => Ok(self.registers.get(*reg)),
            Operand::Address(addr) => self.memory.load(addr),
        }
    }

    /// Executes a single instruction.
    fn exec<O: OutputSink + ?Sized>(
        &mut self,
        instruction: &Instruction,
        out: &mut O,
    ) -> Result<(), Fault> {
        match instruction {
            Instruction::Idle {} => self.op_idle(),
            Instruction::Push { src } => self.op_push(src),
            Instruction::Pop { dst } => self.op_pop(dst.as_ref()),
            Instruction::Inc { target } => self.op_inc(target),
            Instruction::Add { lhs, rhs } => self.op_add(lhs, rhs),
            Instruction::Sub { lhs, rhs } => self.op_sub(lhs, rhs),
            Instruction::Store { src, dst } => self.op_store(src.as_ref(), dst),
            Instruction::Load { src } => self.op_load(src),
            Instruction::Free { addr } => self.op_free(addr),
            Instruction::Print { src } => self.op_print(src, out),
        }
    }

    fn op_idle(&mut self) -> Result<(), Fault> {
        Ok(())
    }

    fn op_push(&mut self, src: &Operand) -> Result<(), Fault> {
        let v = self.resolve(src)?;
        self.stack.push(v);
        Ok(())
    }

    fn op_pop(&mut self, dst: Option<&Address>) -> Result<(), Fault> {
        let v = self.stack.pop()?;
        match dst {
            Some(addr) => {
                self.memory.store(addr, v);
            }
            None => self.registers.set_rxx(v),
        }
        Ok(())
    }

    /// Locations are incremented in place; a literal's successor goes to `%res`.
    fn op_inc(&mut self, target: &IncTarget) -> Result<(), Fault> {
        match target {
            IncTarget::Literal(v) => self.registers.set_res(v.wrapping_add(1)),
            IncTarget::Rxx => {
                let v = self.registers.rxx();
                self.registers.set_rxx(v.wrapping_add(1));
            }
            IncTarget::Address(addr) => {
                let v = self.memory.load(addr)?;
                self.memory.store(addr, v.wrapping_add(1));
            }
        }
        Ok(())
    }

    fn op_add(&mut self, lhs: &Operand, rhs: &Operand) -> Result<(), Fault> {
        let a = self.resolve(lhs)?;
        let b = self.resolve(rhs)?;
        self.registers.set_res(a.wrapping_add(b));
        Ok(())
    }

    fn op_sub(&mut self, lhs: &Operand, rhs: &Operand) -> Result<(), Fault> {
        let a = self.resolve(lhs)?;
        let b = self.resolve(rhs)?;
        self.registers.set_res(a.wrapping_sub(b));
        Ok(())
    }

    fn op_store(&mut self, src: Option<&Operand>, dst: &Address) -> Result<(), Fault> {
        let v = match src {
            Some(src) => self.resolve(src)?,
            None => self.registers.res(),
        };
        self.memory.store(dst, v);
        Ok(())
    }

    fn op_load(&mut self, src: &Address) -> Result<(), Fault> {
        let v = self.memory.load(src)?;
        self.registers.set_rxx(v);
        Ok(())
    }

    fn op_free(&mut self, addr: &Address) -> Result<(), Fault> {
        self.memory.free(addr)?;
        Ok(())
    }

    fn op_print<O: OutputSink + ?Sized>(
        &mut self,
        src: &Operand,
        out: &mut O,
    ) -> Result<(), Fault> {
        let v = self.resolve(src)?;
        out.emit(v);
        Ok(())
    }
}

/// Simulated processor executing one program.
///
/// Owns all machine state for the lifetime of the run; nothing is shared.
pub struct VM {
    /// Instructions to execute.
    program: Program,
    /// Index of the next instruction.
    ip: usize,
    /// Registers, memory and stack.
    machine: Machine,
    /// Run driver state.
    status: Status,
}

impl VM {
    /// Creates a new VM in the [`Status::Ready`] state.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            ip: 0,
            machine: Machine::default(),
            status: Status::Ready,
        }
    }

    /// Runs until the program is exhausted or an instruction halts.
    pub fn run<O: OutputSink + ?Sized>(&mut self, out: &mut O) -> Outcome {
        loop {
            if let Status::Halted(outcome) = self.step(out) {
                return outcome.clone();
            }
        }
    }

    /// Executes at most one instruction and returns the resulting state.
    ///
    /// An empty program goes straight from `Ready` to `Halted(Normal)`.
    pub fn step<O: OutputSink + ?Sized>(&mut self, out: &mut O) -> &Status {
        if let Status::Halted(_) = self.status {
            return &self.status;
        }

        let Some(instruction) = self.program.get(self.ip) else {
            self.status = Status::Halted(Outcome::Normal);
            return &self.status;
        };

        debug!("{:>4}: {}", self.ip, instruction);
        self.status = match self.machine.exec(instruction, out) {
            Ok(()) => {
                self.ip += 1;
                if self.ip < self.program.len() {
                    Status::Running
                } else {
                    Status::Halted(Outcome::Normal)
                }
            }
            Err(fault) => {
                debug!("{:>4}: halted: {}", self.ip, fault);
                Status::Halted(Outcome::Error(Halt {
                    index: self.ip,
                    instruction: instruction.clone(),
                    fault,
                }))
            }
        };
        &self.status
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted(_))
    }

    /// Index of the next instruction to execute.
    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registers(&self) -> &Registers {
        &self.machine.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.machine.memory
    }

    pub fn stack(&self) -> &Stack {
        &self.machine.stack
    }

    /// Resolves an operand against the current state.
    pub fn resolve(&self, operand: &Operand) -> Result<i64, Fault> {
        self.machine.resolve(operand)
    }

    /// Multi-line summary of registers, memory and stack.
    pub fn dump(&self) -> String {
        let regs = self.registers();
        let mut out = String::new();
        let _ = writeln!(out, "%res = {}, %rxx = {}", regs.res(), regs.rxx());

        let _ = write!(out, "memory ({} allocated):", self.memory().len());
        for (addr, value) in self.memory().iter() {
            let _ = write!(out, " {addr} = {value}");
        }
        out.push('\n');

        let _ = write!(out, "stack ({} values, bottom to top):", self.stack().len());
        for value in self.stack().as_slice() {
            let _ = write!(out, " {value}");
        }
        out.push('\n');
        out
    }
}
