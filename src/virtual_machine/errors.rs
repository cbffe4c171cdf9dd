use crate::virtual_machine::operand::Address;
use crate::virtual_machine::program::Instruction;
use vmsim_derive::Error;

/// Errors raised while turning program text into a [`Program`](super::program::Program).
///
/// These are load-time errors: a program that produces one never starts running.
#[derive(Debug, Error)]
pub enum VMError {
    /// Unrecognized instruction mnemonic.
    #[error("unknown instruction: {name}")]
    InvalidInstructionName { name: String },
    /// Wrong number of operands for an instruction.
    #[error("operand count mismatch for {instruction}: expected {expected}, got {actual}")]
    ArityMismatch {
        instruction: &'static str,
        expected: &'static str,
        actual: usize,
    },
    /// `%` prefixed token that names no register.
    #[error("invalid register {token}")]
    InvalidRegister { token: String },
    /// `%res` used where the instruction writes back to its operand.
    #[error("register {token} is read-only")]
    ReadonlyRegister { token: String },
    /// Brace-delimited token with an empty or malformed name.
    #[error("invalid memory address {token}: names use ASCII letters, digits and '_'")]
    InvalidAddress { token: String },
    /// Token that is neither a register, an address nor an `i64`.
    #[error("invalid integer literal {token}")]
    InvalidInteger { token: String },
    /// Operand of the wrong kind for its position.
    #[error("{instruction} expected operand {arg_index} to be {expected}, got {actual}")]
    UnexpectedOperand {
        instruction: &'static str,
        arg_index: usize,
        expected: &'static str,
        actual: String,
    },
    /// Wraps another error with its source location.
    #[error("line {line}: {source}")]
    AssemblyError {
        line: usize,
        offset: usize,
        source: String,
    },
    /// Program file could not be read.
    #[error("io error on {path}: {source}")]
    IoError { path: String, source: String },
}

/// Runtime condition that halts a run.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Fault {
    /// Address read, loaded or freed while not allocated.
    #[error("unallocated memory {address}")]
    UnallocatedMemory { address: Address },
    /// `POP` on an empty stack.
    #[error("pop from empty stack")]
    EmptyStack,
}

/// Terminal error of a run: which instruction failed and why.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("instruction {index} ({instruction}) halted: {fault}")]
pub struct Halt {
    /// Zero-based position of the failing instruction.
    pub index: usize,
    /// The failing instruction itself.
    pub instruction: Instruction,
    /// Why the instruction could not complete.
    #[source]
    pub fault: Fault,
}
