//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and invokes a callback macro for code
//! generation, so that the opcode enum, the decoded [`Instruction`] type and
//! the assembler's parser are all derived from one list.
//!
//! This module generates:
//! - The [`Opcode`] enum with mnemonics and arity bounds
//!
//! [`Instruction`]: super::program::Instruction
//!
//! # Operand kinds
//!
//! - `Src`: integer, register or address, resolved to a value
//! - `Addr`: address written or freed by the instruction
//! - `OptSrc` / `OptAddr`: optional forms of the above, only present when the
//!   instruction receives its maximum operand count
//! - `Target`: `INC` operand; integer, `%rxx` or address

use crate::virtual_machine::errors::VMError;

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// IDLE ; no effect
            Idle = 0x0, "IDLE" => [],
            /// PUSH src ; push src onto the stack
            Push = 0x1, "PUSH" => [src: Src],
            /// POP [dst] ; pop into dst, or into %rxx when dst is omitted
            Pop = 0x2, "POP" => [dst: OptAddr],
            /// INC target ; target += 1, or %res = literal + 1
            Inc = 0x3, "INC" => [target: Target],
            /// ADD lhs rhs ; %res = lhs + rhs
            Add = 0x4, "ADD" => [lhs: Src, rhs: Src],
            /// SUB lhs rhs ; %res = lhs - rhs
            Sub = 0x5, "SUB" => [lhs: Src, rhs: Src],
            /// STORE [src] dst ; dst = src, or dst = %res when src is omitted
            Store = 0x6, "STORE" => [src: OptSrc, dst: Addr],
            /// LOAD src ; %rxx = src
            Load = 0x7, "LOAD" => [src: Addr],
            /// FREE addr ; deallocate addr
            Free = 0x8, "FREE" => [addr: Addr],
            /// PRINT src ; emit src to the output sink
            Print = 0x9, "PRINT" => [src: Src],
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl Opcode {
            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Looks up an opcode by its exact (upper-case) mnemonic.
            pub fn from_mnemonic(name: &str) -> Result<Self, VMError> {
                match name {
                    $( $mnemonic => Ok(Opcode::$name), )*
                    _ => Err(VMError::InvalidInstructionName {
                        name: name.to_string(),
                    }),
                }
            }

            /// Minimum number of operands.
            pub const fn min_arity(&self) -> usize {
                match self {
                    $( Opcode::$name => 0 $( + define_opcodes!(@required $kind) )*, )*
                }
            }

            /// Maximum number of operands.
            pub const fn max_arity(&self) -> usize {
                match self {
                    $( Opcode::$name => 0 $( + define_opcodes!(@unit $field) )*, )*
                }
            }

            /// Human-readable arity, e.g. `"1"` or `"0 or 1"`.
            pub const fn arity_str(&self) -> &'static str {
                match (self.min_arity(), self.max_arity()) {
                    (0, 0) => "0",
                    (1, 1) => "1",
                    (2, 2) => "2",
                    (0, 1) => "0 or 1",
                    (1, 2) => "1 or 2",
                    _ => "?",
                }
            }
        }
    };

    (@unit $x:ident) => { 1usize };

    (@required Src)    => { 1usize };
    (@required Addr)   => { 1usize };
    (@required Target) => { 1usize };
    (@required OptSrc)  => { 0usize };
    (@required OptAddr) => { 0usize };
}

for_each_instruction!(define_opcodes);
