//! Decoded program format.
//!
//! A [`Program`] is the ordered, read-only instruction list handed to the
//! engine. Instructions carry fully typed operands, so operand-kind and arity
//! rules are settled before execution starts.

use crate::for_each_instruction;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::operand::{Address, IncTarget, Operand};
use std::fmt;

macro_rules! define_instruction {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// A decoded instruction with typed operands.
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name {
                    $( $field: define_instruction!(@ty $kind) ),*
                },
            )*
        }

        impl Instruction {
            /// Returns the opcode of this instruction.
            pub const fn opcode(&self) -> Opcode {
                match self {
                    $( Instruction::$name { .. } => Opcode::$name, )*
                }
            }
        }

        /// Renders the canonical source form, e.g. `STORE 10 {a}`.
        impl fmt::Display for Instruction {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(
                        Instruction::$name { $( $field ),* } => {
                            f.write_str($mnemonic)?;
                            $( define_instruction!(@fmt f, $kind, $field); )*
                            Ok(())
                        }
                    )*
                }
            }
        }
    };

    // ---------- types ----------
    (@ty Src)     => { Operand };
    (@ty Addr)    => { Address };
    (@ty Target)  => { IncTarget };
    (@ty OptSrc)  => { Option<Operand> };
    (@ty OptAddr) => { Option<Address> };

    // ---------- rendering ----------
    (@fmt $f:ident, OptSrc, $v:ident) => {
        if let Some(v) = $v {
            write!($f, " {v}")?;
        }
    };
    (@fmt $f:ident, OptAddr, $v:ident) => {
        if let Some(v) = $v {
            write!($f, " {v}")?;
        }
    };
    (@fmt $f:ident, $kind:ident, $v:ident) => {
        write!($f, " {}", $v)?;
    };
}

for_each_instruction!(define_instruction);

/// Ordered instruction list produced by the assembler.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Writes a numbered listing, one instruction per line.
    pub fn listing(&self) -> String {
        use std::fmt::Write;

        let width = self.len().saturating_sub(1).to_string().len();
        let mut out = String::new();
        for (i, instr) in self.instructions.iter().enumerate() {
            let _ = writeln!(
                out,
                "{i:>width$}  {:#04x}  {instr}",
                instr.opcode() as u8
            );
        }
        out
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::operand::Register;

    fn addr(name: &str) -> Address {
        Address::new(name).unwrap()
    }

    #[test]
    fn display_canonical_forms() {
        assert_eq!(Instruction::Idle {}.to_string(), "IDLE");
        assert_eq!(Instruction::Pop { dst: None }.to_string(), "POP");
        assert_eq!(
            Instruction::Pop {
                dst: Some(addr("b"))
            }
            .to_string(),
            "POP {b}"
        );
        assert_eq!(
            Instruction::Store {
                src: Some(Operand::Literal(10)),
                dst: addr("a"),
            }
            .to_string(),
            "STORE 10 {a}"
        );
        assert_eq!(
            Instruction::Store {
                src: None,
                dst: addr("a"),
            }
            .to_string(),
            "STORE {a}"
        );
        assert_eq!(
            Instruction::Sub {
                lhs: Operand::Register(Register::Res),
                rhs: Operand::Literal(-2),
            }
            .to_string(),
            "SUB %res -2"
        );
        assert_eq!(
            Instruction::Inc {
                target: IncTarget::Rxx
            }
            .to_string(),
            "INC %rxx"
        );
    }

    #[test]
    fn opcode_matches_variant() {
        assert_eq!(Instruction::Idle {}.opcode(), Opcode::Idle);
        assert_eq!(
            Instruction::Free { addr: addr("x") }.opcode(),
            Opcode::Free
        );
    }

    #[test]
    fn listing_numbers_instructions() {
        let program = Program::new(vec![
            Instruction::Push {
                src: Operand::Literal(1),
            },
            Instruction::Pop { dst: None },
        ]);
        assert_eq!(program.listing(), "0  0x01  PUSH 1\n1  0x02  POP\n");
    }

    #[test]
    fn empty_program() {
        let program = Program::default();
        assert!(program.is_empty());
        assert_eq!(program.listing(), "");
        assert!(program.get(0).is_none());
    }
}
