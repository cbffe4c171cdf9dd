//! Decoded instruction operands.
//!
//! Operands only name state (a register or a memory address) or carry a
//! literal; they never own any. Text syntax:
//!
//! - integers: signed decimal `i64` (`42`, `-7`)
//! - registers: `%res`, `%rxx`
//! - addresses: `{name}` where `name` is 1+ ASCII letters, digits or `_`

use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::str::FromStr;

pub const REGISTER_PREFIX: char = '%';
pub const ADDRESS_OPEN: char = '{';
pub const ADDRESS_CLOSE: char = '}';

/// One of the two fixed registers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    /// `%res`: arithmetic result, read-only to programs.
    Res,
    /// `%rxx`: general purpose.
    Rxx,
}

impl Register {
    pub const fn name(&self) -> &'static str {
        match self {
            Register::Res => "%res",
            Register::Rxx => "%rxx",
        }
    }

    /// Whether programs may name this register as a write-back target.
    pub const fn is_writable(&self) -> bool {
        matches!(self, Register::Rxx)
    }
}

impl FromStr for Register {
    type Err = VMError;

    fn from_str(tok: &str) -> Result<Self, Self::Err> {
        match tok {
            "%res" => Ok(Register::Res),
            "%rxx" => Ok(Register::Rxx),
            _ => Err(VMError::InvalidRegister {
                token: tok.to_string(),
            }),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a memory cell, without its surrounding braces.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Address(String);

impl Address {
    /// Validates a bare address name.
    pub fn new(name: impl Into<String>) -> Result<Self, VMError> {
        let name = name.into();
        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(VMError::InvalidAddress {
                token: format!("{ADDRESS_OPEN}{name}{ADDRESS_CLOSE}"),
            });
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Parses the braced form `{name}`.
impl FromStr for Address {
    type Err = VMError;

    fn from_str(tok: &str) -> Result<Self, Self::Err> {
        let name = tok
            .strip_prefix(ADDRESS_OPEN)
            .and_then(|t| t.strip_suffix(ADDRESS_CLOSE))
            .ok_or_else(|| VMError::InvalidAddress {
                token: tok.to_string(),
            })?;
        Address::new(name).map_err(|_| VMError::InvalidAddress {
            token: tok.to_string(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ADDRESS_OPEN}{}{ADDRESS_CLOSE}", self.0)
    }
}

/// A value source: literal, register or memory cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Literal(i64),
    Register(Register),
    Address(Address),
}

impl Operand {
    /// Returns a human-readable kind name for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Operand::Literal(_) => "Integer",
            Operand::Register(_) => "Register",
            Operand::Address(_) => "Address",
        }
    }
}

/// Classifies a token by its leading character and parses it.
impl FromStr for Operand {
    type Err = VMError;

    fn from_str(tok: &str) -> Result<Self, Self::Err> {
        if tok.starts_with(REGISTER_PREFIX) {
            tok.parse().map(Operand::Register)
        } else if tok.starts_with(ADDRESS_OPEN) {
            tok.parse().map(Operand::Address)
        } else {
            tok.parse::<i64>()
                .map(Operand::Literal)
                .map_err(|_| VMError::InvalidInteger {
                    token: tok.to_string(),
                })
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{v}"),
            Operand::Register(r) => write!(f, "{r}"),
            Operand::Address(a) => write!(f, "{a}"),
        }
    }
}

/// Operand of `INC`.
///
/// Locations are incremented in place; a literal has no location, so its
/// successor goes to `%res`. `%res` itself is not representable here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IncTarget {
    Literal(i64),
    Rxx,
    Address(Address),
}

impl TryFrom<Operand> for IncTarget {
    type Error = VMError;

    fn try_from(operand: Operand) -> Result<Self, Self::Error> {
        match operand {
            Operand::Literal(v) => Ok(IncTarget::Literal(v)),
            Operand::Register(Register::Rxx) => Ok(IncTarget::Rxx),
            Operand::Register(reg) => Err(VMError::ReadonlyRegister {
                token: reg.name().to_string(),
            }),
            Operand::Address(a) => Ok(IncTarget::Address(a)),
        }
    }
}

impl fmt::Display for IncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncTarget::Literal(v) => write!(f, "{v}"),
            IncTarget::Rxx => write!(f, "{}", Register::Rxx),
            IncTarget::Address(a) => write!(f, "{a}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_from_str() {
        assert_eq!("%res".parse::<Register>().unwrap(), Register::Res);
        assert_eq!("%rxx".parse::<Register>().unwrap(), Register::Rxx);
        assert!(matches!(
            "%rax".parse::<Register>(),
            Err(VMError::InvalidRegister { .. })
        ));
        assert!("rxx".parse::<Register>().is_err());
    }

    #[test]
    fn only_rxx_is_writable() {
        assert!(Register::Rxx.is_writable());
        assert!(!Register::Res.is_writable());
    }

    #[test]
    fn address_valid_names() {
        assert_eq!("{a}".parse::<Address>().unwrap().name(), "a");
        assert_eq!("{_tmp_1}".parse::<Address>().unwrap().name(), "_tmp_1");
        assert_eq!("{42}".parse::<Address>().unwrap().name(), "42");
    }

    #[test]
    fn address_invalid_names() {
        for tok in ["{}", "{a-b}", "{a b}", "a", "{a", "a}", "{é}", "{{a}}"] {
            assert!(
                matches!(tok.parse::<Address>(), Err(VMError::InvalidAddress { .. })),
                "{tok} should be rejected"
            );
        }
        assert!(Address::new("").is_err());
    }

    #[test]
    fn address_display_restores_braces() {
        assert_eq!(Address::new("counter").unwrap().to_string(), "{counter}");
    }

    #[test]
    fn operand_classification() {
        assert_eq!("-12".parse::<Operand>().unwrap(), Operand::Literal(-12));
        assert_eq!("+3".parse::<Operand>().unwrap(), Operand::Literal(3));
        assert_eq!(
            "%rxx".parse::<Operand>().unwrap(),
            Operand::Register(Register::Rxx)
        );
        assert_eq!(
            "{b}".parse::<Operand>().unwrap(),
            Operand::Address(Address::new("b").unwrap())
        );
        assert!(matches!(
            "abc".parse::<Operand>(),
            Err(VMError::InvalidInteger { .. })
        ));
        assert!(matches!(
            "99999999999999999999".parse::<Operand>(),
            Err(VMError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn inc_target_rejects_res() {
        assert!(matches!(
            IncTarget::try_from(Operand::Register(Register::Res)),
            Err(VMError::ReadonlyRegister { .. })
        ));
        assert_eq!(
            IncTarget::try_from(Operand::Register(Register::Rxx)).unwrap(),
            IncTarget::Rxx
        );
        assert_eq!(
            IncTarget::try_from(Operand::Literal(5)).unwrap(),
            IncTarget::Literal(5)
        );
    }

    #[test]
    fn operand_kind_names() {
        assert_eq!(Operand::Literal(0).kind(), "Integer");
        assert_eq!(Operand::Register(Register::Res).kind(), "Register");
        assert_eq!(Operand::Address(Address::new("a").unwrap()).kind(), "Address");
    }
}
