//! Program text parser.
//!
//! Converts human-readable program source into a decoded [`Program`].
//! Uses [`for_each_instruction!`](crate::for_each_instruction) to generate
//! `parse_instruction`, so arity and operand-kind rules come straight from
//! the instruction table.
//!
//! # Syntax
//!
//! ```text
//! INSTRUCTION operand1 operand2  # optional comment
//! ```
//!
//! - Instructions are uppercase (e.g., `PUSH`, `STORE`)
//! - Registers are `%res` and `%rxx`
//! - Memory addresses are braced names (e.g., `{a}`, `{tmp_2}`)
//! - Immediates are decimal integers (e.g., `42`, `-1`)
//! - Comments start with `#`; blank lines are ignored
//! - Commas between operands are optional

use crate::error;
use crate::for_each_instruction;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::operand::{Address, IncTarget, Operand};
use crate::virtual_machine::program::{Instruction, Program};
use std::fmt::Write;
use std::fs;
use std::iter::Enumerate;
use std::path::Path;
use std::slice::Iter;

const COMMENT_CHAR: char = '#';

/// Return the line/column/message triple for assembly-related errors.
fn assembly_error_location(err: &VMError) -> Option<(usize, usize, &str)> {
    match err {
        VMError::AssemblyError {
            line,
            offset,
            source,
        } => Some((*line, *offset, source.as_str())),
        _ => None,
    }
}

/// Formats a compiler-style diagnostic for assembly failures.
///
/// ```text
/// error: unknown instruction: JUMP
///  --> prog.txt:3:1
///   |
///    3 | JUMP {a}
///   | ^
/// ```
pub fn render_assembly_diagnostic(
    file: &str,
    source: &str,
    line: usize,
    offset: usize,
    message: &str,
) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}:{offset}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let line_text = raw_line.trim_end_matches('\r');
        let underline = " ".repeat(offset.saturating_sub(1));
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{:>4} | {}", line, line_text);
        let _ = writeln!(diag, "  | {}^", underline);
    }

    diag
}

/// Log a helpful diagnostic for assembly errors.
fn log_assembly_error(file: &str, source: &str, err: &VMError) {
    if let Some((line, offset, message)) = assembly_error_location(err) {
        error!(
            "{}",
            render_assembly_diagnostic(file, source, line, offset, message).trim_end()
        );
    } else {
        error!("{err}");
    }
}

#[derive(Debug, Clone)]
struct Token<'a> {
    text: &'a str,
    /// 1-based column offset in the line.
    offset: usize,
}

impl Token<'_> {
    /// Attaches this token's location to an error.
    fn locate(&self, line: usize, err: VMError) -> VMError {
        VMError::AssemblyError {
            line,
            offset: self.offset,
            source: err.to_string(),
        }
    }
}

/// Tokenize a single line.
///
/// Rules:
/// - `#` starts a comment
/// - commas, spaces and tabs separate tokens
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut out = Vec::with_capacity(4);
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        if c == COMMENT_CHAR {
            break;
        }
        if c == ',' || c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    text: &line[s..i],
                    offset: line[..s].chars().count() + 1,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        let end = line.find(COMMENT_CHAR).unwrap_or(line.len());
        out.push(Token {
            text: &line[s..end],
            offset: line[..s].chars().count() + 1,
        });
    }

    out
}

type Operands<'t, 'a> = Enumerate<Iter<'t, Token<'a>>>;

/// Takes the next operand token. Arity is checked before any operand is
/// taken, so running out here means the instruction table is inconsistent.
fn next_operand<'t, 'a>(
    ops: &mut Operands<'t, 'a>,
    head: &Token<'_>,
    line: usize,
) -> Result<(usize, &'t Token<'a>), VMError> {
    ops.next().ok_or_else(|| {
        head.locate(
            line,
            VMError::ArityMismatch {
                instruction: "<operand>",
                expected: "more",
                actual: 0,
            },
        )
    })
}

/// Parse a value operand: integer, register or address.
fn parse_src(tok: &Token<'_>, line: usize) -> Result<Operand, VMError> {
    tok.text.parse::<Operand>().map_err(|e| tok.locate(line, e))
}

/// Parse an operand that must be a memory address.
fn parse_addr(
    tok: &Token<'_>,
    line: usize,
    instruction: &'static str,
    arg_index: usize,
) -> Result<Address, VMError> {
    match parse_src(tok, line)? {
        Operand::Address(addr) => Ok(addr),
        other => Err(tok.locate(
            line,
            VMError::UnexpectedOperand {
                instruction,
                arg_index,
                expected: "Address",
                actual: other.kind().to_string(),
            },
        )),
    }
}

/// Parse the `INC` operand; `%res` is rejected as read-only.
fn parse_target(tok: &Token<'_>, line: usize) -> Result<IncTarget, VMError> {
    IncTarget::try_from(parse_src(tok, line)?).map_err(|e| tok.locate(line, e))
}

macro_rules! define_parse_instruction {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Parse one instruction from the tokens of line `line`.
        ///
        /// Optional operands are present only when the instruction receives
        /// its maximum operand count.
        fn parse_instruction(tokens: &[Token], line: usize) -> Result<Instruction, VMError> {
            let Some((head, operands)) = tokens.split_first() else {
                return Err(VMError::ArityMismatch {
                    instruction: "<missing opcode>",
                    expected: "1",
                    actual: 0,
                });
            };

            let opcode = Opcode::from_mnemonic(head.text).map_err(|e| head.locate(line, e))?;
            if operands.len() < opcode.min_arity() || operands.len() > opcode.max_arity() {
                return Err(head.locate(
                    line,
                    VMError::ArityMismatch {
                        instruction: opcode.mnemonic(),
                        expected: opcode.arity_str(),
                        actual: operands.len(),
                    },
                ));
            }

            let full = operands.len() == opcode.max_arity();
            let mut ops = operands.iter().enumerate();
            let instr = match opcode {
                $(
                    Opcode::$name => Instruction::$name {
                        $(
                            $field: define_parse_instruction!(
                                @parse_operand $kind, ops, head, line, $mnemonic, full
                            )?,
                        )*
                    },
                )*
            };
            Ok(instr)
        }
    };

    (@parse_operand Src, $ops:ident, $head:ident, $line:ident, $m:expr, $full:ident) => {
        next_operand(&mut $ops, $head, $line).and_then(|(_, tok)| parse_src(tok, $line))
    };

    (@parse_operand Addr, $ops:ident, $head:ident, $line:ident, $m:expr, $full:ident) => {
        next_operand(&mut $ops, $head, $line).and_then(|(i, tok)| parse_addr(tok, $line, $m, i))
    };

    (@parse_operand Target, $ops:ident, $head:ident, $line:ident, $m:expr, $full:ident) => {
        next_operand(&mut $ops, $head, $line).and_then(|(_, tok)| parse_target(tok, $line))
    };

    (@parse_operand OptSrc, $ops:ident, $head:ident, $line:ident, $m:expr, $full:ident) => {
        if $full {
            define_parse_instruction!(@parse_operand Src, $ops, $head, $line, $m, $full).map(Some)
        } else {
            Ok(None)
        }
    };

    (@parse_operand OptAddr, $ops:ident, $head:ident, $line:ident, $m:expr, $full:ident) => {
        if $full {
            define_parse_instruction!(@parse_operand Addr, $ops, $head, $line, $m, $full).map(Some)
        } else {
            Ok(None)
        }
    };
}

for_each_instruction!(define_parse_instruction);

/// Parse a full source string into a program.
///
/// Lines are numbered from 1; the first invalid line aborts parsing with an
/// [`VMError::AssemblyError`] carrying its line and column.
pub fn assemble_source(source: impl AsRef<str>) -> Result<Program, VMError> {
    let mut instructions = Vec::new();
    for (line_no, line) in source.as_ref().lines().enumerate() {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        instructions.push(parse_instruction(&tokens, line_no + 1)?);
    }
    Ok(Program::new(instructions))
}

/// Parses source with an associated name for error diagnostics.
///
/// Logs a compiler-style diagnostic on failure.
pub fn assemble_source_with_name(source: &str, source_name: &str) -> Result<Program, VMError> {
    let result = assemble_source(source);
    if let Err(err) = &result {
        log_assembly_error(source_name, source, err);
    }
    result
}

/// Convenience: parse directly from a file path.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, VMError> {
    let path_ref = path.as_ref();
    let source = fs::read_to_string(path_ref).map_err(|e| VMError::IoError {
        path: path_ref.display().to_string(),
        source: e.to_string(),
    })?;
    assemble_source_with_name(&source, &path_ref.display().to_string())
}
