//! Opcode table, per-opcode addressing-mode validation, and operand/title
//! word encoding (spec 4.3) — the dispatch tables of the original map
//! naturally onto a tagged enum plus a `match`, one arm per opcode, with a
//! small bit-set of allowed addressing modes per operand position.

use regex::Regex;

use crate::context::AssemblyContext;
use crate::error::Error;
use crate::lex::{self, IntKind};
use crate::names;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Mov,
    Cmp,
    Add,
    Sub,
    Lea,
    Clr,
    Not,
    Inc,
    Dec,
    Jmp,
    Bne,
    Jsr,
    Red,
    Prn,
    Rts,
    Stop,
}

impl Opcode {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        use Opcode::*;
        Some(match mnemonic {
            "mov" => Mov,
            "cmp" => Cmp,
            "add" => Add,
            "sub" => Sub,
            "lea" => Lea,
            "clr" => Clr,
            "not" => Not,
            "inc" => Inc,
            "dec" => Dec,
            "jmp" => Jmp,
            "bne" => Bne,
            "jsr" => Jsr,
            "red" => Red,
            "prn" => Prn,
            "rts" => Rts,
            "stop" => Stop,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        names::OPCODES[self.index() as usize]
    }

    /// Opcode index per spec 4.3: `MOV=0 .. STOP=15`, placed in bits 6-9 of
    /// the title word
    pub fn index(self) -> u16 {
        use Opcode::*;
        match self {
            Mov => 0,
            Cmp => 1,
            Add => 2,
            Sub => 3,
            Lea => 4,
            Clr => 5,
            Not => 6,
            Inc => 7,
            Dec => 8,
            Jmp => 9,
            Bne => 10,
            Jsr => 11,
            Red => 12,
            Prn => 13,
            Rts => 14,
            Stop => 15,
        }
    }

    pub fn arity(self) -> usize {
        use Opcode::*;
        match self {
            Mov | Cmp | Add | Sub | Lea => 2,
            Clr | Not | Inc | Dec | Jmp | Bne | Jsr | Red | Prn => 1,
            Rts | Stop => 0,
        }
    }

    pub fn allowed_source_modes(self) -> ModeSet {
        use AddrMode::*;
        use Opcode::*;
        match self {
            Mov | Cmp | Add | Sub => ModeSet::of(&[Immediate, Direct, MatrixAccess, DirectRegister]),
            Lea => ModeSet::of(&[Direct, MatrixAccess]),
            _ => ModeSet::of(&[]),
        }
    }

    pub fn allowed_dest_modes(self) -> ModeSet {
        use AddrMode::*;
        use Opcode::*;
        match self {
            Cmp | Prn => ModeSet::of(&[Immediate, Direct, MatrixAccess, DirectRegister]),
            Mov | Add | Sub | Lea | Clr | Not | Inc | Dec | Jmp | Bne | Jsr | Red => {
                ModeSet::of(&[Direct, MatrixAccess, DirectRegister])
            }
            Rts | Stop => ModeSet::of(&[]),
        }
    }
}

/// One of the four operand addressing modes (spec 3, 4.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Immediate = 0,
    Direct = 1,
    MatrixAccess = 2,
    DirectRegister = 3,
}

/// A small bit-set of allowed addressing modes, replacing the original's
/// per-call-site variadic argument lists (spec 9 redesign note)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSet(u8);

impl ModeSet {
    pub fn of(modes: &[AddrMode]) -> Self {
        let mut bits = 0u8;
        for &mode in modes {
            bits |= 1 << (mode as u8);
        }
        ModeSet(bits)
    }

    pub fn contains(self, mode: AddrMode) -> bool {
        self.0 & (1 << (mode as u8)) != 0
    }
}

fn matrix_access_regex() -> Regex {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*)\[r([0-7])\]\[r([0-7])\]$").unwrap()
}

/// Classify one operand token and, for registers, parse the register index
fn classify_operand(token: &str, line: usize) -> Result<AddrMode, Error> {
    if token.starts_with('#') {
        return Ok(AddrMode::Immediate);
    }
    if names::is_register(token) {
        return Ok(AddrMode::DirectRegister);
    }
    if matrix_access_regex().is_match(token) {
        return Ok(AddrMode::MatrixAccess);
    }
    if token.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) && token.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Ok(AddrMode::Direct);
    }
    Err(Error::Syntax { line, message: format!("\"{token}\" is not a valid operand") })
}

fn parse_register_operand(token: &str, line: usize) -> Result<u16, Error> {
    if names::is_register(token) {
        Ok(token.as_bytes()[1] as u16 - b'0' as u16)
    } else {
        Err(Error::InvalidRegister { line, text: token.to_string() })
    }
}

fn parse_matrix_access(token: &str, line: usize) -> Result<(String, u16, u16), Error> {
    let captures = matrix_access_regex()
        .captures(token)
        .ok_or_else(|| Error::InvalidMatrixAccess { line, text: token.to_string() })?;
    let base = captures[1].to_string();
    let row: u16 = captures[2].parse().unwrap();
    let col: u16 = captures[3].parse().unwrap();
    Ok((base, row, col))
}

/// Encode one operand's extension word(s); `is_source` picks the bit
/// position for `DirectRegister`, `was_reg` is the latch carried over from
/// encoding the source operand (spec 4.3)
fn encode_operand(
    ctx: &mut AssemblyContext,
    mode: AddrMode,
    token: &str,
    line: usize,
    is_source: bool,
    was_reg: bool,
) -> Result<bool, Error> {
    match mode {
        AddrMode::Immediate => {
            let value = lex::parse_int(&token[1..], IntKind::Ins, line)?;
            let word = ((value as i16 as u16) & 0xFF) << 2;
            ctx.push_instruction(word, line);
            Ok(false)
        }
        AddrMode::Direct => {
            let index = ctx.instructions.len();
            ctx.push_instruction(0, line);
            ctx.fixups.push(crate::fixup::PendingFixup { label: token.to_string(), index, line });
            Ok(false)
        }
        AddrMode::MatrixAccess => {
            let (base, row, col) = parse_matrix_access(token, line)?;
            let index = ctx.instructions.len();
            ctx.push_instruction(0, line);
            ctx.fixups.push(crate::fixup::PendingFixup { label: base, index, line });
            ctx.push_instruction((row << 6) | (col << 2), line);
            Ok(false)
        }
        AddrMode::DirectRegister => {
            let register = parse_register_operand(token, line)?;
            if is_source {
                ctx.push_instruction(register << 6, line);
                Ok(true)
            } else {
                if was_reg {
                    let last = ctx.instructions.len() - 1;
                    ctx.instructions[last] |= register << 2;
                } else {
                    ctx.push_instruction(register << 2, line);
                }
                Ok(false)
            }
        }
    }
}

fn check_mode(opcode: Opcode, mode: AddrMode, allowed: ModeSet, line: usize, position: &'static str) -> Result<(), Error> {
    if allowed.contains(mode) {
        Ok(())
    } else {
        Err(Error::InvalidAddressingMode { line, mnemonic: opcode.mnemonic().to_string(), position })
    }
}

/// Encode one instruction line (mnemonic already split off by the caller)
pub fn encode(mnemonic: &str, args: &str, line: usize, ctx: &mut AssemblyContext) -> Result<(), Error> {
    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| Error::UnknownMnemonic { line, name: mnemonic.to_string() })?;
    let operands = lex::split_operands(args, line)?;
    if operands.len() != opcode.arity() {
        return Err(Error::WrongArity { line, mnemonic: mnemonic.to_string(), expected: opcode.arity(), found: operands.len() });
    }

    let title_index = ctx.instructions.len();
    ctx.push_instruction(0, line);

    let mut source_mode = None;
    let mut dest_mode = None;

    if opcode.arity() == 2 {
        let mode = classify_operand(&operands[0], line)?;
        check_mode(opcode, mode, opcode.allowed_source_modes(), line, "source")?;
        let was_reg = encode_operand(ctx, mode, &operands[0], line, true, false)?;
        source_mode = Some(mode);

        let mode = classify_operand(&operands[1], line)?;
        check_mode(opcode, mode, opcode.allowed_dest_modes(), line, "destination")?;
        encode_operand(ctx, mode, &operands[1], line, false, was_reg)?;
        dest_mode = Some(mode);
    } else if opcode.arity() == 1 {
        let mode = classify_operand(&operands[0], line)?;
        check_mode(opcode, mode, opcode.allowed_dest_modes(), line, "destination")?;
        encode_operand(ctx, mode, &operands[0], line, false, false)?;
        dest_mode = Some(mode);
    }

    let title = (opcode.index() << 6)
        | (source_mode.map_or(0, |m| m as u16) << 4)
        | (dest_mode.map_or(0, |m| m as u16) << 2);
    ctx.instructions[title_index] = title;
    Ok(())
}
