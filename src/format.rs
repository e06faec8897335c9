// format.rs
//
// Instruction field encoders.
//
// Each 32-bit instruction is a fixed opcode template ORed with the fields
// produced by one of six format encoders. The encoders validate immediates
// and record a diagnostic for each bad field, but always return a masked
// best-effort encoding so every pass emits the same number of bytes.

use crate::error::{Arg, ErrorSink};
use crate::fields::{self, B_IMM, I_IMM, J_IMM, RD, RS1, RS2, S_IMM, U_IMM};
use crate::layout::EncodingContext;
use crate::register::Register;
use crate::value::{Value, resolve};
use std::fmt;
use std::ops::Range;

/// Signed 12-bit immediate (I-type, S-type)
pub const I_RANGE: Range<i64> = -2048..2048;
/// PC-relative branch offset
pub const B_RANGE: Range<i64> = -4096..4096;
/// PC-relative jump offset
pub const J_RANGE: Range<i64> = -1_048_576..1_048_576;
/// Upper immediate, accepted in either its signed or unsigned 32-bit view
pub const U_RANGE: Range<i64> = -(1 << 31)..(1 << 32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Format {
    /// Mask of the template bits that identify an instruction of this format
    pub fn template_mask(self) -> u32 {
        match self {
            Format::R => 0xfe00_707f,
            Format::I | Format::S | Format::B => 0x0000_707f,
            Format::U | Format::J => 0x0000_007f,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::R => "R",
            Format::I => "I",
            Format::S => "S",
            Format::B => "B",
            Format::U => "U",
            Format::J => "J",
        };
        f.write_str(name)
    }
}

/// Operands of an instruction leaf, one variant per format
///
/// Branch and jump targets are absolute; the encoder makes them relative to
/// the address of the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    R { rd: Register, rs1: Register, rs2: Register },
    I { rd: Register, rs1: Register, imm: Value },
    S { rs1: Register, rs2: Register, imm: Value },
    B { rs1: Register, rs2: Register, target: Value },
    U { rd: Register, imm: Value },
    J { rd: Register, target: Value },
}

impl Operands {
    /// Resolve the immediates at the current write address and encode the fields
    pub fn encode(&self, cx: &mut EncodingContext<'_>) -> u32 {
        let here = cx.here();
        match self {
            Operands::R { rd, rs1, rs2 } => encode_r(*rd, *rs1, *rs2),
            Operands::I { rd, rs1, imm } => {
                let imm = resolve(here, imm, cx.layout);
                encode_i(*rd, *rs1, imm, &mut cx.errors)
            }
            Operands::S { rs1, rs2, imm } => {
                let imm = resolve(here, imm, cx.layout);
                encode_s(*rs1, *rs2, imm, &mut cx.errors)
            }
            Operands::B { rs1, rs2, target } => {
                let offset = resolve(here, target, cx.layout).wrapping_sub(here);
                encode_b(*rs1, *rs2, offset, &mut cx.errors)
            }
            Operands::U { rd, imm } => {
                let imm = resolve(here, imm, cx.layout);
                encode_u(*rd, imm, &mut cx.errors)
            }
            Operands::J { rd, target } => {
                let offset = resolve(here, target, cx.layout).wrapping_sub(here);
                encode_j(*rd, offset, &mut cx.errors)
            }
        }
    }
}

/// A fixed-template instruction leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub template: u32,
    pub operands: Operands,
}

impl Instruction {
    pub(crate) fn encode(&self, cx: &mut EncodingContext<'_>) -> bool {
        let word = self.template | self.operands.encode(cx);
        cx.block.extend_from_slice(&word.to_le_bytes());
        true
    }
}

// ============================================================================
// Format Encoders
// ============================================================================

fn registers(rd: Option<Register>, rs1: Option<Register>, rs2: Option<Register>) -> u32 {
    rd.map_or(0, |r| RD.insert(r.index()))
        | rs1.map_or(0, |r| RS1.insert(r.index()))
        | rs2.map_or(0, |r| RS2.insert(r.index()))
}

pub fn encode_r(rd: Register, rs1: Register, rs2: Register) -> u32 {
    registers(Some(rd), Some(rs1), Some(rs2))
}

pub fn encode_i(rd: Register, rs1: Register, imm: i64, errors: &mut ErrorSink) -> u32 {
    errors.check(I_RANGE.contains(&imm), "imm field (i_type) {}", &[Arg::Int(imm)]);
    registers(Some(rd), Some(rs1), None) | fields::scatter(imm, &I_IMM)
}

pub fn encode_s(rs1: Register, rs2: Register, imm: i64, errors: &mut ErrorSink) -> u32 {
    errors.check(I_RANGE.contains(&imm), "imm field (s_type) {}", &[Arg::Int(imm)]);
    registers(None, Some(rs1), Some(rs2)) | fields::scatter(imm, &S_IMM)
}

/// `offset` is relative to the branch instruction
pub fn encode_b(rs1: Register, rs2: Register, offset: i64, errors: &mut ErrorSink) -> u32 {
    if !B_RANGE.contains(&offset) {
        errors.check(false, "imm field (b_type) {}", &[Arg::Int(offset)]);
    } else {
        errors.check(offset & 1 == 0, "imm field (b_type) {} not even", &[Arg::Int(offset)]);
    }
    registers(None, Some(rs1), Some(rs2)) | fields::scatter(offset, &B_IMM)
}

/// `imm` is the full 32-bit value; its low 12 bits must be zero
pub fn encode_u(rd: Register, imm: i64, errors: &mut ErrorSink) -> u32 {
    if !U_RANGE.contains(&imm) {
        errors.check(false, "imm field (u_type) {}", &[Arg::Hex(imm)]);
    } else {
        errors.check(
            imm & 0xfff == 0,
            "imm field (u_type) {} low bits not zero",
            &[Arg::Hex(imm)],
        );
    }
    registers(Some(rd), None, None) | fields::scatter(imm, &U_IMM)
}

/// `offset` is relative to the jump instruction
pub fn encode_j(rd: Register, offset: i64, errors: &mut ErrorSink) -> u32 {
    if !J_RANGE.contains(&offset) {
        errors.check(false, "imm field (j_type) {}", &[Arg::Int(offset)]);
    } else {
        errors.check(offset & 1 == 0, "imm field (j_type) {} not even", &[Arg::Int(offset)]);
    }
    registers(Some(rd), None, None) | fields::scatter(offset, &J_IMM)
}
