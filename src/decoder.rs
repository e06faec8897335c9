// decoder.rs
//
// Splits encoded instruction words back into their format fields. Used by the
// code listing and to check the encoders against themselves.

use crate::fields::{self, B_IMM, I_IMM, J_IMM, RD, RS1, RS2, S_IMM, U_IMM};
use crate::format::Format;
use crate::opcodes::{FIXED_WORDS, Opcode};
use crate::register::Register;
use std::fmt;

/// Field values of a decoded word
///
/// B and J offsets are relative to the instruction's own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields {
    R { rd: Register, rs1: Register, rs2: Register },
    I { rd: Register, rs1: Register, imm: i64 },
    S { rs1: Register, rs2: Register, imm: i64 },
    B { rs1: Register, rs2: Register, offset: i64 },
    U { rd: Register, imm: i64 },
    J { rd: Register, offset: i64 },
}

fn reg(word: u32, field: fields::BitField) -> Register {
    Register::new(field.extract(word))
}

/// Read `word` as an instruction of the given format
pub fn decode_as(format: Format, word: u32) -> Fields {
    match format {
        Format::R => Fields::R { rd: reg(word, RD), rs1: reg(word, RS1), rs2: reg(word, RS2) },
        Format::I => {
            Fields::I { rd: reg(word, RD), rs1: reg(word, RS1), imm: fields::gather(word, &I_IMM) }
        }
        Format::S => Fields::S {
            rs1: reg(word, RS1),
            rs2: reg(word, RS2),
            imm: fields::gather(word, &S_IMM),
        },
        Format::B => Fields::B {
            rs1: reg(word, RS1),
            rs2: reg(word, RS2),
            offset: fields::gather(word, &B_IMM),
        },
        Format::U => Fields::U { rd: reg(word, RD), imm: fields::gather(word, &U_IMM) },
        Format::J => Fields::J { rd: reg(word, RD), offset: fields::gather(word, &J_IMM) },
    }
}

/// A decoded instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Fixed(&'static str),
    Op(&'static Opcode, Fields),
    Unknown(u32),
}

pub fn decode(word: u32) -> Decoded {
    if let Some((mnemonic, _)) = FIXED_WORDS.iter().find(|(_, w)| *w == word) {
        return Decoded::Fixed(mnemonic);
    }
    match Opcode::for_word(word) {
        Some(op) => Decoded::Op(op, decode_as(op.format, word)),
        None => Decoded::Unknown(word),
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Fixed(mnemonic) => f.write_str(mnemonic),
            Decoded::Unknown(word) => write!(f, ".word 0x{:08x}", word),
            Decoded::Op(op, fields) => {
                write!(f, "{:<7}", op.mnemonic)?;
                match *fields {
                    // shift-immediates carry the shift amount in rs2
                    Fields::R { rd, rs1, rs2 } if matches!(op.mnemonic, "slli" | "srli" | "srai") => {
                        write!(f, " {}, {}, {}", rd, rs1, rs2.index())
                    }
                    Fields::R { rd, rs1, rs2 } => write!(f, " {}, {}, {}", rd, rs1, rs2),
                    Fields::I { rd, rs1, imm } => write!(f, " {}, {}, {}", rd, rs1, imm),
                    Fields::S { rs1, rs2, imm } => write!(f, " {}, {}({})", rs2, imm, rs1),
                    Fields::B { rs1, rs2, offset } => write!(f, " {}, {}, {:+}", rs1, rs2, offset),
                    Fields::U { rd, imm } => write!(f, " {}, 0x{:x}", rd, (imm as u32) >> 12),
                    Fields::J { rd, offset } => write!(f, " {}, {:+}", rd, offset),
                }
            }
        }
    }
}
