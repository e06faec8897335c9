// opcodes.rs
//
// Opcode table and instruction constructors.
//
// Every mnemonic maps to a template (opcode, funct3 and funct7 bits preset)
// and the format whose encoder fills in the remaining fields. The
// constructors below build instruction leaves from those templates.

use crate::format::{Format, Operands};
use crate::node::{Node, Program, words};
use crate::register::{RA, Register, T1, ZERO};
use crate::value::{Value, hi, lo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub template: u32,
    pub format: Format,
}

impl Opcode {
    /// Find an opcode by mnemonic
    pub fn lookup(mnemonic: &str) -> Option<&'static Opcode> {
        OPCODES.iter().find(|op| op.mnemonic == mnemonic)
    }

    /// Find the opcode whose template matches an encoded word
    pub fn for_word(word: u32) -> Option<&'static Opcode> {
        OPCODES.iter().find(|op| word & op.format.template_mask() == op.template)
    }
}

macro_rules! opcode_table {
    ($($konst:ident = $mnemonic:literal, $template:literal, $format:ident;)*) => {
        $(pub const $konst: u32 = $template;)*

        pub static OPCODES: &[Opcode] = &[
            $(Opcode { mnemonic: $mnemonic, template: $template, format: Format::$format },)*
        ];
    };
}

opcode_table! {
    LUI = "lui", 0x0000_0037, U;
    AUIPC = "auipc", 0x0000_0017, U;
    JAL = "jal", 0x0000_006f, J;
    JALR = "jalr", 0x0000_0067, I;

    BEQ = "beq", 0x0000_0063, B;
    BNE = "bne", 0x0000_1063, B;
    BLT = "blt", 0x0000_4063, B;
    BGE = "bge", 0x0000_5063, B;
    BLTU = "bltu", 0x0000_6063, B;
    BGEU = "bgeu", 0x0000_7063, B;

    LB = "lb", 0x0000_0003, I;
    LH = "lh", 0x0000_1003, I;
    LW = "lw", 0x0000_2003, I;
    LBU = "lbu", 0x0000_4003, I;
    LHU = "lhu", 0x0000_5003, I;
    SB = "sb", 0x0000_0023, S;
    SH = "sh", 0x0000_1023, S;
    SW = "sw", 0x0000_2023, S;

    ADDI = "addi", 0x0000_0013, I;
    SLTI = "slti", 0x0000_2013, I;
    SLTIU = "sltiu", 0x0000_3013, I;
    XORI = "xori", 0x0000_4013, I;
    ORI = "ori", 0x0000_6013, I;
    ANDI = "andi", 0x0000_7013, I;
    // shift amount goes in the rs2 field
    SLLI = "slli", 0x0000_1013, R;
    SRLI = "srli", 0x0000_5013, R;
    SRAI = "srai", 0x4000_5013, R;

    ADD = "add", 0x0000_0033, R;
    SUB = "sub", 0x4000_0033, R;
    SLL = "sll", 0x0000_1033, R;
    SLT = "slt", 0x0000_2033, R;
    SLTU = "sltu", 0x0000_3033, R;
    XOR = "xor", 0x0000_4033, R;
    SRL = "srl", 0x0000_5033, R;
    SRA = "sra", 0x4000_5033, R;
    OR = "or", 0x0000_6033, R;
    AND = "and", 0x0000_7033, R;

    MUL = "mul", 0x0200_0033, R;
    MULH = "mulh", 0x0200_1033, R;
    MULHSU = "mulhsu", 0x0200_2033, R;
    MULHU = "mulhu", 0x0200_3033, R;
    DIV = "div", 0x0200_4033, R;
    DIVU = "divu", 0x0200_5033, R;
    REM = "rem", 0x0200_6033, R;
    REMU = "remu", 0x0200_7033, R;

    FENCE = "fence", 0x0000_000f, I;
    CSRRW = "csrrw", 0x0000_1073, I;
    CSRRS = "csrrs", 0x0000_2073, I;
    CSRRC = "csrrc", 0x0000_3073, I;
    CSRRWI = "csrrwi", 0x0000_5073, I;
    CSRRSI = "csrrsi", 0x0000_6073, I;
    CSRRCI = "csrrci", 0x0000_7073, I;
}

/// Instructions with no operands, emitted as fixed words
pub const FIXED_WORDS: [(&str, u32); 3] =
    [("fence.i", 0x0000_100f), ("ecall", 0x0000_0073), ("ebreak", 0x0010_0073)];

// ============================================================================
// Constructors
// ============================================================================

macro_rules! r_type_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            pub fn $name(rd: Register, rs1: Register, rs2: Register) -> Node {
                Node::instruction($template, Operands::R { rd, rs1, rs2 })
            }
        )*
    };
}

macro_rules! i_type_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            pub fn $name(rd: Register, rs1: Register, imm: impl Into<Value>) -> Node {
                Node::instruction($template, Operands::I { rd, rs1, imm: imm.into() })
            }
        )*
    };
}

macro_rules! s_type_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            /// `rs1` is the base address register, `rs2` the value stored
            pub fn $name(rs1: Register, rs2: Register, imm: impl Into<Value>) -> Node {
                Node::instruction($template, Operands::S { rs1, rs2, imm: imm.into() })
            }
        )*
    };
}

macro_rules! b_type_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            pub fn $name(rs1: Register, rs2: Register, target: impl Into<Value>) -> Node {
                Node::instruction($template, Operands::B { rs1, rs2, target: target.into() })
            }
        )*
    };
}

macro_rules! u_type_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            pub fn $name(rd: Register, imm: impl Into<Value>) -> Node {
                Node::instruction($template, Operands::U { rd, imm: imm.into() })
            }
        )*
    };
}

macro_rules! shift_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            /// Panics if `shamt` is not in 0..32.
            pub fn $name(rd: Register, rs1: Register, shamt: u32) -> Node {
                assert!(shamt < 32, "shift amount {} out of range (must be 0-31)", shamt);
                Node::instruction($template, Operands::R { rd, rs1, rs2: Register::new(shamt) })
            }
        )*
    };
}

macro_rules! csr_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            /// Panics if `csr` is not a 12-bit CSR number.
            pub fn $name(rd: Register, rs1: Register, csr: u32) -> Node {
                Node::instruction($template, Operands::I { rd, rs1, imm: csr_imm(csr).into() })
            }
        )*
    };
}

macro_rules! csr_imm_ops {
    ($($name:ident => $template:ident),* $(,)?) => {
        $(
            /// `uimm` is a 5-bit immediate carried in the rs1 field.
            pub fn $name(rd: Register, uimm: u32, csr: u32) -> Node {
                assert!(uimm < 32, "csr immediate {} out of range (must be 0-31)", uimm);
                let rs1 = Register::new(uimm);
                Node::instruction($template, Operands::I { rd, rs1, imm: csr_imm(csr).into() })
            }
        )*
    };
}

r_type_ops! {
    add => ADD, sub => SUB, sll => SLL, slt => SLT, sltu => SLTU,
    xor => XOR, srl => SRL, sra => SRA, or => OR, and => AND,
    mul => MUL, mulh => MULH, mulhsu => MULHSU, mulhu => MULHU,
    div => DIV, divu => DIVU, rem => REM, remu => REMU,
}

i_type_ops! {
    jalr => JALR,
    lb => LB, lh => LH, lw => LW, lbu => LBU, lhu => LHU,
    addi => ADDI, slti => SLTI, sltiu => SLTIU, xori => XORI, ori => ORI, andi => ANDI,
}

s_type_ops! { sb => SB, sh => SH, sw => SW }

b_type_ops! { beq => BEQ, bne => BNE, blt => BLT, bge => BGE, bltu => BLTU, bgeu => BGEU }

u_type_ops! { lui => LUI, auipc => AUIPC }

shift_ops! { slli => SLLI, srli => SRLI, srai => SRAI }

csr_ops! { csrrw => CSRRW, csrrs => CSRRS, csrrc => CSRRC }

csr_imm_ops! { csrrwi => CSRRWI, csrrsi => CSRRSI, csrrci => CSRRCI }

pub fn jal(rd: Register, target: impl Into<Value>) -> Node {
    Node::instruction(JAL, Operands::J { rd, target: target.into() })
}

/// `pred` and `succ` are 4-bit IORW sets
pub fn fence(pred: u32, succ: u32) -> Node {
    let imm = ((pred & 0xf) << 4) | (succ & 0xf);
    Node::instruction(FENCE, Operands::I { rd: ZERO, rs1: ZERO, imm: imm.into() })
}

pub fn fence_i() -> Node {
    words([FIXED_WORDS[0].1])
}

pub fn ecall() -> Node {
    words([FIXED_WORDS[1].1])
}

pub fn ebreak() -> Node {
    words([FIXED_WORDS[2].1])
}

/// CSR numbers are unsigned, but share the signed I-type immediate field
fn csr_imm(csr: u32) -> i64 {
    assert!(csr < 4096, "csr number {:#x} out of range (must be 12 bits)", csr);
    crate::fields::sign_extend(csr as i64, 12)
}

// ============================================================================
// Pseudo-Instructions
// ============================================================================

/// Load the address `target` into `rd` (auipc + addi)
///
/// Returns a new group so the offset can be computed from the address of
/// the auipc.
pub fn lli(program: &mut Program, rd: Register, target: impl Into<Value>) -> Node {
    let target: Value = target.into();
    let rel = program.group();
    let offset = target - rel;
    program.extend(rel, [auipc(rd, hi(&offset)), addi(rd, rd, lo(&offset))]);
    Node::Group(rel)
}

pub fn la(program: &mut Program, rd: Register, target: impl Into<Value>) -> Node {
    lli(program, rd, target)
}

/// Load a 32-bit constant (lui + addi)
///
/// Always two instructions, even when `imm` would fit in one, so that the
/// size of the code never depends on a value.
pub fn li(program: &mut Program, rd: Register, imm: impl Into<Value>) -> Node {
    let imm: Value = imm.into();
    Node::Group(program.group_of(vec![lui(rd, hi(&imm)), addi(rd, rd, lo(&imm))]))
}

/// Call a subroutine anywhere in a 32-bit range (auipc ra + jalr ra)
pub fn call(program: &mut Program, target: impl Into<Value>) -> Node {
    far_jump(program, RA, RA, target)
}

/// Tail call through t1 (auipc t1 + jalr zero)
pub fn tail(program: &mut Program, target: impl Into<Value>) -> Node {
    far_jump(program, T1, ZERO, target)
}

fn far_jump(program: &mut Program, scratch: Register, link: Register, target: impl Into<Value>) -> Node {
    let target: Value = target.into();
    let rel = program.group();
    let offset = target - rel;
    program.extend(rel, [auipc(scratch, hi(&offset)), jalr(link, scratch, lo(&offset))]);
    Node::Group(rel)
}

pub fn j(target: impl Into<Value>) -> Node {
    jal(ZERO, target)
}

pub fn ret() -> Node {
    jalr(ZERO, RA, 0)
}

pub fn nop() -> Node {
    addi(ZERO, ZERO, 0)
}

pub fn mv(rd: Register, rs: Register) -> Node {
    addi(rd, rs, 0)
}
