// fields.rs
//
// Bit-field placement tables for 32-bit instruction words.
//
// Each immediate format is described as a list of BitFields: `width` bits
// taken from bit `src` of the immediate and placed at bit `dst` of the word.
// Encoding scatters an immediate through its table; decoding gathers it back.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Lowest bit of the slice within the immediate
    pub src: u32,
    /// Number of bits in the slice
    pub width: u32,
    /// Lowest bit of the slice within the instruction word
    pub dst: u32,
}

impl BitField {
    pub const fn new(src: u32, width: u32, dst: u32) -> Self {
        BitField { src, width, dst }
    }

    const fn mask(self) -> u32 {
        if self.width >= 32 { u32::MAX } else { (1 << self.width) - 1 }
    }

    /// Move this slice of `value` into its place in an instruction word
    pub const fn insert(self, value: u32) -> u32 {
        ((value >> self.src) & self.mask()) << self.dst
    }

    /// Move this slice of `word` back to its place in the immediate
    pub const fn extract(self, word: u32) -> u32 {
        ((word >> self.dst) & self.mask()) << self.src
    }
}

// Register fields
pub const RD: BitField = BitField::new(0, 5, 7);
pub const RS1: BitField = BitField::new(0, 5, 15);
pub const RS2: BitField = BitField::new(0, 5, 20);

/// imm[11:0] -> inst[31:20]
pub const I_IMM: [BitField; 1] = [BitField::new(0, 12, 20)];

/// imm[4:0] -> inst[11:7], imm[11:5] -> inst[31:25]
pub const S_IMM: [BitField; 2] = [BitField::new(0, 5, 7), BitField::new(5, 7, 25)];

/// imm[11] -> inst[7], imm[4:1] -> inst[11:8], imm[10:5] -> inst[30:25], imm[12] -> inst[31]
pub const B_IMM: [BitField; 4] = [
    BitField::new(11, 1, 7),
    BitField::new(1, 4, 8),
    BitField::new(5, 6, 25),
    BitField::new(12, 1, 31),
];

/// imm[31:12] -> inst[31:12]
pub const U_IMM: [BitField; 1] = [BitField::new(12, 20, 12)];

/// imm[19:12] -> inst[19:12], imm[11] -> inst[20], imm[10:1] -> inst[30:21], imm[20] -> inst[31]
pub const J_IMM: [BitField; 4] = [
    BitField::new(12, 8, 12),
    BitField::new(11, 1, 20),
    BitField::new(1, 10, 21),
    BitField::new(20, 1, 31),
];

/// Scatter the low bits of `imm` into instruction-word positions
pub fn scatter(imm: i64, fields: &[BitField]) -> u32 {
    let bits = imm as u32;
    fields.iter().fold(0, |word, field| word | field.insert(bits))
}

/// Gather an immediate from an instruction word and sign-extend it from
/// its highest placed bit
pub fn gather(word: u32, fields: &[BitField]) -> i64 {
    let raw = fields.iter().fold(0u32, |imm, field| imm | field.extract(word));
    let top = fields.iter().map(|f| f.src + f.width).max().unwrap_or(0);
    sign_extend(raw as i64, top)
}

/// Sign-extend the low `bits` bits of `value`
pub fn sign_extend(value: i64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return value;
    }
    let shift = 64 - bits;
    (value << shift) >> shift
}
