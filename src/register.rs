// register.rs
//
// Integer register file indices.
//
// A register outside x0..x31 means the program tree itself is malformed, so
// construction panics instead of recording a diagnostic.

use std::fmt;

/// ABI register names, indexed by register number
pub const NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(u8);

impl Register {
    /// Create a register from its index
    ///
    /// Panics if `index` is not in 0..32.
    pub const fn new(index: u32) -> Self {
        assert!(index < 32, "register index out of range (must be 0-31)");
        Register(index as u8)
    }

    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    pub fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }
}

impl From<u32> for Register {
    fn from(index: u32) -> Self {
        Register::new(index)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const ZERO: Register = Register::new(0);
pub const RA: Register = Register::new(1);
pub const SP: Register = Register::new(2);
pub const GP: Register = Register::new(3);
pub const TP: Register = Register::new(4);
pub const T0: Register = Register::new(5);
pub const T1: Register = Register::new(6);
pub const T2: Register = Register::new(7);
pub const S0: Register = Register::new(8);
pub const S1: Register = Register::new(9);
pub const A0: Register = Register::new(10);
pub const A1: Register = Register::new(11);
pub const A2: Register = Register::new(12);
pub const A3: Register = Register::new(13);
pub const A4: Register = Register::new(14);
pub const A5: Register = Register::new(15);
pub const A6: Register = Register::new(16);
pub const A7: Register = Register::new(17);
