// value.rs
//
// Address algebra.
//
// A Value is a symbolic address: a constant, a group's base address, the
// current write address, or an expression tree over other values. Values are
// resolved on demand against the current Layout and are never cached, so the
// same value can resolve differently from one layout pass to the next.

use crate::layout::Layout;
use crate::node::GroupId;
use std::ops;

/// Binary operators for deferred arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

/// Unary operators for deferred arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    /// Upper part of a hi/lo split (multiple of 4096)
    Hi,
    /// Lower part of a hi/lo split (signed 12-bit)
    Lo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Const(i64),
    /// Base address of a group as of its most recent encoding
    Group(GroupId),
    /// The address at which the value is being resolved
    Here,
    Unary(UnaryOp, Box<Value>),
    Binary(BinaryOp, Box<Value>, Box<Value>),
}

impl Value {
    pub fn here() -> Self {
        Value::Here
    }

    pub fn unary(op: UnaryOp, operand: impl Into<Value>) -> Self {
        Value::Unary(op, Box::new(operand.into()))
    }

    pub fn binary(op: BinaryOp, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Self {
        Value::Binary(op, Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// Resolve this value at write address `now`
    pub fn resolve(&self, now: i64, layout: &Layout) -> i64 {
        resolve(now, self, layout)
    }
}

/// `hi(v)`: upper part of `v` for an auipc/lui
pub fn hi(value: impl Into<Value>) -> Value {
    Value::unary(UnaryOp::Hi, value)
}

/// `lo(v)`: lower part of `v` for the addi/jalr/load that follows
pub fn lo(value: impl Into<Value>) -> Value {
    Value::unary(UnaryOp::Lo, value)
}

/// Resolve a value into a concrete integer
///
/// Group references read the base recorded in `layout`; for groups not yet
/// encoded in the current pass this is the base from the previous pass.
/// Arithmetic wraps rather than panicking so that nonsense addresses in an
/// early pass only produce diagnostics.
pub fn resolve(now: i64, value: &Value, layout: &Layout) -> i64 {
    match value {
        Value::Const(v) => *v,
        Value::Group(id) => layout.base(*id),
        Value::Here => now,
        Value::Unary(op, operand) => {
            let v = resolve(now, operand, layout);
            match op {
                UnaryOp::Neg => v.wrapping_neg(),
                UnaryOp::Hi => calc_hi(v),
                UnaryOp::Lo => calc_lo(v),
            }
        }
        Value::Binary(op, lhs, rhs) => {
            let a = resolve(now, lhs, layout);
            let b = resolve(now, rhs, layout);
            match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::And => a & b,
                BinaryOp::Or => a | b,
                BinaryOp::Xor => a ^ b,
                BinaryOp::Shl => a.wrapping_shl(b as u32),
                BinaryOp::Shr => a.wrapping_shr(b as u32),
            }
        }
    }
}

// ============================================================================
// Hi/Lo Synthesis
// ============================================================================

/// Lower 12 bits of `value`, sign-extended into [-2048, 2048)
pub fn calc_lo(value: i64) -> i64 {
    let lo = value.rem_euclid(4096);
    if lo >= 2048 { lo - 4096 } else { lo }
}

/// `value - calc_lo(value)`: always a multiple of 4096
pub fn calc_hi(value: i64) -> i64 {
    value.wrapping_sub(calc_lo(value))
}

/// Split an offset into (hi, lo) with `hi + lo == offset`
pub fn split_hi_lo(offset: i64) -> (i64, i64) {
    (calc_hi(offset), calc_lo(offset))
}

// ============================================================================
// Conversions and Operators
// ============================================================================

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Const(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Const(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Const(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Const(v as i64)
    }
}

impl From<GroupId> for Value {
    fn from(id: GroupId) -> Self {
        Value::Group(id)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> ops::Add<T> for Value {
    type Output = Value;

    fn add(self, rhs: T) -> Value {
        Value::binary(BinaryOp::Add, self, rhs)
    }
}

impl<T: Into<Value>> ops::Sub<T> for Value {
    type Output = Value;

    fn sub(self, rhs: T) -> Value {
        Value::binary(BinaryOp::Sub, self, rhs)
    }
}

impl<T: Into<Value>> ops::Mul<T> for Value {
    type Output = Value;

    fn mul(self, rhs: T) -> Value {
        Value::binary(BinaryOp::Mul, self, rhs)
    }
}

impl ops::Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        Value::unary(UnaryOp::Neg, self)
    }
}

impl<T: Into<Value>> ops::Sub<T> for GroupId {
    type Output = Value;

    fn sub(self, rhs: T) -> Value {
        Value::binary(BinaryOp::Sub, self, rhs)
    }
}

impl<T: Into<Value>> ops::Add<T> for GroupId {
    type Output = Value;

    fn add(self, rhs: T) -> Value {
        Value::binary(BinaryOp::Add, self, rhs)
    }
}
