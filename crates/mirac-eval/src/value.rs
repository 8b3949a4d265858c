//! Runtime values.
//!
//! A [`Value`] is a tagged variant: a boolean or an integer of one of the
//! eight built-in widths. Operators dispatch on the tag pair; the type
//! checker rules out mismatched pairs ahead of time, so hitting one at
//! runtime is reported as an unsupported operation rather than a panic.
//! Arithmetic is checked: overflow and division/remainder by zero are
//! runtime errors, never wrap-around or UB.

use std::fmt;

use mirac_par::ast::{BinOp, UnOp};

use crate::RuntimeError;

/// A runtime value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
}

macro_rules! integer_binary {
    ($ctor:ident, $a:expr, $b:expr, $op:expr) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinOp::Eq => Value::Bool(a == b),
            BinOp::Ne => Value::Bool(a != b),
            BinOp::Lt => Value::Bool(a < b),
            BinOp::Le => Value::Bool(a <= b),
            BinOp::Gt => Value::Bool(a > b),
            BinOp::Ge => Value::Bool(a >= b),
            BinOp::Add => Value::$ctor(a.checked_add(b).ok_or(RuntimeError::Overflow)?),
            BinOp::Sub => Value::$ctor(a.checked_sub(b).ok_or(RuntimeError::Overflow)?),
            BinOp::Mul => Value::$ctor(a.checked_mul(b).ok_or(RuntimeError::Overflow)?),
            BinOp::Div => Value::$ctor(a.checked_div(b).ok_or(if b == 0 {
                RuntimeError::DivisionByZero
            } else {
                RuntimeError::Overflow
            })?),
            BinOp::Rem => Value::$ctor(a.checked_rem(b).ok_or(if b == 0 {
                RuntimeError::DivisionByZero
            } else {
                RuntimeError::Overflow
            })?),
            BinOp::BitAnd => Value::$ctor(a & b),
            BinOp::BitOr => Value::$ctor(a | b),
            BinOp::BitXor => Value::$ctor(a ^ b),
            BinOp::LogicAnd | BinOp::LogicOr => {
                return Err(RuntimeError::UnsupportedOperation(
                    "logical operator applied to integers",
                ))
            }
        }
    }};
}

macro_rules! integer_neg {
    ($ctor:ident, $value:expr) => {
        Value::$ctor($value.checked_neg().ok_or(RuntimeError::Overflow)?)
    };
}

impl Value {
    /// Apply a binary operator. The operand tags must match exactly.
    pub fn binary(&self, op: BinOp, rhs: &Value) -> Result<Value, RuntimeError> {
        Ok(match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => match op {
                BinOp::Eq => Value::Bool(a == b),
                BinOp::Ne => Value::Bool(a != b),
                BinOp::Lt => Value::Bool(a < b),
                BinOp::Le => Value::Bool(a <= b),
                BinOp::Gt => Value::Bool(a > b),
                BinOp::Ge => Value::Bool(a >= b),
                BinOp::LogicAnd | BinOp::BitAnd => Value::Bool(*a && *b),
                BinOp::LogicOr | BinOp::BitOr => Value::Bool(*a || *b),
                BinOp::BitXor => Value::Bool(a != b),
                _ => {
                    return Err(RuntimeError::UnsupportedOperation(
                        "arithmetic on booleans",
                    ))
                }
            },
            (Value::Int8(a), Value::Int8(b)) => integer_binary!(Int8, *a, *b, op),
            (Value::Int16(a), Value::Int16(b)) => integer_binary!(Int16, *a, *b, op),
            (Value::Int32(a), Value::Int32(b)) => integer_binary!(Int32, *a, *b, op),
            (Value::Int64(a), Value::Int64(b)) => integer_binary!(Int64, *a, *b, op),
            (Value::UInt8(a), Value::UInt8(b)) => integer_binary!(UInt8, *a, *b, op),
            (Value::UInt16(a), Value::UInt16(b)) => integer_binary!(UInt16, *a, *b, op),
            (Value::UInt32(a), Value::UInt32(b)) => integer_binary!(UInt32, *a, *b, op),
            (Value::UInt64(a), Value::UInt64(b)) => integer_binary!(UInt64, *a, *b, op),
            _ => {
                return Err(RuntimeError::UnsupportedOperation(
                    "mismatched operand types",
                ))
            }
        })
    }

    /// Apply a prefix operator: `-` on integers, `!` on booleans.
    pub fn prefix(&self, op: UnOp) -> Result<Value, RuntimeError> {
        Ok(match (self, op) {
            (Value::Bool(b), UnOp::Not) => Value::Bool(!b),
            (Value::Int8(v), UnOp::Neg) => integer_neg!(Int8, v),
            (Value::Int16(v), UnOp::Neg) => integer_neg!(Int16, v),
            (Value::Int32(v), UnOp::Neg) => integer_neg!(Int32, v),
            (Value::Int64(v), UnOp::Neg) => integer_neg!(Int64, v),
            (Value::UInt8(v), UnOp::Neg) => integer_neg!(UInt8, v),
            (Value::UInt16(v), UnOp::Neg) => integer_neg!(UInt16, v),
            (Value::UInt32(v), UnOp::Neg) => integer_neg!(UInt32, v),
            (Value::UInt64(v), UnOp::Neg) => integer_neg!(UInt64, v),
            _ => {
                return Err(RuntimeError::UnsupportedOperation(
                    "prefix operator on incompatible value",
                ))
            }
        })
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic() {
        let a = Value::Int32(7);
        let b = Value::Int32(3);
        assert_eq!(a.binary(BinOp::Add, &b).unwrap(), Value::Int32(10));
        assert_eq!(a.binary(BinOp::Sub, &b).unwrap(), Value::Int32(4));
        assert_eq!(a.binary(BinOp::Mul, &b).unwrap(), Value::Int32(21));
        assert_eq!(a.binary(BinOp::Div, &b).unwrap(), Value::Int32(2));
        assert_eq!(a.binary(BinOp::Rem, &b).unwrap(), Value::Int32(1));
    }

    #[test]
    fn test_integer_comparisons_yield_bool() {
        let a = Value::Int32(1);
        let b = Value::Int32(2);
        assert_eq!(a.binary(BinOp::Lt, &b).unwrap(), Value::Bool(true));
        assert_eq!(a.binary(BinOp::Ge, &b).unwrap(), Value::Bool(false));
        assert_eq!(a.binary(BinOp::Ne, &b).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_integer_bitwise() {
        let a = Value::UInt8(0b1100);
        let b = Value::UInt8(0b1010);
        assert_eq!(a.binary(BinOp::BitAnd, &b).unwrap(), Value::UInt8(0b1000));
        assert_eq!(a.binary(BinOp::BitOr, &b).unwrap(), Value::UInt8(0b1110));
        assert_eq!(a.binary(BinOp::BitXor, &b).unwrap(), Value::UInt8(0b0110));
    }

    #[test]
    fn test_division_by_zero() {
        let a = Value::Int32(1);
        let zero = Value::Int32(0);
        assert!(matches!(
            a.binary(BinOp::Div, &zero),
            Err(RuntimeError::DivisionByZero)
        ));
        assert!(matches!(
            a.binary(BinOp::Rem, &zero),
            Err(RuntimeError::DivisionByZero)
        ));
    }

    #[test]
    fn test_overflow_is_checked() {
        let max = Value::Int32(i32::MAX);
        let one = Value::Int32(1);
        assert!(matches!(
            max.binary(BinOp::Add, &one),
            Err(RuntimeError::Overflow)
        ));

        let min = Value::Int8(i8::MIN);
        assert!(matches!(
            min.binary(BinOp::Div, &Value::Int8(-1)),
            Err(RuntimeError::Overflow)
        ));
    }

    #[test]
    fn test_boolean_operators() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(t.binary(BinOp::LogicAnd, &f).unwrap(), Value::Bool(false));
        assert_eq!(t.binary(BinOp::LogicOr, &f).unwrap(), Value::Bool(true));
        assert_eq!(t.binary(BinOp::BitXor, &f).unwrap(), Value::Bool(true));
        assert_eq!(t.binary(BinOp::Eq, &f).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_prefix_operators() {
        assert_eq!(Value::Int32(5).prefix(UnOp::Neg).unwrap(), Value::Int32(-5));
        assert_eq!(Value::Bool(true).prefix(UnOp::Not).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_unsigned_negation_overflows() {
        assert_eq!(Value::UInt32(0).prefix(UnOp::Neg).unwrap(), Value::UInt32(0));
        assert!(matches!(
            Value::UInt32(1).prefix(UnOp::Neg),
            Err(RuntimeError::Overflow)
        ));
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let a = Value::Int32(1);
        let b = Value::Int64(1);
        assert!(matches!(
            a.binary(BinOp::Add, &b),
            Err(RuntimeError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            a.binary(BinOp::Eq, &Value::Bool(true)),
            Err(RuntimeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_unsupported_combinations() {
        let t = Value::Bool(true);
        assert!(matches!(
            t.binary(BinOp::Add, &Value::Bool(false)),
            Err(RuntimeError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            Value::Int32(1).prefix(UnOp::Not),
            Err(RuntimeError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            Value::Bool(true).prefix(UnOp::Neg),
            Err(RuntimeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(-7).to_string(), "-7");
        assert_eq!(Value::UInt64(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
