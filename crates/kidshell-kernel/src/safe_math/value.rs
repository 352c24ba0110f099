//! Runtime values and operator semantics.
//!
//! Integers are exact (`i128`) until an operation overflows, at which point the
//! result becomes a float. `/` always yields a float. `//` and `%` round toward
//! negative infinity, so the remainder takes the divisor's sign.

use std::cmp::Ordering;
use std::fmt;

use kidshell_types::{format_float, Number};

use super::ast::{BinaryOp, CompareOp};
use super::SafeMathError;

#[derive(Debug, Clone, PartialEq)]
pub enum MathValue {
    Int(i128),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<MathValue>),
}

/// Numeric view of a value: booleans count as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    I(i128),
    F(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::I(i) => i as f64,
            Num::F(f) => f,
        }
    }

    pub(crate) fn into_value(self) -> MathValue {
        match self {
            Num::I(i) => MathValue::Int(i),
            Num::F(f) => MathValue::Float(f),
        }
    }
}

impl MathValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            MathValue::Int(_) => "int",
            MathValue::Float(_) => "float",
            MathValue::Bool(_) => "bool",
            MathValue::Str(_) => "str",
            MathValue::List(_) => "list",
        }
    }

    pub(crate) fn as_num(&self) -> Option<Num> {
        match self {
            MathValue::Int(i) => Some(Num::I(*i)),
            MathValue::Float(f) => Some(Num::F(*f)),
            MathValue::Bool(b) => Some(Num::I(i128::from(*b))),
            MathValue::Str(_) | MathValue::List(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_num().map(Num::as_f64)
    }

    pub fn truthy(&self) -> bool {
        match self {
            MathValue::Int(i) => *i != 0,
            MathValue::Float(f) => *f != 0.0,
            MathValue::Bool(b) => *b,
            MathValue::Str(s) => !s.is_empty(),
            MathValue::List(items) => !items.is_empty(),
        }
    }

    /// Approximate heap footprint, charged against the memory budget.
    pub(crate) fn heap_size(&self) -> usize {
        match self {
            MathValue::Str(s) => s.len(),
            MathValue::List(items) => {
                items.len() * std::mem::size_of::<MathValue>()
                    + items.iter().map(MathValue::heap_size).sum::<usize>()
            }
            _ => 0,
        }
    }

    /// Quoted form for strings, used in messages and cache keys.
    pub fn repr(&self) -> String {
        match self {
            MathValue::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

impl From<Number> for MathValue {
    fn from(value: Number) -> Self {
        match value {
            Number::Int(i) => MathValue::Int(i128::from(i)),
            Number::Float(f) => MathValue::Float(f),
        }
    }
}

impl fmt::Display for MathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathValue::Int(i) => write!(f, "{i}"),
            MathValue::Float(x) => f.write_str(&format_float(*x)),
            MathValue::Bool(true) => f.write_str("True"),
            MathValue::Bool(false) => f.write_str("False"),
            MathValue::Str(s) => f.write_str(s),
            MathValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
        }
    }
}

fn unsupported(op: &str, left: &MathValue, right: &MathValue) -> SafeMathError {
    SafeMathError::InvalidExpression(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

/// Apply a binary operator. `max_bytes` bounds sequence repetition and concatenation.
pub(crate) fn binary_op(
    op: BinaryOp,
    left: &MathValue,
    right: &MathValue,
    max_bytes: usize,
) -> Result<MathValue, SafeMathError> {
    if let (Some(a), Some(b)) = (left.as_num(), right.as_num()) {
        return numeric_op(op, a, b).map(Num::into_value);
    }

    match (op, left, right) {
        (BinaryOp::Add, MathValue::Str(a), MathValue::Str(b)) => {
            check_size(a.len() + b.len(), max_bytes)?;
            Ok(MathValue::Str(format!("{a}{b}")))
        }
        (BinaryOp::Add, MathValue::List(a), MathValue::List(b)) => {
            check_size(left.heap_size() + right.heap_size(), max_bytes)?;
            Ok(MathValue::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Mul, MathValue::Str(_) | MathValue::List(_), MathValue::Int(_) | MathValue::Bool(_)) => {
            repeat(left, right, max_bytes)
        }
        (BinaryOp::Mul, MathValue::Int(_) | MathValue::Bool(_), MathValue::Str(_) | MathValue::List(_)) => {
            repeat(right, left, max_bytes)
        }
        _ => Err(unsupported(op.symbol(), left, right)),
    }
}

fn check_size(bytes: usize, max_bytes: usize) -> Result<(), SafeMathError> {
    if bytes > max_bytes {
        return Err(SafeMathError::MemoryLimit);
    }
    Ok(())
}

fn repeat(sequence: &MathValue, count: &MathValue, max_bytes: usize) -> Result<MathValue, SafeMathError> {
    let times = match count.as_num() {
        Some(Num::I(n)) if n <= 0 => 0,
        Some(Num::I(n)) => usize::try_from(n).map_err(|_| SafeMathError::MemoryLimit)?,
        _ => return Err(unsupported("*", sequence, count)),
    };
    let total = sequence
        .heap_size()
        .checked_mul(times)
        .ok_or(SafeMathError::MemoryLimit)?;
    check_size(total, max_bytes)?;

    Ok(match sequence {
        MathValue::Str(s) => MathValue::Str(s.repeat(times)),
        MathValue::List(items) => {
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            MathValue::List(out)
        }
        other => return Err(unsupported("*", other, count)),
    })
}

pub(crate) fn numeric_op(op: BinaryOp, a: Num, b: Num) -> Result<Num, SafeMathError> {
    match op {
        BinaryOp::Add => Ok(int_or_float(a, b, i128::checked_add, |x, y| x + y)),
        BinaryOp::Sub => Ok(int_or_float(a, b, i128::checked_sub, |x, y| x - y)),
        BinaryOp::Mul => Ok(int_or_float(a, b, i128::checked_mul, |x, y| x * y)),
        BinaryOp::Div => {
            if b.as_f64() == 0.0 {
                return Err(SafeMathError::DivisionByZero);
            }
            Ok(Num::F(a.as_f64() / b.as_f64()))
        }
        BinaryOp::FloorDiv => floor_div(a, b),
        BinaryOp::Mod => modulo(a, b),
        BinaryOp::Pow => power(a, b),
    }
}

fn int_or_float(
    a: Num,
    b: Num,
    int_op: fn(i128, i128) -> Option<i128>,
    float_op: fn(f64, f64) -> f64,
) -> Num {
    if let (Num::I(x), Num::I(y)) = (a, b) {
        if let Some(result) = int_op(x, y) {
            return Num::I(result);
        }
    }
    Num::F(float_op(a.as_f64(), b.as_f64()))
}

fn floor_div(a: Num, b: Num) -> Result<Num, SafeMathError> {
    if b.as_f64() == 0.0 {
        return Err(SafeMathError::DivisionByZero);
    }
    if let (Num::I(x), Num::I(y)) = (a, b) {
        if let Some(q) = x.checked_div(y) {
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            return Ok(Num::I(if adjust { q - 1 } else { q }));
        }
    }
    Ok(Num::F((a.as_f64() / b.as_f64()).floor()))
}

fn modulo(a: Num, b: Num) -> Result<Num, SafeMathError> {
    if b.as_f64() == 0.0 {
        return Err(SafeMathError::DivisionByZero);
    }
    if let (Num::I(x), Num::I(y)) = (a, b) {
        if let Some(r) = x.checked_rem(y) {
            let r = if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r };
            return Ok(Num::I(r));
        }
    }
    let (x, y) = (a.as_f64(), b.as_f64());
    let r = x % y;
    Ok(Num::F(if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }))
}

fn power(a: Num, b: Num) -> Result<Num, SafeMathError> {
    if let (Num::I(x), Num::I(y)) = (a, b) {
        if y >= 0 {
            if let Some(result) = u32::try_from(y).ok().and_then(|e| x.checked_pow(e)) {
                return Ok(Num::I(result));
            }
        } else if x == 0 {
            return Err(SafeMathError::DivisionByZero);
        }
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    if x == 0.0 && y < 0.0 {
        return Err(SafeMathError::DivisionByZero);
    }
    if x < 0.0 && y.fract() != 0.0 {
        return Err(SafeMathError::Domain(
            "negative number cannot be raised to a fractional power".to_string(),
        ));
    }
    Ok(Num::F(x.powf(y)))
}

/// Equality across types: numbers compare by value, everything else structurally.
pub(crate) fn values_equal(left: &MathValue, right: &MathValue) -> bool {
    match (left.as_num(), right.as_num()) {
        (Some(Num::I(a)), Some(Num::I(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => match (left, right) {
            (MathValue::Str(a), MathValue::Str(b)) => a == b,
            (MathValue::List(a), MathValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
            }
            _ => false,
        },
    }
}

fn ordering(left: &MathValue, right: &MathValue, op: CompareOp) -> Result<Ordering, SafeMathError> {
    let unorderable = || {
        SafeMathError::InvalidExpression(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    };

    match (left.as_num(), right.as_num()) {
        (Some(Num::I(a)), Some(Num::I(b))) => Ok(a.cmp(&b)),
        (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(unorderable),
        _ => match (left, right) {
            (MathValue::Str(a), MathValue::Str(b)) => Ok(a.cmp(b)),
            _ => Err(unorderable()),
        },
    }
}

pub(crate) fn compare(op: CompareOp, left: &MathValue, right: &MathValue) -> Result<bool, SafeMathError> {
    Ok(match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt => ordering(left, right, op)? == Ordering::Less,
        CompareOp::Le => ordering(left, right, op)? != Ordering::Greater,
        CompareOp::Gt => ordering(left, right, op)? == Ordering::Greater,
        CompareOp::Ge => ordering(left, right, op)? != Ordering::Less,
    })
}

pub(crate) fn negate(value: &MathValue) -> Result<MathValue, SafeMathError> {
    match value.as_num() {
        Some(Num::I(i)) => Ok(i
            .checked_neg()
            .map(MathValue::Int)
            .unwrap_or(MathValue::Float(-(i as f64)))),
        Some(Num::F(f)) => Ok(MathValue::Float(-f)),
        None => Err(SafeMathError::InvalidExpression(format!(
            "bad operand type for unary -: '{}'",
            value.type_name()
        ))),
    }
}

pub(crate) fn positive(value: &MathValue) -> Result<MathValue, SafeMathError> {
    match value.as_num() {
        Some(num) => Ok(num.into_value()),
        None => Err(SafeMathError::InvalidExpression(format!(
            "bad operand type for unary +: '{}'",
            value.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1 << 20;

    fn op(op: BinaryOp, a: MathValue, b: MathValue) -> Result<MathValue, SafeMathError> {
        binary_op(op, &a, &b, MAX)
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        use MathValue::Int;
        assert_eq!(op(BinaryOp::FloorDiv, Int(17), Int(5)), Ok(Int(3)));
        assert_eq!(op(BinaryOp::FloorDiv, Int(-7), Int(2)), Ok(Int(-4)));
        assert_eq!(op(BinaryOp::Mod, Int(-7), Int(3)), Ok(Int(2)));
        assert_eq!(op(BinaryOp::Mod, Int(7), Int(-3)), Ok(Int(-2)));
        assert_eq!(
            op(BinaryOp::Mod, MathValue::Float(5.5), Int(2)),
            Ok(MathValue::Float(1.5))
        );
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(
            op(BinaryOp::Div, MathValue::Int(15), MathValue::Int(3)),
            Ok(MathValue::Float(5.0))
        );
        assert_eq!(
            op(BinaryOp::Div, MathValue::Int(1), MathValue::Int(0)),
            Err(SafeMathError::DivisionByZero)
        );
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let big = MathValue::Int(i128::MAX);
        let result = op(BinaryOp::Add, big, MathValue::Int(1)).expect("promotes");
        assert!(matches!(result, MathValue::Float(_)));

        let result = op(BinaryOp::Pow, MathValue::Int(2), MathValue::Int(200)).expect("promotes");
        assert!(matches!(result, MathValue::Float(f) if f > 1e60));
    }

    #[test]
    fn test_power_edge_cases() {
        assert_eq!(
            op(BinaryOp::Pow, MathValue::Int(2), MathValue::Int(-1)),
            Ok(MathValue::Float(0.5))
        );
        assert_eq!(
            op(BinaryOp::Pow, MathValue::Int(0), MathValue::Int(-1)),
            Err(SafeMathError::DivisionByZero)
        );
        assert!(matches!(
            op(BinaryOp::Pow, MathValue::Int(-8), MathValue::Float(0.5)),
            Err(SafeMathError::Domain(_))
        ));
    }

    #[test]
    fn test_string_operations() {
        let s = |v: &str| MathValue::Str(v.to_string());
        assert_eq!(op(BinaryOp::Add, s("ab"), s("cd")), Ok(s("abcd")));
        assert_eq!(op(BinaryOp::Mul, s("ab"), MathValue::Int(3)), Ok(s("ababab")));
        assert_eq!(
            binary_op(BinaryOp::Mul, &s("ab"), &MathValue::Int(1_000_000), 1000),
            Err(SafeMathError::MemoryLimit)
        );
        assert!(matches!(
            op(BinaryOp::Sub, s("ab"), MathValue::Int(1)),
            Err(SafeMathError::InvalidExpression(_))
        ));
    }

    #[test]
    fn test_comparisons_mix_int_and_float() {
        assert_eq!(compare(CompareOp::Eq, &MathValue::Int(1), &MathValue::Float(1.0)), Ok(true));
        assert_eq!(compare(CompareOp::Eq, &MathValue::Bool(true), &MathValue::Int(1)), Ok(true));
        assert_eq!(
            compare(CompareOp::Eq, &MathValue::Str("1".into()), &MathValue::Int(1)),
            Ok(false)
        );
        assert_eq!(compare(CompareOp::Lt, &MathValue::Int(2), &MathValue::Float(2.5)), Ok(true));
        assert!(compare(CompareOp::Lt, &MathValue::Str("a".into()), &MathValue::Int(1)).is_err());
    }
}
