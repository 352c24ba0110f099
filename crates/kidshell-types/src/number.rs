//! Numeric and scalar values for the session environments and responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest float magnitude that still collapses to an integer when normalized.
const INT_COLLAPSE_LIMIT: f64 = 9.0e18;

/// A number as kids see it: integers stay integers, everything else is a float.
///
/// Serializes as a bare JSON number; `7` round-trips as `Int`, `7.0` as `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Integer value, if this number has no fractional part.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < INT_COLLAPSE_LIMIT => {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }

    /// Collapse integral floats (`4.0`) into `Int` so results read naturally.
    pub fn normalized(self) -> Self {
        match self.as_i64() {
            Some(i) => Number::Int(i),
            None => self,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Format a float the way calculators for kids print it: `3.0`, `0.5`, `1e+25`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let raw = format!("{value:e}");
        return match raw.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            None => raw,
        };
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// A single evaluation result: a number, a yes/no answer, or a short text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Scalar {
    /// Numeric view used for `last_number` chaining; booleans count as 0/1.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(Number::Int(i64::from(*b))),
            Scalar::Text(_) => None,
        }
    }
}

impl From<Number> for Scalar {
    fn from(value: Number) -> Self {
        Scalar::Number(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Value bound to a name in the symbol environment.
///
/// A placeholder is a symbol the child has named but not yet given a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SymbolValue {
    Number(Number),
    Placeholder(String),
}

impl SymbolValue {
    pub fn as_number(&self) -> Option<Number> {
        match self {
            SymbolValue::Number(n) => Some(*n),
            SymbolValue::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Number(n) => write!(f, "{n}"),
            SymbolValue::Placeholder(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_float(1.5e25), "1.5e+25");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(-2.0), "-2.0");
    }

    #[test]
    fn test_normalized_collapses_integral_floats() {
        assert_eq!(Number::Float(4.0).normalized(), Number::Int(4));
        assert_eq!(Number::Float(4.5).normalized(), Number::Float(4.5));
        assert_eq!(Number::Float(1e30).normalized(), Number::Float(1e30));
    }

    #[test]
    fn test_number_json_shape() {
        let int: Number = serde_json::from_str("7").expect("int");
        let float: Number = serde_json::from_str("7.5").expect("float");
        assert_eq!(int, Number::Int(7));
        assert_eq!(float, Number::Float(7.5));
        assert_eq!(serde_json::to_string(&Number::Float(3.0)).expect("ser"), "3.0");
    }

    #[test]
    fn test_symbol_value_is_tagged() {
        let placeholder = SymbolValue::Placeholder("x".into());
        let json = serde_json::to_value(&placeholder).expect("ser");
        assert_eq!(json["kind"], "placeholder");
        let back: SymbolValue = serde_json::from_value(json).expect("de");
        assert_eq!(back, placeholder);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Bool(true).to_string(), "True");
        assert_eq!(Scalar::Number(Number::Int(10)).to_string(), "10");
        assert_eq!(Scalar::Text("123".into()).to_string(), "123");
    }
}
