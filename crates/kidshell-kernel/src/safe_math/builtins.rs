//! Allowlisted constants and functions.
//!
//! Nothing outside these tables is reachable from an expression. Functions
//! fail with [`SafeMathError::Domain`] for bad arguments, which displays as
//! "Math error: ...".

use super::value::{binary_op, MathValue, Num};
use super::SafeMathError;
use super::ast::BinaryOp;

/// Largest magnitude accepted inside statistics sequences.
const MAX_SEQUENCE_VALUE: f64 = 1e30;
pub const MAX_SEQUENCE_LENGTH: usize = 1000;
pub const MAX_FACTORIAL_N: i128 = 170;
pub const MAX_COMBINATORICS_N: i128 = 1000;
/// Integer arguments to gcd/lcm stay below the result ceiling.
const MAX_EXACT_INT: u128 = 1_000_000_000_000_000_000_000_000_000_000;

/// Named constants available to every expression. Caller variables shadow them.
pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
    ("phi", 1.618_033_988_749_895),
    // Physical constants, SI units.
    ("c", 299_792_458.0),
    ("g", 9.806_65),
    ("G", 6.674_3e-11),
    ("h", 6.626_070_15e-34),
    ("k", 1.380_649e-23),
    ("R", 8.314_462_618),
    ("NA", 6.022_140_76e23),
    ("sigma", 5.670_374_419e-8),
];

/// Constants a session seeds into its math environment.
pub const SESSION_CONSTANTS: &[&str] = &["pi", "e", "tau", "phi"];

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
}

macro_rules! builtins {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// A callable from the allowlist.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($variant),*
        }

        impl Builtin {
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant),*];

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Builtin::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name),*
                }
            }
        }
    };
}

builtins! {
    Abs => "abs",
    Round => "round",
    Min => "min",
    Max => "max",
    Sum => "sum",
    Len => "len",
    Int => "int",
    Float => "float",
    Str => "str",
    Bool => "bool",
    Pow => "pow",
    Sin => "sin",
    Cos => "cos",
    Tan => "tan",
    Asin => "asin",
    Acos => "acos",
    Atan => "atan",
    Atan2 => "atan2",
    Radians => "radians",
    Degrees => "degrees",
    Sqrt => "sqrt",
    Log => "log",
    Log2 => "log2",
    Log10 => "log10",
    Exp => "exp",
    Hypot => "hypot",
    Gcd => "gcd",
    Lcm => "lcm",
    Factorial => "factorial",
    Comb => "comb",
    Perm => "perm",
    Percent => "percent",
    Mean => "mean",
    Median => "median",
    Mode => "mode",
    Stdev => "stdev",
    Pstdev => "pstdev",
    Variance => "variance",
    Pvariance => "pvariance",
    Floor => "floor",
    Ceil => "ceil",
}

/// Names that belong to the evaluator rather than to the child.
pub fn is_reserved(name: &str) -> bool {
    Builtin::from_name(name).is_some() || constant(name).is_some()
}

fn domain(message: impl Into<String>) -> SafeMathError {
    SafeMathError::Domain(message.into())
}

fn arity(name: &str, args: &[MathValue], min: usize, max: usize) -> Result<(), SafeMathError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(domain(format!(
            "{name}() takes {expected} argument(s) but {} were given",
            args.len()
        )));
    }
    Ok(())
}

fn number(name: &str, value: &MathValue) -> Result<f64, SafeMathError> {
    value.as_f64().ok_or_else(|| {
        domain(format!(
            "{name}() needs a number, not '{}'",
            value.type_name()
        ))
    })
}

fn finite(value: f64) -> Result<MathValue, SafeMathError> {
    if !value.is_finite() {
        return Err(domain("math range error"));
    }
    Ok(MathValue::Float(value))
}

/// Integer argument within `[-max_abs, max_abs]`; integral floats are accepted.
fn bounded_int(label: &str, value: &MathValue, max_abs: i128) -> Result<i128, SafeMathError> {
    let n = match value.as_num() {
        Some(Num::I(i)) => i,
        Some(Num::F(f)) if f.is_finite() && f.fract() == 0.0 => f as i128,
        Some(Num::F(_)) => return Err(domain(format!("{label} must be an integer"))),
        None => return Err(domain(format!("{label} must be an integer"))),
    };
    if n.unsigned_abs() > max_abs.unsigned_abs() {
        return Err(domain(format!("{label} is too large")));
    }
    Ok(n)
}

fn exact_int(name: &str, value: &MathValue) -> Result<i128, SafeMathError> {
    match value {
        MathValue::Int(i) if i.unsigned_abs() > MAX_EXACT_INT => {
            Err(domain(format!("argument to {name}() is too large")))
        }
        MathValue::Int(i) => Ok(*i),
        MathValue::Bool(b) => Ok(i128::from(*b)),
        other => Err(domain(format!(
            "'{}' object cannot be interpreted as an integer in {name}()",
            other.type_name()
        ))),
    }
}

fn float_to_int(value: f64) -> Result<MathValue, SafeMathError> {
    if !value.is_finite() {
        return Err(domain("cannot convert a non-finite float to an integer"));
    }
    if value.abs() >= 1e38 {
        return Ok(MathValue::Float(value));
    }
    Ok(MathValue::Int(value as i128))
}

/// Validated statistics input: a list of 1..=1000 finite, bounded numbers.
fn sequence(name: &str, args: &[MathValue], min_length: usize) -> Result<Vec<f64>, SafeMathError> {
    arity(name, args, 1, 1)?;
    let MathValue::List(items) = &args[0] else {
        return Err(domain("Expected a list or tuple"));
    };
    if items.len() < min_length {
        return Err(domain("Not enough values"));
    }
    if items.len() > MAX_SEQUENCE_LENGTH {
        return Err(domain("Too many values"));
    }
    items
        .iter()
        .map(|item| {
            let value = item
                .as_f64()
                .ok_or_else(|| domain("Sequence values must be numbers"))?;
            if !value.is_finite() {
                return Err(domain("Sequence contains non-finite values"));
            }
            if value.abs() > MAX_SEQUENCE_VALUE {
                return Err(domain("Sequence value is too large"));
            }
            Ok(value)
        })
        .collect()
}

/// Arguments to min/max: either one list, or the values themselves.
fn spread(args: &[MathValue]) -> &[MathValue] {
    match args {
        [MathValue::List(items)] => items,
        _ => args,
    }
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_of_squares(values: &[f64]) -> f64 {
    let mean = mean_of(values);
    values.iter().map(|v| (v - mean) * (v - mean)).sum()
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Falling product `n * (n-1) * ... * (n-k+1)`, exact while it fits.
fn falling_product(n: i128, k: i128) -> MathValue {
    let mut exact: Option<i128> = Some(1);
    let mut approx = 1.0_f64;
    for i in 0..k {
        exact = exact.and_then(|acc| acc.checked_mul(n - i));
        approx *= (n - i) as f64;
    }
    match exact {
        Some(value) => MathValue::Int(value),
        None => MathValue::Float(approx),
    }
}

fn combinations(n: i128, k: i128) -> MathValue {
    if k > n {
        return MathValue::Int(0);
    }
    let k = k.min(n - k);
    let mut exact: Option<i128> = Some(1);
    let mut approx = 1.0_f64;
    for i in 0..k {
        // acc * (n - i) is always divisible by (i + 1) at this point.
        exact = exact
            .and_then(|acc| acc.checked_mul(n - i))
            .map(|acc| acc / (i + 1));
        approx = approx * (n - i) as f64 / (i + 1) as f64;
    }
    match exact {
        Some(value) => MathValue::Int(value),
        None => MathValue::Float(approx.round()),
    }
}

fn round_value(args: &[MathValue]) -> Result<MathValue, SafeMathError> {
    arity("round", args, 1, 2)?;
    let digits = match args.get(1) {
        None => None,
        Some(value) => Some(bounded_int("ndigits", value, 308)?),
    };

    match (&args[0], digits) {
        (MathValue::Int(_) | MathValue::Bool(_), None) => {
            Ok(args[0].as_num().map(Num::into_value).unwrap_or(MathValue::Int(0)))
        }
        (value, None) => float_to_int(number("round", value)?.round_ties_even()),
        (MathValue::Int(i), Some(d)) if d >= 0 => Ok(MathValue::Int(*i)),
        (value, Some(d)) => {
            let x = number("round", value)?;
            let scale = 10f64.powi(d as i32);
            let rounded = (x * scale).round_ties_even() / scale;
            if matches!(value, MathValue::Int(_)) {
                float_to_int(rounded)
            } else {
                finite(rounded)
            }
        }
    }
}

fn extreme(name: &str, args: &[MathValue], want_max: bool) -> Result<MathValue, SafeMathError> {
    let items = spread(args);
    let mut best: Option<(&MathValue, f64)> = None;
    for item in items {
        let value = number(name, item)?;
        let better = match best {
            None => true,
            Some((_, current)) if want_max => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item.clone())
        .ok_or_else(|| domain(format!("{name}() arg is an empty sequence")))
}

impl Builtin {
    /// Invoke with already-evaluated arguments.
    pub fn call(self, args: &[MathValue], max_bytes: usize) -> Result<MathValue, SafeMathError> {
        let name = self.name();
        match self {
            Builtin::Abs => {
                arity(name, args, 1, 1)?;
                match args[0].as_num() {
                    Some(Num::I(i)) => Ok(i
                        .checked_abs()
                        .map(MathValue::Int)
                        .unwrap_or(MathValue::Float((i as f64).abs()))),
                    Some(Num::F(f)) => Ok(MathValue::Float(f.abs())),
                    None => Err(domain(format!(
                        "bad operand type for abs(): '{}'",
                        args[0].type_name()
                    ))),
                }
            }
            Builtin::Round => round_value(args),
            Builtin::Min => extreme(name, args, false),
            Builtin::Max => extreme(name, args, true),
            Builtin::Sum => {
                arity(name, args, 1, 2)?;
                let MathValue::List(items) = &args[0] else {
                    return Err(domain("sum() needs a list of numbers"));
                };
                let mut total = args.get(1).cloned().unwrap_or(MathValue::Int(0));
                for item in items {
                    if item.as_num().is_none() {
                        return Err(domain("sum() needs a list of numbers"));
                    }
                    total = binary_op(BinaryOp::Add, &total, item, max_bytes)?;
                }
                Ok(total)
            }
            Builtin::Len => {
                arity(name, args, 1, 1)?;
                match &args[0] {
                    MathValue::Str(s) => Ok(MathValue::Int(s.chars().count() as i128)),
                    MathValue::List(items) => Ok(MathValue::Int(items.len() as i128)),
                    other => Err(domain(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Int => {
                arity(name, args, 0, 1)?;
                match args.first() {
                    None => Ok(MathValue::Int(0)),
                    Some(MathValue::Str(s)) => s
                        .trim()
                        .replace('_', "")
                        .parse::<i128>()
                        .map(MathValue::Int)
                        .map_err(|_| domain(format!("invalid literal for int() with base 10: '{s}'"))),
                    Some(MathValue::Float(f)) => float_to_int(f.trunc()),
                    Some(other) => match other.as_num() {
                        Some(Num::I(i)) => Ok(MathValue::Int(i)),
                        _ => Err(domain(format!(
                            "int() argument must be a string or a number, not '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            Builtin::Float => {
                arity(name, args, 0, 1)?;
                match args.first() {
                    None => Ok(MathValue::Float(0.0)),
                    Some(MathValue::Str(s)) => s
                        .trim()
                        .parse::<f64>()
                        .map(MathValue::Float)
                        .map_err(|_| domain(format!("could not convert string to float: '{s}'"))),
                    Some(other) => Ok(MathValue::Float(number(name, other)?)),
                }
            }
            Builtin::Str => {
                arity(name, args, 0, 1)?;
                let text = args.first().map(ToString::to_string).unwrap_or_default();
                if text.len() > max_bytes {
                    return Err(SafeMathError::MemoryLimit);
                }
                Ok(MathValue::Str(text))
            }
            Builtin::Bool => {
                arity(name, args, 0, 1)?;
                Ok(MathValue::Bool(args.first().is_some_and(MathValue::truthy)))
            }
            Builtin::Pow => {
                arity(name, args, 2, 2)?;
                binary_op(BinaryOp::Pow, &args[0], &args[1], max_bytes)
            }
            Builtin::Sin | Builtin::Cos | Builtin::Tan | Builtin::Atan | Builtin::Radians
            | Builtin::Degrees | Builtin::Exp => {
                arity(name, args, 1, 1)?;
                let x = number(name, &args[0])?;
                finite(match self {
                    Builtin::Sin => x.sin(),
                    Builtin::Cos => x.cos(),
                    Builtin::Tan => x.tan(),
                    Builtin::Atan => x.atan(),
                    Builtin::Radians => x.to_radians(),
                    Builtin::Degrees => x.to_degrees(),
                    _ => x.exp(),
                })
            }
            Builtin::Asin | Builtin::Acos => {
                arity(name, args, 1, 1)?;
                let x = number(name, &args[0])?;
                if !(-1.0..=1.0).contains(&x) {
                    return Err(domain("math domain error"));
                }
                finite(if self == Builtin::Asin { x.asin() } else { x.acos() })
            }
            Builtin::Atan2 => {
                arity(name, args, 2, 2)?;
                finite(number(name, &args[0])?.atan2(number(name, &args[1])?))
            }
            Builtin::Sqrt => {
                arity(name, args, 1, 1)?;
                let x = number(name, &args[0])?;
                if x < 0.0 {
                    return Err(domain("math domain error"));
                }
                finite(x.sqrt())
            }
            Builtin::Log | Builtin::Log2 | Builtin::Log10 => {
                let max = if self == Builtin::Log { 2 } else { 1 };
                arity(name, args, 1, max)?;
                let x = number(name, &args[0])?;
                if x <= 0.0 {
                    return Err(domain("math domain error"));
                }
                let value = match (self, args.get(1)) {
                    (Builtin::Log2, _) => x.log2(),
                    (Builtin::Log10, _) => x.log10(),
                    (_, None) => x.ln(),
                    (_, Some(base)) => {
                        let base = number(name, base)?;
                        if base <= 0.0 {
                            return Err(domain("math domain error"));
                        }
                        if base == 1.0 {
                            return Err(SafeMathError::DivisionByZero);
                        }
                        x.ln() / base.ln()
                    }
                };
                finite(value)
            }
            Builtin::Hypot => {
                let mut total = 0.0_f64;
                for arg in args {
                    let x = number(name, arg)?;
                    total += x * x;
                }
                finite(total.sqrt())
            }
            Builtin::Gcd => {
                let mut acc = 0;
                for arg in args {
                    acc = gcd(acc, exact_int(name, arg)?);
                }
                Ok(MathValue::Int(acc))
            }
            Builtin::Lcm => {
                let mut acc: i128 = 1;
                for arg in args {
                    let n = exact_int(name, arg)?;
                    if n == 0 {
                        return Ok(MathValue::Int(0));
                    }
                    let step = acc / gcd(acc, n);
                    acc = match step.checked_mul(n.abs()) {
                        Some(value) => value,
                        None => return Err(domain("lcm() result is too large")),
                    };
                }
                Ok(MathValue::Int(acc))
            }
            Builtin::Factorial => {
                arity(name, args, 1, 1)?;
                let n = bounded_int("n", &args[0], MAX_FACTORIAL_N)?;
                if n < 0 {
                    return Err(domain("factorial() not defined for negative values"));
                }
                Ok(falling_product(n, n))
            }
            Builtin::Comb => {
                arity(name, args, 2, 2)?;
                let n = bounded_int("n", &args[0], MAX_COMBINATORICS_N)?;
                let k = bounded_int("k", &args[1], MAX_COMBINATORICS_N)?;
                if n < 0 || k < 0 {
                    return Err(domain("comb() requires non-negative values"));
                }
                Ok(combinations(n, k))
            }
            Builtin::Perm => {
                arity(name, args, 1, 2)?;
                let n = bounded_int("n", &args[0], MAX_COMBINATORICS_N)?;
                let k = match args.get(1) {
                    Some(value) => bounded_int("k", value, MAX_COMBINATORICS_N)?,
                    None => n,
                };
                if n < 0 || k < 0 {
                    return Err(domain("perm() requires non-negative values"));
                }
                if k > n {
                    return Ok(MathValue::Int(0));
                }
                Ok(falling_product(n, k))
            }
            Builtin::Percent => {
                arity(name, args, 2, 2)?;
                finite(number(name, &args[0])? * number(name, &args[1])? / 100.0)
            }
            Builtin::Mean => finite(mean_of(&sequence(name, args, 1)?)),
            Builtin::Median => {
                let mut values = sequence(name, args, 1)?;
                values.sort_by(f64::total_cmp);
                let mid = values.len() / 2;
                finite(if values.len() % 2 == 1 {
                    values[mid]
                } else {
                    (values[mid - 1] + values[mid]) / 2.0
                })
            }
            Builtin::Mode => {
                let values = sequence(name, args, 1)?;
                let mut best = values[0];
                let mut best_count = 0;
                for candidate in &values {
                    let count = values.iter().filter(|v| *v == candidate).count();
                    if count > best_count {
                        best = *candidate;
                        best_count = count;
                    }
                }
                finite(best)
            }
            Builtin::Variance | Builtin::Stdev => {
                let values = sequence(name, args, 2)?;
                let variance = sum_of_squares(&values) / (values.len() - 1) as f64;
                finite(if self == Builtin::Stdev { variance.sqrt() } else { variance })
            }
            Builtin::Pvariance | Builtin::Pstdev => {
                let values = sequence(name, args, 1)?;
                let variance = sum_of_squares(&values) / values.len() as f64;
                finite(if self == Builtin::Pstdev { variance.sqrt() } else { variance })
            }
            Builtin::Floor | Builtin::Ceil => {
                arity(name, args, 1, 1)?;
                match args[0].as_num() {
                    Some(Num::I(i)) => Ok(MathValue::Int(i)),
                    Some(Num::F(f)) => float_to_int(if self == Builtin::Floor { f.floor() } else { f.ceil() }),
                    None => Err(domain(format!(
                        "{name}() needs a number, not '{}'",
                        args[0].type_name()
                    ))),
                }
            }
        }
    }
}
