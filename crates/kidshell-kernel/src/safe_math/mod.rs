//! Sandboxed evaluation of child-typed math.
//!
//! Two layers guard every expression:
//!
//! 1. **Text checks** run first and reject empty or oversized input, denylisted
//!    words, statement keywords and a trailing `** <huge int>`.
//! 2. **The interpreter** only knows the allowlisted constants and functions in
//!    [`builtins`] and runs under [`EvaluatorLimits`]: an allocation cap, a
//!    memory cap and a wall-clock deadline of at most one second.
//!
//! Results are post-checked: numbers beyond 10^30 and strings beyond 1000
//! characters are refused.
//!
//! # Example
//!
//! ```
//! use kidshell_kernel::safe_math::{SafeMathEvaluator, Variables};
//! use kidshell_kernel::types::{Number, Scalar};
//!
//! let mut evaluator = SafeMathEvaluator::new();
//! let mut vars = Variables::new();
//! vars.insert("x".to_string(), Number::Int(4));
//! assert_eq!(evaluator.evaluate("x * 2 + 1", &vars), Ok(Scalar::Number(Number::Int(9))));
//! ```

pub mod ast;
pub mod builtins;
mod interp;
pub mod parser;
pub mod value;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use kidshell_types::{format_float, Number, Scalar};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::ast::BinaryOp;
use self::interp::{compile, Budget, Compiled, Inputs};
use self::value::{numeric_op, MathValue, Num};

pub use self::builtins::is_reserved;

/// Longest accepted expression and string result, in characters.
pub const MAX_EXPRESSION_LEN: usize = 1000;
/// Largest magnitude a result may have.
pub const MAX_NUMBER: f64 = 1e30;
const MAX_NUMBER_INT: u128 = 1_000_000_000_000_000_000_000_000_000_000;
/// Largest exponent magnitude allowed by the text check and `safe_math_operation`.
pub const MAX_EXPONENT: i64 = 100;
/// Compiled programs kept before the cache is reset.
pub const CACHE_CAPACITY: usize = 256;

const BLOCKED_TOKENS: &[&str] = &[
    "import", "exec", "eval", "compile", "open", "input", "raw_input", "globals", "locals",
    "vars", "dir", "getattr", "setattr", "delattr", "hasattr",
];

const BLOCKED_CONTROL_FLOW: &[&str] = &["for", "while", "def", "class", "lambda", "if"];

static TRAILING_EXPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\s*([-+]?\d+)\s*$").expect("static pattern compiles"));

/// Everything that can go wrong evaluating an expression.
///
/// Display strings are short and shown to children as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafeMathError {
    #[error("Empty expression")]
    Empty,

    #[error("Expression too long")]
    TooLong,

    #[error("Unsafe pattern: {0}")]
    UnsafePattern(String),

    #[error("Complex control flow not allowed")]
    ControlFlowRejected,

    #[error("Exponent too large")]
    ExponentTooLarge,

    #[error("Execution timeout")]
    Timeout,

    #[error("Memory limit exceeded")]
    MemoryLimit,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Number too large: {0}")]
    NumberTooLarge(String),

    #[error("String too long")]
    StringTooLong,

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid expression: name '{0}' is not defined")]
    UnknownName(String),

    #[error("Math error: {0}")]
    Domain(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Result too large: {0}")]
    ResultTooLarge(String),
}

/// Runtime caps for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorLimits {
    /// Values produced during one run.
    pub max_allocations: u64,
    /// Wall-clock budget; anything above one second is clamped.
    pub max_duration_ms: u64,
    /// Bytes of string and list data alive during one run.
    pub max_memory_bytes: usize,
}

impl EvaluatorLimits {
    pub const MAX_DURATION_MS: u64 = 1000;

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms.min(Self::MAX_DURATION_MS))
    }
}

impl Default for EvaluatorLimits {
    fn default() -> Self {
        Self {
            max_allocations: 10_000,
            max_duration_ms: Self::MAX_DURATION_MS,
            max_memory_bytes: 1 << 20,
        }
    }
}

/// Caller variables, keyed by name. Sorted so cache keys are stable.
pub type Variables = BTreeMap<String, Number>;

type CacheKey = (String, Vec<(String, String)>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// The evaluator. Holds limits and the compiled-program cache.
#[derive(Debug, Default)]
pub struct SafeMathEvaluator {
    limits: EvaluatorLimits,
    cache: HashMap<CacheKey, Arc<Compiled>>,
    stats: CacheStats,
}

impl SafeMathEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EvaluatorLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &EvaluatorLimits {
        &self.limits
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Evaluate `expression` with `variables` layered over the constants.
    #[tracing::instrument(level = "trace", skip(self, variables), fields(expr_len = expression.len()))]
    pub fn evaluate(&mut self, expression: &str, variables: &Variables) -> Result<Scalar, SafeMathError> {
        check_expression(expression)?;

        let key = cache_key(expression, variables);
        let compiled = match self.cache.get(&key) {
            Some(compiled) => {
                self.stats.hits += 1;
                Arc::clone(compiled)
            }
            None => {
                self.stats.misses += 1;
                let expr = parser::parse(expression)?;
                let compiled = Arc::new(compile(&expr, &inputs(variables))?);
                if self.cache.len() >= CACHE_CAPACITY {
                    tracing::debug!("evaluator cache full ({} entries), clearing", self.cache.len());
                    self.cache.clear();
                }
                self.cache.insert(key, Arc::clone(&compiled));
                compiled
            }
        };

        let mut budget = Budget::new(&self.limits);
        let value = compiled.run(&mut budget)?;
        finish(value)
    }
}

/// Text checks, in order: empty, length, denylist, control flow, trailing exponent.
pub fn check_expression(expression: &str) -> Result<(), SafeMathError> {
    if expression.trim().is_empty() {
        return Err(SafeMathError::Empty);
    }
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(SafeMathError::TooLong);
    }

    let lowered = expression.to_lowercase();
    if lowered.contains("__") {
        return Err(SafeMathError::UnsafePattern("__".to_string()));
    }

    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .collect();

    if let Some(token) = BLOCKED_TOKENS.iter().find(|token| words.contains(token)) {
        return Err(SafeMathError::UnsafePattern((*token).to_string()));
    }
    if BLOCKED_CONTROL_FLOW.iter().any(|keyword| words.contains(keyword)) {
        return Err(SafeMathError::ControlFlowRejected);
    }

    if let Some(captures) = TRAILING_EXPONENT.captures(expression) {
        let too_large = captures[1]
            .parse::<i64>()
            .map_or(true, |exponent| exponent.abs() > MAX_EXPONENT);
        if too_large {
            return Err(SafeMathError::ExponentTooLarge);
        }
    }

    Ok(())
}

fn cache_key(expression: &str, variables: &Variables) -> CacheKey {
    let frozen = variables
        .iter()
        .map(|(name, value)| (name.clone(), format!("{value:?}")))
        .collect();
    (expression.to_string(), frozen)
}

/// Constants first, then caller variables on top.
fn inputs(variables: &Variables) -> Inputs {
    let mut inputs: Inputs = builtins::CONSTANTS
        .iter()
        .map(|(name, value)| (name.to_string(), MathValue::Float(*value)))
        .collect();
    for (name, value) in variables {
        inputs.insert(name.clone(), MathValue::from(*value));
    }
    inputs
}

/// Post-checks and conversion into a response scalar.
fn finish(value: MathValue) -> Result<Scalar, SafeMathError> {
    match value {
        MathValue::Int(i) => {
            if i.unsigned_abs() > MAX_NUMBER_INT {
                return Err(SafeMathError::NumberTooLarge(i.to_string()));
            }
            Ok(Scalar::Number(match i64::try_from(i) {
                Ok(small) => Number::Int(small),
                Err(_) => Number::Float(i as f64),
            }))
        }
        MathValue::Float(f) => {
            if f.is_nan() {
                return Err(SafeMathError::Domain("math domain error".to_string()));
            }
            if f.abs() > MAX_NUMBER {
                return Err(SafeMathError::NumberTooLarge(format_float(f)));
            }
            Ok(Scalar::Number(Number::Float(f)))
        }
        MathValue::Bool(b) => Ok(Scalar::Bool(b)),
        MathValue::Str(s) => {
            if s.chars().count() > MAX_EXPRESSION_LEN {
                return Err(SafeMathError::StringTooLong);
            }
            Ok(Scalar::Text(s))
        }
        MathValue::List(_) => Err(SafeMathError::InvalidExpression(
            "the answer must be one value, not a list".to_string(),
        )),
    }
}

/// One-shot evaluation with default limits and a throwaway cache.
pub fn safe_eval(expression: &str, variables: &Variables) -> Result<Scalar, SafeMathError> {
    SafeMathEvaluator::new().evaluate(expression, variables)
}

fn to_num(value: Number) -> Num {
    match value {
        Number::Int(i) => Num::I(i128::from(i)),
        Number::Float(f) => Num::F(f),
    }
}

/// Apply one binary operator (`+ - * / // % **`) directly to two numbers.
pub fn safe_math_operation(x: Number, op: &str, y: Number) -> Result<Number, SafeMathError> {
    let operation =
        BinaryOp::from_symbol(op).ok_or_else(|| SafeMathError::UnknownOperation(op.to_string()))?;

    if matches!(operation, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod) && y.as_f64() == 0.0 {
        return Err(SafeMathError::DivisionByZero);
    }
    if operation == BinaryOp::Pow && y.as_f64().abs() > MAX_EXPONENT as f64 {
        return Err(SafeMathError::ExponentTooLarge);
    }

    let result = match numeric_op(operation, to_num(x), to_num(y))? {
        Num::I(i) => match i64::try_from(i) {
            Ok(small) => Number::Int(small),
            Err(_) => Number::Float(i as f64),
        },
        Num::F(f) => Number::Float(f),
    };

    if !result.is_finite() || result.as_f64().abs() > MAX_NUMBER {
        return Err(SafeMathError::ResultTooLarge(result.to_string()));
    }
    Ok(result)
}
