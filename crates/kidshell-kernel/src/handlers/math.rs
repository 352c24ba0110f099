//! math — arithmetic, `name = expr` and the `8 x 6` shorthand.

use super::{
    collapse_whitespace, identifiers, is_alpha_word, split_assignment, Handler, HandlerError, Outcome, Turn,
};
use crate::safe_math::{is_reserved, SafeMathError};
use crate::session::Session;
use kidshell_types::{Content, MathResult, Response, Scalar};

const OPERATORS: &[char] = &['+', '-', '*', '/'];

/// Assignments to names this short are left for the symbol handlers.
const SYMBOL_ASSIGN_MAX: usize = 5;

const MULTIPLY_NOTE: &str =
    "Interpreted 'x' as multiplication here. Tip: x can also be a variable (for example: x = 3).";

fn before_multiply(c: char) -> bool {
    c.is_ascii_digit() || c == ')'
}

fn after_multiply(c: char) -> bool {
    c.is_ascii_digit() || c == '('
}

/// Rewrite `x`/`×` between a number (or `)`) and a number (or `(`) as `*`.
///
/// Returns the rewritten text and whether anything changed.
pub fn normalize_multiplication(text: &str) -> (String, bool) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i], 'x' | '×') {
            let left = out.trim_end().chars().last();
            let right = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
            if left.is_some_and(before_multiply) && right.is_some_and(after_multiply) {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                out.push_str(" * ");
                i += 1;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                changed = true;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    if changed {
        (collapse_whitespace(&out), true)
    } else {
        (text.to_string(), false)
    }
}

/// Operators plus every number after the first; a rough size for the presenter.
fn complexity(expression: &str) -> usize {
    let operators = expression.chars().filter(|c| "+-*/".contains(*c)).count();
    let numbers = expression
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|run| run.chars().any(|c| c.is_ascii_digit()))
        .count();
    operators + numbers.saturating_sub(1)
}

fn has_letters(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

pub struct Math;

impl Handler for Math {
    fn name(&self) -> &'static str {
        "math"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        if input.contains(OPERATORS) || normalize_multiplication(input).1 {
            return true;
        }
        match split_assignment(input) {
            Some(("", _)) | None => false,
            Some((name, _)) => !(is_alpha_word(name) && name.chars().count() <= SYMBOL_ASSIGN_MAX),
        }
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let (mut expression, interpreted_x) = normalize_multiplication(&collapse_whitespace(input));
        if expression.starts_with(OPERATORS) {
            expression = format!("{} {expression}", turn.session.last_number());
        }
        let env = turn.session.math_env.clone();

        if let Some((name, value_expr)) = split_assignment(&expression) {
            if identifiers(name) != [name] || is_reserved(name) {
                return Err(SafeMathError::InvalidExpression(format!("can't assign to '{name}'")).into());
            }
            let value = match turn.evaluator.evaluate(value_expr, &env) {
                Ok(scalar) => scalar,
                Err(err) => return decline_or_fail(input, err),
            };
            let Some(number) = value.as_number() else {
                return Err(SafeMathError::InvalidExpression("only numbers can be stored".to_string()).into());
            };
            turn.session.math_env.insert(name.to_string(), number);
            turn.session.record("math", input, number, true);
            return Ok(Outcome::Matched(math_response(&expression, value, interpreted_x)));
        }

        let result = match turn.evaluator.evaluate(&expression, &env) {
            Ok(Scalar::Number(n)) => Scalar::Number(n.normalized()),
            Ok(other) => other,
            Err(err) => return decline_or_fail(input, err),
        };
        if let Scalar::Number(n) = result {
            turn.session.set_last_number(n);
        }
        turn.session.record("math", input, &result, true);
        Ok(Outcome::Matched(math_response(&expression, result, interpreted_x)))
    }
}

/// Words the evaluator does not know are probably not math; let later
/// handlers try them.
fn decline_or_fail(input: &str, err: SafeMathError) -> Result<Outcome, HandlerError> {
    match err {
        SafeMathError::UnknownName(_) if has_letters(input) => Ok(Outcome::Declined),
        err => Err(err.into()),
    }
}

fn math_response(expression: &str, result: Scalar, interpreted_x: bool) -> Response {
    let display = has_letters(expression).then(|| format!("{expression} = {result}"));
    let content = MathResult {
        expression: expression.to_string(),
        result,
        note: interpreted_x.then(|| MULTIPLY_NOTE.to_string()),
        display,
    };
    Response::new(Content::MathResult(content))
        .with_meta("complexity", complexity(expression))
        .with_meta("has_variables", has_letters(expression))
}
