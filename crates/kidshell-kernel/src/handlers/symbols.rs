//! Symbols: names a child introduces before (or instead of) giving them values.
//!
//! `symbol_word` turns a short bare word into a placeholder symbol or shows
//! the one already there. `symbol_expr` handles `name = expr` and arithmetic
//! over symbols, coaching the child when a name has no value yet.

use super::{
    coaching, color_named, identifiers, is_alpha_word, is_emoji_word, split_assignment,
    undefined_identifiers, Handler, HandlerError, Outcome, Turn,
};
use crate::safe_math::{is_reserved, SafeMathError};
use crate::session::Session;
use kidshell_types::{Content, Number, Response, Scalar, SymbolContent, SymbolValue};

/// Bare words shorter than this become symbols.
const SYMBOL_WORD_MAX: usize = 4;
/// Longest name accepted on the left of `=` or inside an expression.
const SYMBOL_NAME_MAX: usize = 10;

const OPERATORS: &[char] = &['+', '-', '*', '/'];

fn is_symbol_name(name: &str) -> bool {
    is_alpha_word(name) && name.chars().count() <= SYMBOL_NAME_MAX
}

fn symbol_response(content: SymbolContent) -> Response {
    Response::new(Content::SymbolResult(content))
}

pub struct SymbolWord;

impl Handler for SymbolWord {
    fn name(&self) -> &'static str {
        "symbol_word"
    }

    fn can_handle(&self, input: &str, session: &Session) -> bool {
        is_alpha_word(input)
            && input.chars().count() <= SYMBOL_WORD_MAX
            && !session.math_env.contains_key(input)
            && !is_emoji_word(input)
            && color_named(input).is_none()
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let symbol = input.to_string();
        if let Some(value) = turn.session.symbols_env.get(input).cloned() {
            turn.session.record("symbol_lookup", input, value.to_string(), true);
            return Ok(Outcome::Matched(symbol_response(SymbolContent::Found { symbol, value })));
        }

        let value = SymbolValue::Placeholder(symbol.clone());
        turn.session.symbols_env.insert(symbol.clone(), value.clone());
        turn.session.record("symbol_create", input, &symbol, true);
        Ok(Outcome::Matched(symbol_response(SymbolContent::Created { symbol, value })))
    }
}

pub struct SymbolExpression;

impl SymbolExpression {
    fn assign(&self, input: &str, name: &str, value_expr: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let undefined: Vec<String> = undefined_identifiers(value_expr, turn.session)
            .into_iter()
            .filter(|other| other != name)
            .collect();
        if let Some(first) = undefined.first() {
            return Ok(Outcome::Matched(coaching(first, input)));
        }

        let env = turn.session.numeric_env();
        let value = match turn.evaluator.evaluate(value_expr, &env)? {
            Scalar::Text(_) => {
                return Err(SafeMathError::InvalidExpression("symbols can only hold numbers".to_string()).into())
            }
            scalar => scalar.as_number().map(Number::normalized).unwrap_or_default(),
        };

        turn.session
            .symbols_env
            .insert(name.to_string(), SymbolValue::Number(value));
        turn.session.math_env.insert(name.to_string(), value);
        turn.session.record("symbol_assign", input, format!("{name}={value}"), true);

        Ok(Outcome::Matched(symbol_response(SymbolContent::Assigned {
            symbol: name.to_string(),
            value,
        })))
    }

    fn evaluate(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        if let Some(first) = undefined_identifiers(input, turn.session).first() {
            return Ok(Outcome::Matched(coaching(first, input)));
        }

        let env = turn.session.numeric_env();
        let result = match turn.evaluator.evaluate(input, &env)? {
            Scalar::Number(n) => Scalar::Number(n.normalized()),
            other => other,
        };
        let display = result.as_number().map(|n| {
            turn.session.set_last_number(n);
            format!("{input} = {result}")
        });
        turn.session.record("symbol_expr", input, &result, true);

        Ok(Outcome::Matched(symbol_response(SymbolContent::Evaluated {
            expression: input.to_string(),
            result,
            symbols: turn.session.symbols_env.keys().cloned().collect(),
            display,
        })))
    }
}

impl Handler for SymbolExpression {
    fn name(&self) -> &'static str {
        "symbol_expr"
    }

    fn can_handle(&self, input: &str, session: &Session) -> bool {
        if let Some((name, _)) = split_assignment(input) {
            if is_symbol_name(name) {
                return true;
            }
        }

        if !input.contains(OPERATORS) {
            return false;
        }
        let names: Vec<&str> = identifiers(input)
            .into_iter()
            .filter(|name| !is_reserved(name))
            .collect();
        names.iter().any(|name| session.symbols_env.contains_key(*name))
            || names.iter().any(|name| is_symbol_name(name))
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        match split_assignment(input) {
            Some((name, value_expr)) if is_symbol_name(name) => self.assign(input, name, value_expr, turn),
            _ => self.evaluate(input, turn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ScriptedQuizzes;
    use crate::safe_math::SafeMathEvaluator;
    use rstest::rstest;

    fn run(handler: &dyn Handler, session: &mut Session, input: &str) -> Response {
        let mut evaluator = SafeMathEvaluator::new();
        let mut quizzes = ScriptedQuizzes::new(Vec::new());
        let mut turn = Turn {
            session,
            evaluator: &mut evaluator,
            quizzes: &mut quizzes,
        };
        match handler.handle(input, &mut turn) {
            Ok(Outcome::Matched(response)) => response,
            other => panic!("{input}: unexpected {other:?}"),
        }
    }

    #[rstest]
    #[case("x", true)]
    #[case("foo", true)]
    #[case("quux", true)]
    #[case("abcde", false)]
    #[case("pi", false)]
    #[case("tree", false)]
    #[case("red", false)]
    #[case("x1", false)]
    fn test_symbol_word_claims(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(SymbolWord.can_handle(input, &Session::new()), expected);
    }

    #[rstest]
    #[case("x = 5", true)]
    #[case("apples = 3 * 4", true)]
    #[case("verylongname = 1", false)]
    #[case("x + 2", true)]
    #[case("2 + 3", false)]
    #[case("sqrt(4) + 1", false)]
    #[case("x == 2", false)]
    fn test_symbol_expression_claims(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(SymbolExpression.can_handle(input, &Session::new()), expected);
    }

    #[test]
    fn test_create_then_find() {
        let mut session = Session::new();
        let created = run(&SymbolWord, &mut session, "x");
        assert!(matches!(
            created.content,
            Content::SymbolResult(SymbolContent::Created { ref symbol, .. }) if symbol == "x"
        ));
        let found = run(&SymbolWord, &mut session, "x");
        assert!(matches!(found.content, Content::SymbolResult(SymbolContent::Found { .. })));
    }

    #[test]
    fn test_assignment_binds_both_environments() {
        let mut session = Session::new();
        session.set_last_number(Number::Int(42));
        let response = run(&SymbolExpression, &mut session, "x = 15 / 3");
        assert_eq!(
            response.content,
            Content::SymbolResult(SymbolContent::Assigned {
                symbol: "x".into(),
                value: Number::Int(5),
            })
        );
        assert_eq!(session.symbols_env.get("x"), Some(&SymbolValue::Number(Number::Int(5))));
        assert_eq!(session.math_env.get("x"), Some(&Number::Int(5)));
        assert_eq!(session.last_number(), Number::Int(42));
    }

    #[test]
    fn test_self_reference_is_not_coached() {
        let mut session = Session::new();
        session.math_env.insert("x".into(), Number::Int(2));
        let response = run(&SymbolExpression, &mut session, "x = x + 1");
        assert!(matches!(
            response.content,
            Content::SymbolResult(SymbolContent::Assigned { value: Number::Int(3), .. })
        ));
    }

    #[test]
    fn test_undefined_symbol_is_coached() {
        let mut session = Session::new();
        let response = run(&SymbolExpression, &mut session, "y = z + 1");
        assert_eq!(response.meta("symbol"), Some(&serde_json::json!("z")));
        assert!(session.symbols_env.is_empty());
    }

    #[test]
    fn test_expression_sets_last_number() {
        let mut session = Session::new();
        session
            .symbols_env
            .insert("a".into(), SymbolValue::Number(Number::Int(4)));
        let response = run(&SymbolExpression, &mut session, "a * 2.5");
        let Content::SymbolResult(SymbolContent::Evaluated { result, display, symbols, .. }) = &response.content else {
            panic!("expected evaluated symbol expression");
        };
        assert_eq!(result, &Scalar::Number(Number::Int(10)));
        assert_eq!(display.as_deref(), Some("a * 2.5 = 10"));
        assert_eq!(symbols, &vec!["a".to_string()]);
        assert_eq!(session.last_number(), Number::Int(10));
    }
}
