//! fallback — anything no other handler took goes to the evaluator.

use super::{
    coaching, collapse_whitespace, identifiers, normalize_multiplication, Handler, HandlerError, Outcome, Turn,
    NOT_UNDERSTOOD,
};
use crate::safe_math::SafeMathError;
use crate::session::Session;
use kidshell_types::{Content, MathResult, Response, Scalar};

pub struct Fallback;

impl Handler for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn can_handle(&self, _input: &str, _session: &Session) -> bool {
        true
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let (expression, interpreted_x) = normalize_multiplication(&collapse_whitespace(input));
        let env = turn.session.math_env.clone();

        let result = match turn.evaluator.evaluate(&expression, &env) {
            Ok(Scalar::Number(n)) => Scalar::Number(n.normalized()),
            Ok(other) => other,
            Err(SafeMathError::UnknownName(name)) if identifiers(&name) == [name.as_str()] => {
                return Ok(Outcome::Matched(coaching(&name, input)));
            }
            Err(SafeMathError::InvalidExpression(_)) if !looks_like_math(input) => {
                turn.session.record("fallback", input, NOT_UNDERSTOOD, false);
                return Ok(Outcome::Matched(Response::text(NOT_UNDERSTOOD).with_meta("understood", false)));
            }
            Err(err) => return Err(err.into()),
        };

        if let Scalar::Number(n) = result {
            turn.session.set_last_number(n);
        }
        turn.session.record("fallback", input, &result, true);

        let content = MathResult {
            expression,
            result,
            note: None,
            display: None,
        };
        Ok(Outcome::Matched(
            Response::new(Content::MathResult(content)).with_meta("interpreted_multiply", interpreted_x),
        ))
    }
}

/// Digits, operators or brackets suggest the child meant a calculation.
fn looks_like_math(input: &str) -> bool {
    input
        .chars()
        .any(|c| c.is_ascii_digit() || "+-*/%()<>=".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ScriptedQuizzes;
    use crate::safe_math::SafeMathEvaluator;
    use kidshell_types::{Number, ResponseType};

    fn run(input: &str) -> Result<Outcome, HandlerError> {
        let mut session = Session::new();
        let mut evaluator = SafeMathEvaluator::new();
        let mut quizzes = ScriptedQuizzes::new(Vec::new());
        let mut turn = Turn {
            session: &mut session,
            evaluator: &mut evaluator,
            quizzes: &mut quizzes,
        };
        Fallback.handle(input, &mut turn)
    }

    fn matched(input: &str) -> Response {
        match run(input) {
            Ok(Outcome::Matched(response)) => response,
            other => panic!("{input}: unexpected {other:?}"),
        }
    }

    #[test]
    fn test_evaluates_leftovers() {
        let response = matched("sqrt(16)");
        assert_eq!(
            response.content,
            Content::MathResult(MathResult {
                expression: "sqrt(16)".into(),
                result: Scalar::Number(Number::Int(4)),
                note: None,
                display: None,
            })
        );
        assert!(matches!(
            matched("3 > 2").content,
            Content::MathResult(MathResult { result: Scalar::Bool(true), .. })
        ));
    }

    #[test]
    fn test_unknown_name_is_coached() {
        let response = matched("up");
        assert_eq!(response.meta("symbol"), Some(&serde_json::json!("up")));
    }

    #[test]
    fn test_words_get_a_friendly_reply() {
        let response = matched("hi there");
        assert_eq!(response.kind(), ResponseType::Text);
        assert_eq!(response.as_text(), Some(NOT_UNDERSTOOD));
    }

    #[test]
    fn test_real_errors_propagate() {
        assert!(matches!(run("1 +"), Err(HandlerError::Math(SafeMathError::InvalidExpression(_)))));
        assert!(matches!(run("import os"), Err(HandlerError::Math(SafeMathError::UnsafePattern(_)))));
    }
}
