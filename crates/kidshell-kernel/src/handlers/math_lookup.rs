//! math_lookup — a bare name bound in the math environment.

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::{Content, MathResult, Response, Scalar};

pub struct MathLookup;

impl Handler for MathLookup {
    fn name(&self) -> &'static str {
        "math_lookup"
    }

    fn can_handle(&self, input: &str, session: &Session) -> bool {
        session.math_env.contains_key(input)
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let value = turn
            .session
            .math_env
            .get(input)
            .copied()
            .ok_or_else(|| HandlerError::NotFound(input.to_string()))?;

        turn.session.record("math_lookup", input, value, true);
        turn.session.set_last_number(value);

        let result = MathResult {
            expression: input.to_string(),
            result: Scalar::Number(value),
            note: None,
            display: Some(format!("{input} = {value}")),
        };
        Ok(Outcome::Matched(
            Response::new(Content::MathResult(result))
                .with_meta("source", "math_env")
                .with_meta("key", input),
        ))
    }
}
