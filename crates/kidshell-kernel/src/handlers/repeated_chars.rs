//! repeated_chars — `aaaaaa` becomes `6 x a`.

use super::{is_alpha_word, Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::Response;

/// Shorter runs are left to the other handlers.
const MIN_RUN: usize = 6;

pub struct RepeatedChars;

impl Handler for RepeatedChars {
    fn name(&self) -> &'static str {
        "repeated_chars"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        let mut chars = input.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        is_alpha_word(input) && input.chars().count() >= MIN_RUN && chars.all(|c| c == first)
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let first = input
            .chars()
            .next()
            .ok_or_else(|| HandlerError::NotFound(input.to_string()))?;
        let summary = format!("{} x {first}", input.chars().count());
        turn.session.record("repeated_chars", input, &summary, true);
        Ok(Outcome::Matched(
            Response::text(summary).with_meta("kind", "repeated_chars"),
        ))
    }
}
