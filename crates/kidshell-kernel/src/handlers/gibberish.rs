//! gibberish — summarize long keyboard mashing as letter counts.

use std::collections::BTreeMap;

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::Response;

/// Inputs must be longer than this.
const MIN_LEN: usize = 10;

/// `"a: 3, d: 3, s: 3"`, letters in sorted order.
pub fn letter_counts(text: &str) -> String {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        *counts.entry(c).or_default() += 1;
    }
    if counts.is_empty() {
        return text.to_string();
    }
    counts
        .iter()
        .map(|(c, n)| format!("{c}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct Gibberish;

impl Handler for Gibberish {
    fn name(&self) -> &'static str {
        "gibberish"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        input.chars().count() > MIN_LEN && input.chars().any(char::is_alphabetic)
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let summary = letter_counts(input);
        turn.session.record("gibberish", input, &summary, true);
        Ok(Outcome::Matched(
            Response::text(summary).with_meta("kind", "gibberish"),
        ))
    }
}
