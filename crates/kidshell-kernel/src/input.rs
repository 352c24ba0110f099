//! Cleaning up raw terminal lines before they reach the engine.

use std::sync::LazyLock;

use regex::Regex;

/// A bare arrow-key escape, as typed or pasted when the line editor misses it.
static ARROW_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\x1b|\^\[)\[([A-D])$").expect("static pattern compiles"));

/// Lowercase, trim and drop leading `>` prompt markers (`"> > 1 + 1"` → `"1 + 1"`).
pub fn normalize_user_input(line: &str) -> String {
    let mut text = line.trim().to_lowercase();
    while let Some(rest) = text.strip_prefix('>') {
        text = rest.trim().to_string();
    }
    text
}

/// What to do with a raw line that may be an arrow-key escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction<'a> {
    /// Use this text.
    Use(&'a str),
    /// Ignore the line (left/right/down arrow, or up with nothing to recall).
    Skip,
}

/// Up-arrow recalls `previous`; the other arrows are skipped; anything else passes.
pub fn resolve_arrow_escape<'a>(line: &'a str, previous: &'a str) -> LineAction<'a> {
    match ARROW_ESCAPE.captures(line).and_then(|caps| caps.get(1)) {
        None => LineAction::Use(line),
        Some(arrow) if arrow.as_str() == "A" && !previous.is_empty() => LineAction::Use(previous),
        Some(_) => LineAction::Skip,
    }
}
