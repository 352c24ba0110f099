//! Input handlers.
//!
//! Every line a child types is offered to an ordered chain of handlers. The
//! first one that both claims the input (`can_handle`) and does not decline
//! it (`handle`) produces the turn's response.
//!
//! ```text
//! HandlerRegistry::standard()
//! ├── quiz            answers to the active question
//! ├── math_lookup     a bare name bound in the math environment
//! ├── custom_data     parent-supplied word lookups
//! ├── number_tree     facts about 1..=10000
//! ├── loops           start...end[...step[...pause]]
//! ├── symbol_word     short words become symbols
//! ├── symbol_expr     symbol assignment and expressions
//! ├── math            arithmetic, assignment, `8 x 6`
//! ├── emoji           single-word emoji lookup
//! ├── colors          colour names
//! ├── repeated_chars  aaaaaa
//! ├── gibberish       long keyboard mashing
//! ├── emoji_search    emoji for any word in a phrase
//! └── fallback        everything else goes to the evaluator
//! ```

mod colors;
mod custom_data;
mod emoji;
mod fallback;
mod gibberish;
mod loops;
mod math;
mod math_lookup;
mod number_tree;
mod quiz;
mod repeated_chars;
mod symbols;

use thiserror::Error;

use crate::quiz::QuizSource;
use crate::safe_math::{is_reserved, SafeMathError, SafeMathEvaluator};
use crate::session::Session;
use kidshell_types::Response;

pub use colors::{color_named, Colors};
pub use custom_data::CustomData;
pub use emoji::{emoji_for, is_emoji_word, Emoji, EmojiSearch};
pub use fallback::Fallback;
pub use gibberish::Gibberish;
pub use loops::Loops;
pub use math::{normalize_multiplication, Math};
pub use math_lookup::MathLookup;
pub use number_tree::{number_facts, parse_tree_number, NumberTree};
pub use quiz::QuizAnswer;
pub use repeated_chars::RepeatedChars;
pub use symbols::{SymbolExpression, SymbolWord};

/// What a handler made of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Matched(Response),
    /// Not mine after all; try the next handler.
    Declined,
}

/// Failures inside a handler. Converted to responses by the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("No active quiz.")]
    NoActiveQuiz,

    #[error("{0}: not found")]
    NotFound(String),

    #[error(transparent)]
    Math(#[from] SafeMathError),
}

/// Mutable state a handler may touch during one turn.
pub struct Turn<'a> {
    pub session: &'a mut Session,
    pub evaluator: &'a mut SafeMathEvaluator,
    pub quizzes: &'a mut dyn QuizSource,
}

pub trait Handler: Send + Sync {
    /// Short stable name, used in logs and error metadata.
    fn name(&self) -> &'static str;

    /// Cheap syntactic check. Must not mutate anything.
    fn can_handle(&self, input: &str, session: &Session) -> bool;

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError>;
}

/// Ordered list of handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full chain in priority order, evaluator catch-all last.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(QuizAnswer);
        registry.register(MathLookup);
        registry.register(CustomData);
        registry.register(NumberTree);
        registry.register(Loops);
        registry.register(SymbolWord);
        registry.register(SymbolExpression);
        registry.register(Math);
        registry.register(Emoji);
        registry.register(Colors);
        registry.register(RepeatedChars);
        registry.register(Gibberish);
        registry.register(EmojiSearch);
        registry.register(Fallback);
        registry
    }

    /// Append a handler after those already registered.
    pub fn register(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Handler> {
        self.handlers.iter().map(|handler| handler.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|handler| handler.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Reply for input nothing could make sense of.
pub const NOT_UNDERSTOOD: &str = "I don't know that one yet. Try a number, some math like 2 + 3, or a colour!";

/// Text made only of letters. Empty text is not a word.
pub(crate) fn is_alpha_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_alphabetic)
}

/// Collapse runs of whitespace to one space and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `name = value` on a lone `=`, ignoring `==`, `<=`, `>=` and `!=`.
pub(crate) fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let index = bytes.iter().enumerate().position(|(i, &b)| {
        b == b'='
            && !matches!(i.checked_sub(1).map(|p| bytes[p]), Some(b'=' | b'<' | b'>' | b'!'))
            && bytes.get(i + 1) != Some(&b'=')
    })?;
    Some((text[..index].trim(), text[index + 1..].trim()))
}

/// Identifier-shaped words: runs of `[A-Za-z0-9_]` that start with a letter
/// or underscore. Runs starting with a digit, like `2x`, are skipped whole.
pub(crate) fn identifiers(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|word| {
            word.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .collect()
}

/// Identifiers in `expression` that are neither builtins nor numerically bound,
/// first occurrence order, no repeats.
pub(crate) fn undefined_identifiers(expression: &str, session: &Session) -> Vec<String> {
    let env = session.numeric_env();
    let mut undefined: Vec<String> = Vec::new();
    for name in identifiers(expression) {
        if is_reserved(name) || env.contains_key(name) || undefined.iter().any(|u| u == name) {
            continue;
        }
        undefined.push(name.to_string());
    }
    undefined
}

/// Friendly nudge toward giving `name` a value before using it.
pub(crate) fn coaching(name: &str, expression: &str) -> Response {
    Response::text(format!(
        "Let's set a value for {name} first. Try: {name} = 3. Then try: {name} + 2."
    ))
    .with_meta("coaching", true)
    .with_meta("symbol", name)
    .with_meta("expression", expression)
}
