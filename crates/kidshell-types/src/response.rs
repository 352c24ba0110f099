//! Typed engine output.
//!
//! A [`Response`] is a pure value: `{type, content, metadata}` on the wire,
//! with `content` shaped by `type`. Presenters match on [`Content`] and never
//! need to inspect loose JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::facts::NumberFacts;
use crate::number::{Number, Scalar, SymbolValue};
use crate::quiz::Quiz;

/// Closed set of response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    MathResult,
    TreeDisplay,
    Quiz,
    Achievement,
    SymbolResult,
    Emoji,
    Color,
    LoopResult,
    Error,
    Text,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::MathResult => "math_result",
            ResponseType::TreeDisplay => "tree_display",
            ResponseType::Quiz => "quiz",
            ResponseType::Achievement => "achievement",
            ResponseType::SymbolResult => "symbol_result",
            ResponseType::Emoji => "emoji",
            ResponseType::Color => "color",
            ResponseType::LoopResult => "loop_result",
            ResponseType::Error => "error",
            ResponseType::Text => "text",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating an arithmetic expression or looking up a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathResult {
    /// The expression as actually evaluated, after rewrites.
    pub expression: String,
    pub result: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Quiz payloads: a fresh question, a solved one, or a miss with coaching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizContent {
    Prompt(Quiz),
    Correct(QuizSolved),
    Incorrect(QuizMissed),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSolved {
    pub question: String,
    pub answer: i64,
    pub quiz: Quiz,
    pub next_quiz: Quiz,
    pub streak: u32,
    pub total_solved: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizMissed {
    pub user_answer: String,
    pub hint: String,
    pub encouragement: String,
    pub quiz: Quiz,
    pub attempts: u32,
    /// Facts about the child's own answer, when it is a small whole number.
    #[serde(default)]
    pub number_facts: Option<NumberFacts>,
}

/// Display data for one unlocked badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub stars: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementUnlock {
    /// Newly unlocked badge ids, in catalog order.
    pub achievements: Vec<String>,
    pub badges: Vec<Badge>,
    pub total_solved: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SymbolContent {
    Created {
        symbol: String,
        value: SymbolValue,
    },
    Found {
        symbol: String,
        value: SymbolValue,
    },
    Assigned {
        symbol: String,
        value: Number,
    },
    Evaluated {
        expression: String,
        result: Scalar,
        /// Names currently bound in the symbol environment.
        symbols: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiMatch {
    pub word: String,
    pub emojis: Vec<String>,
    /// True when the word matched several table entries by component.
    pub multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub name: String,
    /// Hex colour value, e.g. `#ff0000`.
    pub color: String,
    pub emojis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRun {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    /// Seconds the presenter may wait between numbers; the engine never sleeps.
    pub pause: f64,
    pub numbers: Vec<i64>,
}

/// Type-specific payload, tagged with the response type on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Content {
    MathResult(MathResult),
    TreeDisplay(NumberFacts),
    Quiz(QuizContent),
    Achievement(AchievementUnlock),
    SymbolResult(SymbolContent),
    Emoji(EmojiMatch),
    Color(ColorSwatch),
    LoopResult(LoopRun),
    Error(String),
    Text(JsonValue),
}

impl Content {
    pub fn kind(&self) -> ResponseType {
        match self {
            Content::MathResult(_) => ResponseType::MathResult,
            Content::TreeDisplay(_) => ResponseType::TreeDisplay,
            Content::Quiz(_) => ResponseType::Quiz,
            Content::Achievement(_) => ResponseType::Achievement,
            Content::SymbolResult(_) => ResponseType::SymbolResult,
            Content::Emoji(_) => ResponseType::Emoji,
            Content::Color(_) => ResponseType::Color,
            Content::LoopResult(_) => ResponseType::LoopResult,
            Content::Error(_) => ResponseType::Error,
            Content::Text(_) => ResponseType::Text,
        }
    }
}

/// One engine output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(flatten)]
    pub content: Content,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
}

impl Response {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            metadata: Map::new(),
        }
    }

    pub fn text(value: impl Into<JsonValue>) -> Self {
        Self::new(Content::Text(value.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Content::Error(message.into()))
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> ResponseType {
        self.content.kind()
    }

    pub fn meta(&self, key: &str) -> Option<&JsonValue> {
        self.metadata.get(key)
    }

    /// Plain text body, for `Text` responses holding a string and for errors.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(JsonValue::String(s)) => Some(s),
            Content::Error(s) => Some(s),
            _ => None,
        }
    }
}
