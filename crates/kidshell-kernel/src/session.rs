//! Per-child session state.
//!
//! A `Session` is everything the engine remembers between turns: the two
//! environments, the active quiz with its attempt counts, progress counters,
//! unlocked achievements, injected custom data and a short activity log.
//! It serializes to a single JSON object and back without loss.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::achievements::Progress;
use crate::safe_math::builtins::{constant, SESSION_CONSTANTS};
use crate::safe_math::Variables;
use kidshell_types::{Number, Quiz, SymbolValue};

/// Name of the running result in the math environment.
pub const LAST_NUMBER: &str = "last_number";

/// Activity entries kept before the oldest is dropped.
pub const MAX_ACTIVITIES: usize = 50;

/// One handled turn, for the parent-facing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: String,
    pub input: String,
    pub result: JsonValue,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Numeric bindings: constants, `last_number` and math-handler assignments.
    pub math_env: BTreeMap<String, Number>,
    /// Names the child has introduced; placeholders until assigned.
    pub symbols_env: BTreeMap<String, SymbolValue>,
    pub current_quiz: Option<Quiz>,
    /// Wrong-or-right submissions per quiz id.
    pub quiz_attempts: BTreeMap<String, u32>,
    pub problems_solved: u32,
    pub current_streak: u32,
    pub achievements: BTreeSet<String>,
    pub custom_data: BTreeMap<String, JsonValue>,
    pub activities: VecDeque<Activity>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let mut math_env: BTreeMap<String, Number> = SESSION_CONSTANTS
            .iter()
            .filter_map(|name| constant(name).map(|value| (name.to_string(), Number::Float(value))))
            .collect();
        math_env.insert(LAST_NUMBER.to_string(), Number::Int(0));

        Self {
            math_env,
            symbols_env: BTreeMap::new(),
            current_quiz: None,
            quiz_attempts: BTreeMap::new(),
            problems_solved: 0,
            current_streak: 0,
            achievements: BTreeSet::new(),
            custom_data: BTreeMap::new(),
            activities: VecDeque::new(),
        }
    }

    /// Rebuild a session from a snapshot produced by [`Session::snapshot`].
    ///
    /// Missing fields take their fresh-session values.
    pub fn from_snapshot(snapshot: JsonValue) -> Result<Self, serde_json::Error> {
        let mut session: Session = serde_json::from_value(snapshot)?;
        session
            .math_env
            .entry(LAST_NUMBER.to_string())
            .or_insert(Number::Int(0));
        while session.activities.len() > MAX_ACTIVITIES {
            session.activities.pop_front();
        }
        Ok(session)
    }

    pub fn snapshot(&self) -> JsonValue {
        // Every field is plain data with string keys.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    pub fn last_number(&self) -> Number {
        self.math_env
            .get(LAST_NUMBER)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_last_number(&mut self, value: Number) {
        self.math_env.insert(LAST_NUMBER.to_string(), value);
    }

    /// Math bindings plus every symbol that holds a number.
    pub fn numeric_env(&self) -> Variables {
        let mut env = self.math_env.clone();
        for (name, value) in &self.symbols_env {
            if let Some(number) = value.as_number() {
                env.insert(name.clone(), number);
            }
        }
        env
    }

    pub fn progress(&self) -> Progress {
        Progress {
            problems_solved: self.problems_solved,
            current_streak: self.current_streak,
        }
    }

    pub fn attempts_for(&self, quiz_id: &str) -> u32 {
        self.quiz_attempts.get(quiz_id).copied().unwrap_or(0)
    }

    pub fn record(&mut self, kind: &str, input: &str, result: impl Serialize, success: bool) {
        if self.activities.len() == MAX_ACTIVITIES {
            self.activities.pop_front();
        }
        self.activities.push_back(Activity {
            kind: kind.to_string(),
            input: input.to_string(),
            result: serde_json::to_value(result).unwrap_or(JsonValue::Null),
            success,
        });
    }
}
