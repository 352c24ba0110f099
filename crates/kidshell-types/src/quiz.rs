//! Quiz records as stored in the session and carried in responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Arithmetic operation a quiz question exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    /// Symbol shown in the question text.
    pub fn display_symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "×",
            Operation::Divide => "÷",
        }
    }

    /// Exact result for whole-number operands; `None` on overflow or inexact division.
    pub fn apply(self, left: i64, right: i64) -> Option<i64> {
        match self {
            Operation::Add => left.checked_add(right),
            Operation::Subtract => left.checked_sub(right),
            Operation::Multiply => left.checked_mul(right),
            Operation::Divide => {
                if right == 0 || left % right != 0 {
                    None
                } else {
                    Some(left / right)
                }
            }
        }
    }
}

/// Quiz difficulty level, always within `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(4);

    /// Solved-problem thresholds at which the next level starts.
    pub const THRESHOLDS: [u32; 3] = [5, 15, 30];

    /// Clamp an arbitrary level into range.
    pub fn new(level: u8) -> Self {
        Difficulty(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Level earned by a running total of solved problems.
    pub fn for_solved(problems_solved: u32) -> Self {
        let passed = Self::THRESHOLDS
            .iter()
            .filter(|&&threshold| problems_solved >= threshold)
            .count();
        Difficulty(1 + passed as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Difficulty(value))
        } else {
            Err(format!("difficulty must be between 1 and 4, got {value}"))
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_kind() -> String {
    "math".to_string()
}

/// One generated arithmetic question plus its expected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique per generation.
    pub id: String,
    pub question: String,
    pub answer: i64,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub operation: Operation,
    pub operands: [i64; 2],
}

impl Quiz {
    /// Build a quiz from its operands, computing question text and answer.
    ///
    /// Returns `None` when the operation has no exact whole-number result.
    pub fn arithmetic(
        id: impl Into<String>,
        operation: Operation,
        left: i64,
        right: i64,
        difficulty: Difficulty,
    ) -> Option<Self> {
        let answer = operation.apply(left, right)?;
        Some(Self {
            id: id.into(),
            question: format!("{left} {} {right}", operation.display_symbol()),
            answer,
            difficulty,
            kind: default_kind(),
            operation,
            operands: [left, right],
        })
    }

    /// The answer exactly as a child must type it.
    pub fn answer_text(&self) -> String {
        self.answer.to_string()
    }

    /// Exact string comparison; `"5.0"` does not answer `5`.
    pub fn is_answered_by(&self, submitted: &str) -> bool {
        submitted == self.answer_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(Difficulty::for_solved(0).level(), 1);
        assert_eq!(Difficulty::for_solved(4).level(), 1);
        assert_eq!(Difficulty::for_solved(5).level(), 2);
        assert_eq!(Difficulty::for_solved(14).level(), 2);
        assert_eq!(Difficulty::for_solved(15).level(), 3);
        assert_eq!(Difficulty::for_solved(30).level(), 4);
        assert_eq!(Difficulty::for_solved(500).level(), 4);
    }

    #[test]
    fn test_arithmetic_quiz() {
        let quiz = Quiz::arithmetic("q1", Operation::Divide, 12, 3, Difficulty::new(3))
            .expect("exact division");
        assert_eq!(quiz.question, "12 ÷ 3");
        assert_eq!(quiz.answer, 4);
        assert!(quiz.is_answered_by("4"));
        assert!(!quiz.is_answered_by("4.0"));
        assert!(Quiz::arithmetic("q2", Operation::Divide, 7, 2, Difficulty::MIN).is_none());
    }

    #[test]
    fn test_quiz_json_uses_type_and_symbols() {
        let quiz = Quiz::arithmetic("q1", Operation::Add, 2, 3, Difficulty::MIN).expect("quiz");
        let json = serde_json::to_value(&quiz).expect("ser");
        assert_eq!(json["type"], "math");
        assert_eq!(json["operation"], "+");
        assert_eq!(json["difficulty"], 1);
        let back: Quiz = serde_json::from_value(json).expect("de");
        assert_eq!(back, quiz);
    }

    #[test]
    fn test_difficulty_rejects_out_of_range() {
        assert!(serde_json::from_str::<Difficulty>("0").is_err());
        assert!(serde_json::from_str::<Difficulty>("5").is_err());
    }
}
