//! Number facts payload shown for small whole numbers.

use serde::{Deserialize, Serialize};

/// A labelled property with the colour the presenter should draw it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberProperty {
    pub label: String,
    pub color: String,
}

impl NumberProperty {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// A derived value such as "Doubled" or "Square root", already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactOperation {
    pub name: String,
    pub value: String,
}

/// Everything the number-facts tree displays for one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFacts {
    pub number: i64,
    /// Factor pairs `(a, b)` with `a <= b` and `a * b == number`.
    pub factors: Vec<(i64, i64)>,
    pub properties: Vec<NumberProperty>,
    pub operations: Vec<FactOperation>,
}

impl NumberFacts {
    pub fn is_prime(&self) -> bool {
        self.factors.len() == 1 && self.factors[0] == (1, self.number) && self.number > 1
    }

    pub fn operation(&self, name: &str) -> Option<&str> {
        self.operations
            .iter()
            .find(|op| op.name == name)
            .map(|op| op.value.as_str())
    }

    pub fn has_property(&self, label: &str) -> bool {
        self.properties.iter().any(|p| p.label == label)
    }
}
