//! Badge catalog and unlock detection.
//!
//! Badges unlock when a counter crosses its threshold. Detection is a pure
//! function of the counters before and after a turn plus the set already
//! unlocked, so re-checking never emits the same badge twice.

use std::collections::BTreeSet;

use kidshell_types::Badge;

/// The counters badges are defined over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub problems_solved: u32,
    pub current_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Solved(u32),
    Streak(u32),
}

impl Rule {
    pub fn holds(self, progress: Progress) -> bool {
        match self {
            Rule::Solved(n) => progress.problems_solved >= n,
            Rule::Streak(n) => progress.current_streak >= n,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub stars: u8,
    pub rule: Rule,
}

impl BadgeSpec {
    pub fn badge(&self) -> Badge {
        Badge {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            stars: self.stars,
        }
    }
}

const fn spec(id: &'static str, name: &'static str, description: &'static str, stars: u8, rule: Rule) -> BadgeSpec {
    BadgeSpec {
        id,
        name,
        description,
        stars,
        rule,
    }
}

pub const CATALOG: &[BadgeSpec] = &[
    spec("first_solve", "First Steps", "Solved your first problem", 1, Rule::Solved(1)),
    spec("first_five", "High Five", "Solved 5 problems", 1, Rule::Solved(5)),
    spec("problem_ten", "Perfect Ten", "Solved 10 problems", 2, Rule::Solved(10)),
    spec("problem_25", "Quarter Master", "Solved 25 problems", 2, Rule::Solved(25)),
    spec("problem_50", "Half Century", "Solved 50 problems", 3, Rule::Solved(50)),
    spec("century", "Century Club", "Solved 100 problems", 3, Rule::Solved(100)),
    spec("streak_3", "On a Roll", "3 right answers in a row", 1, Rule::Streak(3)),
    spec("streak_5", "Hot Streak", "5 right answers in a row", 2, Rule::Streak(5)),
    spec("streak_10", "Unstoppable", "10 right answers in a row", 3, Rule::Streak(10)),
];

pub fn find(id: &str) -> Option<&'static BadgeSpec> {
    CATALOG.iter().find(|spec| spec.id == id)
}

/// Badges whose threshold was crossed between `before` and `after` and that
/// are not already in `unlocked`, in catalog order.
pub fn newly_unlocked(before: Progress, after: Progress, unlocked: &BTreeSet<String>) -> Vec<&'static BadgeSpec> {
    CATALOG
        .iter()
        .filter(|spec| spec.rule.holds(after) && !spec.rule.holds(before))
        .filter(|spec| !unlocked.contains(spec.id))
        .collect()
}
