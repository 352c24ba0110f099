//! number_tree — facts about a small whole number.

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::{Content, FactOperation, Number, NumberFacts, NumberProperty, Response};

pub const MIN_TREE_NUMBER: i64 = 1;
pub const MAX_TREE_NUMBER: i64 = 10_000;

/// Largest n whose factorial is spelled out.
const MAX_SHOWN_FACTORIAL: i64 = 10;

/// Plain digits naming a number in 1..=10000.
pub fn parse_tree_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>()
        .ok()
        .filter(|n| (MIN_TREE_NUMBER..=MAX_TREE_NUMBER).contains(n))
}

fn isqrt(n: i64) -> i64 {
    let mut root = (n as f64).sqrt() as i64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Prime factors with multiplicity.
fn prime_factor_count(mut n: i64) -> usize {
    let mut count = 0;
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            n /= p;
            count += 1;
        }
        p += 1;
    }
    if n > 1 {
        count += 1;
    }
    count
}

pub fn number_facts(n: i64) -> NumberFacts {
    let root = isqrt(n);
    let factors: Vec<(i64, i64)> = (1..=root).filter(|i| n % i == 0).map(|i| (i, n / i)).collect();

    let mut properties = vec![if n % 2 == 0 {
        NumberProperty::new("Even number", "blue")
    } else {
        NumberProperty::new("Odd number", "orange")
    }];
    for (divisor, color) in [(3, "green"), (5, "purple"), (10, "red")] {
        if n % divisor == 0 {
            properties.push(NumberProperty::new(format!("Divisible by {divisor}"), color));
        }
    }
    if n > 1 && factors.len() == 1 {
        properties.push(NumberProperty::new("Prime number", "gold"));
    }
    if prime_factor_count(n) == 2 {
        properties.push(NumberProperty::new("Semiprime", "silver"));
    }
    if root * root == n {
        properties.push(NumberProperty::new(format!("Perfect square ({root}²)"), "cyan"));
    }

    let factorial = if n <= MAX_SHOWN_FACTORIAL {
        (1..=n).product::<i64>().to_string()
    } else {
        "Too large".to_string()
    };
    let operations = [
        ("Square root", format!("{:.2}", (n as f64).sqrt())),
        ("Squared", (n * n).to_string()),
        ("Doubled", (n * 2).to_string()),
        ("Halved", format!("{:.1}", n as f64 / 2.0)),
        ("Factorial", factorial),
    ]
    .into_iter()
    .map(|(name, value)| FactOperation {
        name: name.to_string(),
        value,
    })
    .collect();

    NumberFacts {
        number: n,
        factors,
        properties,
        operations,
    }
}

pub struct NumberTree;

impl Handler for NumberTree {
    fn name(&self) -> &'static str {
        "number_tree"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        parse_tree_number(input).is_some()
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let n = parse_tree_number(input).ok_or_else(|| HandlerError::NotFound(input.to_string()))?;
        let facts = number_facts(n);
        let is_prime = facts.is_prime();

        turn.session.set_last_number(Number::Int(n));
        turn.session.record("number_tree", input, n, true);

        Ok(Outcome::Matched(
            Response::new(Content::TreeDisplay(facts)).with_meta("is_prime", is_prime),
        ))
    }
}
