//! loops — count from one number to another: `start...end[...step[...pause]]`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::{Content, LoopRun, Response};

static LOOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+)\s*\.\.\.\s*(-?\d+)(?:\s*\.\.\.\s*(-?\d+))?(?:\s*\.\.\.\s*(\d+(?:\.\d+)?))?\s*$")
        .expect("static pattern compiles")
});

/// Most numbers one loop produces.
pub const MAX_LOOP_VALUES: usize = 1000;

pub struct Loops;

fn group_i64(captures: &Captures<'_>, index: usize) -> Option<Result<i64, std::num::ParseIntError>> {
    captures.get(index).map(|m| m.as_str().parse())
}

impl Handler for Loops {
    fn name(&self) -> &'static str {
        "loops"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        LOOP.is_match(input)
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let Some(captures) = LOOP.captures(input) else {
            return Ok(Outcome::Declined);
        };

        let bounds = (
            group_i64(&captures, 1),
            group_i64(&captures, 2),
            group_i64(&captures, 3).unwrap_or(Ok(1)),
        );
        let (Some(Ok(start)), Some(Ok(end)), Ok(step)) = bounds else {
            return Ok(Outcome::Matched(
                Response::error("Those numbers are too big to count.").with_meta("input", input),
            ));
        };
        let pause = captures
            .get(4)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        if step == 0 {
            return Ok(Outcome::Matched(
                Response::error("The step can't be zero.").with_meta("input", input),
            ));
        }
        let Some(size) = step.checked_abs() else {
            return Ok(Outcome::Matched(
                Response::error("That step is too big to count by.").with_meta("input", input),
            ));
        };
        let step = if end >= start { size } else { -size };

        let mut numbers = Vec::new();
        let mut current = start;
        while numbers.len() < MAX_LOOP_VALUES && (if step > 0 { current <= end } else { current >= end }) {
            numbers.push(current);
            match current.checked_add(step) {
                Some(next) => current = next,
                None => break,
            }
        }
        let truncated = numbers.len() == MAX_LOOP_VALUES && numbers.last() != Some(&end);

        turn.session.record("loop", input, numbers.len(), true);

        let run = LoopRun {
            start,
            end,
            step,
            pause,
            numbers,
        };
        Ok(Outcome::Matched(
            Response::new(Content::LoopResult(run)).with_meta("truncated", truncated),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ScriptedQuizzes;
    use crate::safe_math::SafeMathEvaluator;
    use rstest::rstest;

    fn run(input: &str) -> Response {
        let mut session = Session::new();
        let mut evaluator = SafeMathEvaluator::new();
        let mut quizzes = ScriptedQuizzes::new(Vec::new());
        let mut turn = Turn {
            session: &mut session,
            evaluator: &mut evaluator,
            quizzes: &mut quizzes,
        };
        match Loops.handle(input, &mut turn).expect("handled") {
            Outcome::Matched(response) => response,
            Outcome::Declined => panic!("declined {input}"),
        }
    }

    fn numbers(response: &Response) -> Vec<i64> {
        match &response.content {
            Content::LoopResult(run) => run.numbers.clone(),
            other => panic!("expected loop result, got {other:?}"),
        }
    }

    #[rstest]
    #[case("0...4", vec![0, 1, 2, 3, 4])]
    #[case("0...4...2", vec![0, 2, 4])]
    #[case("5...1", vec![5, 4, 3, 2, 1])]
    #[case("10...0...5", vec![10, 5, 0])]
    #[case("-2...2...3", vec![-2, 1])]
    #[case("3...3", vec![3])]
    #[case("5...1...2", vec![5, 3, 1])]
    #[case("1...5...-2", vec![1, 3, 5])]
    #[case("1...1...-3", vec![1])]
    #[case("0...10...9223372036854775807", vec![0])]
    #[case("10...0...-9223372036854775807", vec![10])]
    fn test_counts(#[case] input: &str, #[case] expected: Vec<i64>) {
        assert_eq!(numbers(&run(input)), expected);
    }

    #[test]
    fn test_pause_is_reported_not_slept() {
        let response = run("1...3...1...0.5");
        let Content::LoopResult(run) = &response.content else {
            panic!("expected loop result");
        };
        assert_eq!(run.pause, 0.5);
        assert_eq!(run.numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_step_is_an_error() {
        assert_eq!(run("1...5...0").kind(), kidshell_types::ResponseType::Error);
    }

    #[test]
    fn test_most_negative_step_is_an_error() {
        let response = run("1...5...-9223372036854775808");
        assert_eq!(response.kind(), kidshell_types::ResponseType::Error);
        assert_eq!(response.as_text(), Some("That step is too big to count by."));
    }

    #[test]
    fn test_long_loops_are_capped() {
        let response = run("1...100000");
        assert_eq!(numbers(&response).len(), MAX_LOOP_VALUES);
        assert_eq!(response.meta("truncated"), Some(&serde_json::Value::Bool(true)));
    }

    #[rstest]
    #[case("1..5", false)]
    #[case("a...b", false)]
    #[case("1...2...3...4", true)]
    fn test_syntax(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(Loops.can_handle(input, &Session::new()), expected);
    }
}
