//! Plain-text rendering of engine responses.
//!
//! Two audiences:
//!
//! - **Interactive** → a child at a terminal: emoji markers and praise
//! - **Plain** → piped output and tests: the same lines without decoration

use std::io::IsTerminal;

use kidshell_kernel::types::{
    AchievementUnlock, Content, LoopRun, MathResult, NumberFacts, QuizContent, Response, SymbolContent,
};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    Interactive,
    Plain,
}

impl OutputContext {
    fn marker(self, emoji: &'static str) -> &'static str {
        match self {
            OutputContext::Interactive => emoji,
            OutputContext::Plain => "",
        }
    }
}

/// Detect the output context based on terminal state.
pub fn detect_context() -> OutputContext {
    if std::io::stdout().is_terminal() {
        OutputContext::Interactive
    } else {
        OutputContext::Plain
    }
}

/// Render one response as one or more lines.
pub fn format_response(response: &Response, context: OutputContext) -> String {
    let lines = match &response.content {
        Content::MathResult(math) => format_math(math, context),
        Content::TreeDisplay(facts) => format_facts(facts),
        Content::Quiz(quiz) => format_quiz(quiz, context),
        Content::Achievement(unlock) => format_achievement(unlock, context),
        Content::SymbolResult(symbol) => vec![format_symbol(symbol)],
        Content::Emoji(found) => vec![found.emojis.join(" ")],
        Content::Color(swatch) => vec![format!("{} {} {}", swatch.name, swatch.color, swatch.emojis.join(" "))
            .trim_end()
            .to_string()],
        Content::LoopResult(run) => vec![format_loop(run)],
        Content::Error(message) => vec![format!("{}{message}", context.marker("🤔 "))],
        Content::Text(value) => vec![format_text(value)],
    };
    lines.join("\n")
}

fn format_math(math: &MathResult, context: OutputContext) -> Vec<String> {
    let mut lines = vec![math
        .display
        .clone()
        .unwrap_or_else(|| format!("{} = {}", math.expression, math.result))];
    if let Some(note) = &math.note {
        lines.push(format!("{}{note}", context.marker("💡 ")));
    }
    lines
}

fn format_facts(facts: &NumberFacts) -> Vec<String> {
    let pairs: Vec<String> = facts.factors.iter().map(|(a, b)| format!("{a} × {b}")).collect();
    let labels: Vec<&str> = facts.properties.iter().map(|p| p.label.as_str()).collect();

    let mut lines = vec![facts.number.to_string()];
    lines.push(format!("├── factors: {}", pairs.join(", ")));
    if !labels.is_empty() {
        lines.push(format!("├── {}", labels.join(", ")));
    }
    let last = facts.operations.len().saturating_sub(1);
    for (i, op) in facts.operations.iter().enumerate() {
        let branch = if i == last { "└──" } else { "├──" };
        lines.push(format!("{branch} {}: {}", op.name, op.value));
    }
    lines
}

fn format_quiz(quiz: &QuizContent, context: OutputContext) -> Vec<String> {
    match quiz {
        QuizContent::Prompt(quiz) => vec![format!("{}{} = ?", context.marker("❓ "), quiz.question)],
        QuizContent::Correct(solved) => vec![
            format!(
                "{}Yes! {} = {} (streak {}, solved {})",
                context.marker("🎉 "),
                solved.question,
                solved.answer,
                solved.streak,
                solved.total_solved
            ),
            format!("{}{} = ?", context.marker("❓ "), solved.next_quiz.question),
        ],
        QuizContent::Incorrect(missed) => {
            let mut lines = vec![format!("{} {}", missed.encouragement, missed.hint)];
            if let Some(facts) = &missed.number_facts {
                lines.extend(format_facts(facts));
            }
            lines.push(format!("{}{} = ?", context.marker("❓ "), missed.quiz.question));
            lines
        }
    }
}

fn format_achievement(unlock: &AchievementUnlock, context: OutputContext) -> Vec<String> {
    unlock
        .badges
        .iter()
        .map(|badge| {
            let stars = match context {
                OutputContext::Interactive => "⭐".repeat(badge.stars as usize),
                OutputContext::Plain => "*".repeat(badge.stars as usize),
            };
            format!("{}{} {stars}: {}", context.marker("🏆 "), badge.name, badge.description)
        })
        .collect()
}

fn format_symbol(symbol: &SymbolContent) -> String {
    match symbol {
        SymbolContent::Created { symbol, .. } => {
            format!("{symbol} is a new symbol. Give it a value: {symbol} = 3")
        }
        SymbolContent::Found { symbol, value } => format!("{symbol} = {value}"),
        SymbolContent::Assigned { symbol, value } => format!("{symbol} = {value}"),
        SymbolContent::Evaluated {
            expression,
            result,
            display,
            ..
        } => display.clone().unwrap_or_else(|| format!("{expression} = {result}")),
    }
}

fn format_loop(run: &LoopRun) -> String {
    let numbers: Vec<String> = run.numbers.iter().map(i64::to_string).collect();
    numbers.join(" ")
}

fn format_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidshell_kernel::types::{Badge, Difficulty, Number, Operation, Quiz, Scalar};

    #[test]
    fn test_math_with_note() {
        let response = Response::new(Content::MathResult(MathResult {
            expression: "8 * 6".into(),
            result: Scalar::Number(Number::Int(48)),
            note: Some("x means times".into()),
            display: None,
        }));
        assert_eq!(format_response(&response, OutputContext::Plain), "8 * 6 = 48\nx means times");
    }

    #[test]
    fn test_quiz_prompt() {
        let quiz = Quiz::arithmetic("q1", Operation::Multiply, 3, 4, Difficulty::default()).expect("quiz");
        let response = Response::new(Content::Quiz(QuizContent::Prompt(quiz)));
        assert_eq!(format_response(&response, OutputContext::Plain), "3 × 4 = ?");
        assert_eq!(format_response(&response, OutputContext::Interactive), "❓ 3 × 4 = ?");
    }

    #[test]
    fn test_achievement_stars() {
        let response = Response::new(Content::Achievement(AchievementUnlock {
            achievements: vec!["streak_5".into()],
            badges: vec![Badge {
                id: "streak_5".into(),
                name: "Hot Streak".into(),
                description: "5 right answers in a row".into(),
                stars: 2,
            }],
            total_solved: 5,
            streak: 5,
        }));
        assert_eq!(
            format_response(&response, OutputContext::Plain),
            "Hot Streak **: 5 right answers in a row"
        );
    }

    #[test]
    fn test_text_and_error() {
        assert_eq!(format_response(&Response::text("7 x a"), OutputContext::Plain), "7 x a");
        assert_eq!(
            format_response(&Response::text(serde_json::json!({"age": 7})), OutputContext::Plain),
            r#"{"age":7}"#
        );
        assert_eq!(
            format_response(&Response::error("Division by zero"), OutputContext::Interactive),
            "🤔 Division by zero"
        );
    }

    #[test]
    fn test_loop_numbers() {
        let response = Response::new(Content::LoopResult(LoopRun {
            start: 3,
            end: 0,
            step: -1,
            pause: 0.0,
            numbers: vec![3, 2, 1, 0],
        }));
        assert_eq!(format_response(&response, OutputContext::Plain), "3 2 1 0");
    }
}
