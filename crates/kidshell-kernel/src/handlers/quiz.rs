//! quiz — check an answer to the active question.

use std::sync::LazyLock;

use regex::Regex;

use super::{number_facts, parse_tree_number, Handler, HandlerError, Outcome, Turn};
use crate::quiz::hint_for;
use crate::session::Session;
use kidshell_types::{Content, Difficulty, QuizContent, QuizMissed, QuizSolved, Response};

/// A plain number; loop syntax like `0...10` must not match.
static ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").expect("static pattern compiles"));

const ANSWER_PREFIXES: &[&str] = &["answer:", "ans:"];

pub struct QuizAnswer;

impl QuizAnswer {
    fn submitted(input: &str) -> &str {
        ANSWER_PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .map_or(input, str::trim)
    }
}

impl Handler for QuizAnswer {
    fn name(&self) -> &'static str {
        "quiz"
    }

    fn can_handle(&self, input: &str, session: &Session) -> bool {
        session.current_quiz.is_some()
            && (ANSWER.is_match(input) || ANSWER_PREFIXES.iter().any(|p| input.starts_with(p)))
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let session = &mut *turn.session;
        let quiz = session.current_quiz.clone().ok_or(HandlerError::NoActiveQuiz)?;
        let submitted = Self::submitted(input);

        let attempts = session.quiz_attempts.entry(quiz.id.clone()).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;

        if quiz.is_answered_by(submitted) {
            session.problems_solved += 1;
            session.current_streak += 1;
            session.record("quiz", input, quiz.answer, true);

            let next_quiz = turn.quizzes.next_quiz(Difficulty::for_solved(session.problems_solved));
            session.current_quiz = Some(next_quiz.clone());

            let solved = QuizSolved {
                question: quiz.question.clone(),
                answer: quiz.answer,
                next_quiz,
                streak: session.current_streak,
                total_solved: session.problems_solved,
                quiz: quiz.clone(),
            };
            return Ok(Outcome::Matched(
                Response::new(Content::Quiz(QuizContent::Correct(solved))).with_meta("quiz_id", quiz.id),
            ));
        }

        session.current_streak = 0;
        session.record("quiz", input, format!("Expected: {}", quiz.answer), false);

        let facts = parse_tree_number(submitted).map(number_facts);
        let encouragement = match &facts {
            Some(facts) => format!(
                "Nice thinking with {}! Let's explore it while we keep going.",
                facts.number
            ),
            None => "Nice thinking.".to_string(),
        };

        let missed = QuizMissed {
            user_answer: input.to_string(),
            hint: hint_for(quiz.answer, attempts),
            encouragement,
            attempts,
            number_facts: facts,
            quiz: quiz.clone(),
        };
        Ok(Outcome::Matched(
            Response::new(Content::Quiz(QuizContent::Incorrect(missed))).with_meta("quiz_id", quiz.id),
        ))
    }
}
