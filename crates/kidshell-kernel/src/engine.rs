//! The engine: one object a front end feeds lines of text into.
//!
//! `KidShellEngine` owns the session, the evaluator (and its cache), the
//! quiz source and the handler chain.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    KidShellEngine                    │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │  Session   │  │  Dispatcher  │  │  Evaluator   │  │
//! │  │ (envs,quiz,│  │  (handler    │  │ (limits and  │  │
//! │  │  counters) │  │   chain)     │  │  cache)      │  │
//! │  └────────────┘  └──────────────┘  └──────────────┘  │
//! │  ┌────────────────────┐  ┌────────────────────────┐  │
//! │  │  QuizSource        │  │  pending: Option<Resp> │  │
//! │  └────────────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! A turn may produce two responses. When a correct answer unlocks badges
//! the turn returns the `ACHIEVEMENT` response and parks the quiz response
//! in a single pending slot; callers drain it with
//! [`KidShellEngine::take_pending_response`] before sending more input, or
//! use [`KidShellEngine::process_turn`] to get both at once.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::achievements::newly_unlocked;
use crate::config::KidshellConfig;
use crate::dispatch::Dispatcher;
use crate::handlers::{HandlerRegistry, Turn};
use crate::quiz::{QuizSource, RandomQuizSource};
use crate::safe_math::{EvaluatorLimits, SafeMathEvaluator};
use crate::session::Session;
use kidshell_types::{AchievementUnlock, Content, Difficulty, QuizContent, Response};

pub struct KidShellEngine {
    session: Session,
    dispatcher: Dispatcher,
    evaluator: SafeMathEvaluator,
    quizzes: Box<dyn QuizSource>,
    pending: Option<Response>,
}

impl Default for KidShellEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KidShellEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KidShellEngine")
            .field("session", &self.session)
            .field("dispatcher", &self.dispatcher)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl KidShellEngine {
    /// Fresh session, random quizzes, default limits.
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            dispatcher: Dispatcher::new(HandlerRegistry::standard()),
            evaluator: SafeMathEvaluator::new(),
            quizzes: Box::new(RandomQuizSource::new()),
            pending: None,
        }
    }

    /// Evaluator limits from the loaded configuration.
    pub fn from_config(config: &KidshellConfig, session: Session) -> Self {
        Self::with_session(session).with_limits(config.evaluator)
    }

    pub fn with_quiz_source(mut self, source: impl QuizSource + 'static) -> Self {
        self.quizzes = Box::new(source);
        self
    }

    pub fn with_limits(mut self, limits: EvaluatorLimits) -> Self {
        self.evaluator = SafeMathEvaluator::with_limits(limits);
        self
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.dispatcher = Dispatcher::new(registry);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn evaluator(&self) -> &SafeMathEvaluator {
        &self.evaluator
    }

    /// Replace the parent-supplied lookup table.
    pub fn set_custom_data(&mut self, data: BTreeMap<String, JsonValue>) {
        self.session.custom_data = data;
    }

    /// Handle one line of input.
    ///
    /// Empty input asks for a quiz: the active one if there is one, else a
    /// new question.
    #[tracing::instrument(level = "debug", skip(self, input), fields(input_len = input.len()))]
    pub fn process_input(&mut self, input: &str) -> Response {
        if self.pending.take().is_some() {
            tracing::debug!("pending response was not drained; dropping it");
        }

        let input = input.trim();
        if input.is_empty() {
            return self.quiz_prompt();
        }

        let before = self.session.progress();
        let response = {
            let mut turn = Turn {
                session: &mut self.session,
                evaluator: &mut self.evaluator,
                quizzes: self.quizzes.as_mut(),
            };
            self.dispatcher.dispatch(input, &mut turn)
        };
        let after = self.session.progress();

        if after.problems_solved <= before.problems_solved {
            return response;
        }

        let unlocked = newly_unlocked(before, after, &self.session.achievements);
        if unlocked.is_empty() {
            return response;
        }

        let ids: Vec<String> = unlocked.iter().map(|spec| spec.id.to_string()).collect();
        tracing::debug!(achievements = ?ids, "achievements unlocked");
        self.session.achievements.extend(ids.iter().cloned());
        self.pending = Some(response);

        Response::new(Content::Achievement(AchievementUnlock {
            achievements: ids,
            badges: unlocked.iter().map(|spec| spec.badge()).collect(),
            total_solved: after.problems_solved,
            streak: after.current_streak,
        }))
    }

    /// The response parked by the last turn, if any. Empties the slot.
    pub fn take_pending_response(&mut self) -> Option<Response> {
        self.pending.take()
    }

    /// `process_input` followed by the pending response, in order.
    pub fn process_turn(&mut self, input: &str) -> Vec<Response> {
        let mut responses = vec![self.process_input(input)];
        responses.extend(self.take_pending_response());
        responses
    }

    /// Snapshot of every session field.
    pub fn get_session_state(&self) -> JsonValue {
        self.session.snapshot()
    }

    /// Replace the session with one rebuilt from a snapshot.
    ///
    /// On error the current session is left untouched.
    pub fn restore_session_state(&mut self, snapshot: JsonValue) -> Result<(), serde_json::Error> {
        self.session = Session::from_snapshot(snapshot)?;
        self.pending = None;
        Ok(())
    }

    fn quiz_prompt(&mut self) -> Response {
        let quiz = match &self.session.current_quiz {
            Some(quiz) => quiz.clone(),
            None => {
                let quiz = self
                    .quizzes
                    .next_quiz(Difficulty::for_solved(self.session.problems_solved));
                self.session.current_quiz = Some(quiz.clone());
                quiz
            }
        };
        let id = quiz.id.clone();
        Response::new(Content::Quiz(QuizContent::Prompt(quiz))).with_meta("quiz_id", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ScriptedQuizzes;
    use kidshell_types::ResponseType;

    fn engine() -> KidShellEngine {
        KidShellEngine::new().with_quiz_source(ScriptedQuizzes::additions(&[(2, 3), (4, 4), (1, 6)]))
    }

    #[test]
    fn test_empty_input_starts_then_repeats_quiz() {
        let mut engine = engine();
        let first = engine.process_input("");
        assert_eq!(first.kind(), ResponseType::Quiz);
        assert_eq!(first.meta("quiz_id"), Some(&serde_json::json!("q1")));

        let again = engine.process_input("   ");
        assert_eq!(again.meta("quiz_id"), Some(&serde_json::json!("q1")));
    }

    #[test]
    fn test_first_solve_parks_quiz_response() {
        let mut engine = engine();
        engine.process_input("");
        let response = engine.process_input("5");
        let Content::Achievement(unlock) = &response.content else {
            panic!("expected achievement, got {response:?}");
        };
        assert_eq!(unlock.achievements, vec!["first_solve".to_string()]);
        assert_eq!(unlock.total_solved, 1);

        let pending = engine.take_pending_response().expect("quiz response parked");
        assert!(matches!(pending.content, Content::Quiz(QuizContent::Correct(_))));
        assert!(engine.take_pending_response().is_none());
    }

    #[test]
    fn test_process_turn_returns_both() {
        let mut engine = engine();
        engine.process_input("");
        let responses = engine.process_turn("5");
        let kinds: Vec<_> = responses.iter().map(Response::kind).collect();
        assert_eq!(kinds, vec![ResponseType::Achievement, ResponseType::Quiz]);

        // Second solve unlocks nothing new.
        let responses = engine.process_turn("8");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].kind(), ResponseType::Quiz);
    }

    #[test]
    fn test_restore_rejects_bad_snapshot() {
        let mut engine = engine();
        engine.process_input("2 + 2");
        assert!(engine.restore_session_state(serde_json::json!({"problems_solved": "lots"})).is_err());
        assert_eq!(engine.session().last_number(), kidshell_types::Number::Int(4));
    }
}
