//! Scenario harness: drive the engine one line at a time and inspect what
//! came back, including the pending response and the session afterwards.

#![allow(dead_code)]

use kidshell_kernel::types::{Content, Number, Response, ResponseType, Scalar, SymbolContent};
use kidshell_kernel::{KidShellEngine, ScriptedQuizzes, Session};

/// Quizzes handed out in order: 2+3, 4+4, 1+6, 3+3, 2+2, 5+5, then 5+5 again.
pub const QUIZ_PAIRS: &[(i64, i64)] = &[(2, 3), (4, 4), (1, 6), (3, 3), (2, 2), (5, 5)];

pub struct Conversation {
    pub engine: KidShellEngine,
}

/// Everything one line produced.
#[derive(Debug)]
pub struct Exchange {
    pub input: String,
    pub primary: Response,
    pub pending: Option<Response>,
}

impl Exchange {
    pub fn kind(&self) -> ResponseType {
        self.primary.kind()
    }

    pub fn expect_kind(&self, kind: ResponseType) -> &Response {
        assert_eq!(self.primary.kind(), kind, "{:?} → {:?}", self.input, self.primary);
        &self.primary
    }

    /// The numeric result of a `MATH_RESULT` or evaluated `SYMBOL_RESULT`.
    pub fn number(&self) -> Number {
        let result = match &self.primary.content {
            Content::MathResult(math) => &math.result,
            Content::SymbolResult(SymbolContent::Evaluated { result, .. }) => result,
            other => panic!("{:?}: no numeric result in {other:?}", self.input),
        };
        match result {
            Scalar::Number(n) => *n,
            other => panic!("{:?}: result is not a number: {other:?}", self.input),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            engine: KidShellEngine::with_session(session).with_quiz_source(ScriptedQuizzes::additions(QUIZ_PAIRS)),
        }
    }

    /// Send one line and drain the pending slot.
    pub fn say(&mut self, input: &str) -> Exchange {
        let primary = self.engine.process_input(input);
        let pending = self.engine.take_pending_response();
        assert!(
            self.engine.take_pending_response().is_none(),
            "pending slot holds at most one response"
        );
        Exchange {
            input: input.to_string(),
            primary,
            pending,
        }
    }

    /// Send several lines, returning every exchange.
    pub fn script(&mut self, lines: &[&str]) -> Vec<Exchange> {
        lines.iter().map(|line| self.say(line)).collect()
    }

    pub fn session(&self) -> &Session {
        self.engine.session()
    }

    /// Answer of the active quiz, as the child would type it.
    pub fn current_answer(&self) -> String {
        self.session()
            .current_quiz
            .as_ref()
            .map(|quiz| quiz.answer.to_string())
            .expect("a quiz is active")
    }

    /// Start a quiz if needed, then answer it correctly.
    pub fn solve(&mut self) -> Exchange {
        if self.session().current_quiz.is_none() {
            self.say("");
        }
        let answer = self.current_answer();
        self.say(&answer)
    }
}
