//! kidshell-kernel: the engine behind kidshell.
//!
//! This crate provides:
//!
//! - **Lexer**: tokenizes child-typed math using logos
//! - **Safe math**: a restricted, budgeted expression evaluator
//! - **Session**: environments, quiz progress, counters and achievements
//! - **Handlers**: the ordered chain that classifies each line of input
//! - **Quiz**: question generation and answer coaching
//! - **Achievements**: badge catalog and unlock detection
//! - **Engine**: the `process_input` facade with its pending-response slot
//! - **Store / Data / Config / Paths**: persistence and setup at the edges

pub mod achievements;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod engine;
pub mod handlers;
pub mod input;
pub mod lexer;
pub mod paths;
pub mod quiz;
pub mod safe_math;
pub mod session;
pub mod store;

pub use config::KidshellConfig;
pub use dispatch::Dispatcher;
pub use engine::KidShellEngine;
pub use handlers::{Handler, HandlerError, HandlerRegistry, Outcome};
pub use quiz::{QuizSource, RandomQuizSource, ScriptedQuizzes};
pub use safe_math::{
    safe_eval, safe_math_operation, EvaluatorLimits, SafeMathError, SafeMathEvaluator,
};
pub use session::Session;
pub use store::{load_persisted_session, save_persisted_session};

// Data types live in the leaf crate; re-exported for embedders.
pub use kidshell_types as types;
