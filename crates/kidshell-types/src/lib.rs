//! Pure data types for kidshell: numbers, quiz records and typed responses.
//!
//! This crate is a leaf dependency with no I/O and no evaluator. It exists so
//! that presentation layers can consume engine output without pulling in the
//! kernel.

pub mod facts;
pub mod number;
pub mod quiz;
pub mod response;

// Flat re-exports for convenience
pub use facts::*;
pub use number::*;
pub use quiz::*;
pub use response::*;
