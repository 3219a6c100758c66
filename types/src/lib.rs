//! Pitchside domain types.
//!
//! Defines the user ledger record, gameplay rules and constants, the report values produced
//! by matches and penalty series, and the error taxonomy shared by the execution layer and
//! the server.

pub mod constants;
mod error;
mod report;
mod rules;
mod user;

pub use error::GameError;
pub use report::*;
pub use rules::{GameRules, RulesError, ScoreCoefficients};
pub use user::*;

#[cfg(test)]
mod tests;
