//! Pitchside game logic.
//!
//! Everything here is written against the [`Ledger`] trait: score and rank computation,
//! opponent selection, the match and penalty simulators, registration and the admin
//! actions. Storage backends live elsewhere (the server ships a SQLite ledger); tests use
//! the in-memory [`Memory`] ledger behind the `mocks` feature.
//!
//! ## Consistency rules
//! - Every balance or counter change is one atomic conditional ledger call
//!   ([`Ledger::settle_match`], [`Ledger::settle_minigame`], ...). Nothing here does a
//!   separate read-then-write on the same row.
//! - Success is always recomputed from the stored counters; there is no cached score.
//! - Randomness comes from the `Rng` passed in, so seeded runs are reproducible.
//!
//! ## Playing a match
//! ```rust,ignore
//! use pitchside_execution::{matches::play_match, mocks, Memory};
//! use pitchside_types::GameRules;
//!
//! # async fn example() -> Result<(), pitchside_types::GameError> {
//! let ledger = Memory::with_users([mocks::user(1), mocks::ranked_user(2, 3)]);
//! let rules = GameRules::default().without_waits();
//! let mut rng = mocks::seeded_rng(7);
//! let report = play_match(&ledger, &rules, 1, &mut rng).await?;
//! println!("{:?}", report.result.outcome);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod account;
pub mod admin;
pub mod leaderboard;
pub mod matches;
pub mod opponent;
pub mod penalty;
pub mod score;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod pacing;
mod state;

pub use access::{admit, guarded};
pub use account::Registration;
pub use admin::AdminPolicy;
pub use score::RankKey;
pub use state::{Conditional, Ledger, MatchSettlement, MinigameSettlement};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
