//! Fixtures for tests of code built on [`crate::Ledger`].

use pitchside_types::{GameRules, Locale, MatchRecord, UserRecord};
use rand::{rngs::StdRng, SeedableRng};

/// A fresh user with default starting balances.
pub fn user(user_id: u64) -> UserRecord {
    UserRecord::new(
        user_id,
        format!("player{user_id}"),
        Locale::EnUs,
        1_700_000_000,
        &GameRules::default(),
    )
}

/// A user whose only scoring counter is `victories`.
pub fn ranked_user(user_id: u64, victories: u64) -> UserRecord {
    let mut user = user(user_id);
    user.record = MatchRecord {
        games_played: victories,
        victories,
        defeats: 0,
    };
    user
}

/// A user holding exactly `coins` and `tickets`.
pub fn funded_user(user_id: u64, coins: u64, tickets: u64) -> UserRecord {
    let mut user = user(user_id);
    user.balances.coins = coins;
    user.balances.tickets = tickets;
    user
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
