//! Leaderboard positions.
//!
//! Positions are computed on read from the stored counters: the ledger counts users whose
//! [`RankKey`] sorts before the subject's. With a full scan this is O(n) per query, which
//! is fine for a single community's user table and can never disagree with the current
//! score.

use pitchside_types::{constants::MAX_LEADERBOARD_PAGE, GameError, RankedEntry, ScoreCoefficients, UserRecord};
use tracing::debug;

use crate::score::RankKey;
use crate::state::{unavailable, Ledger};

/// 1-based position of `user_id`.
pub async fn get_position<L: Ledger>(
    ledger: &L,
    coefficients: &ScoreCoefficients,
    user_id: u64,
) -> Result<u64, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    position_of(ledger, coefficients, &user).await
}

pub(crate) async fn position_of<L: Ledger>(
    ledger: &L,
    coefficients: &ScoreCoefficients,
    user: &UserRecord,
) -> Result<u64, GameError> {
    let key = RankKey::of(user, coefficients);
    let ahead = ledger
        .count_ranked_before(coefficients, key)
        .await
        .map_err(unavailable)?;
    let position = ahead + 1;
    debug!(user_id = user.user_id, success = key.success, position, "computed position");
    Ok(position)
}

/// Ranks `[max(1, position - radius), position + radius]` as a window query.
/// Returns `(offset, limit)`.
pub fn window_around(position: u64, radius: u64) -> (u64, u64) {
    let first = position.saturating_sub(radius).max(1);
    let last = position.saturating_add(radius);
    (first - 1, last - first + 1)
}

/// The best `limit` users, capped at [`MAX_LEADERBOARD_PAGE`].
pub async fn top<L: Ledger>(
    ledger: &L,
    coefficients: &ScoreCoefficients,
    limit: u64,
) -> Result<Vec<RankedEntry>, GameError> {
    ledger
        .ranked_window(coefficients, 0, limit.min(MAX_LEADERBOARD_PAGE))
        .await
        .map_err(unavailable)
}
