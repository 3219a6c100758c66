//! Success score and win rate.
//!
//! Both are pure projections of a [`UserRecord`]; nothing here touches the ledger.

use pitchside_types::{PackCounts, ScoreCoefficients, UserRecord};
use std::cmp::Ordering;

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn weighted(count: u64, coefficient: i64) -> i128 {
    count as i128 * coefficient as i128
}

fn pack_value(packs: &PackCounts, small: i64, medium: i64, big: i64) -> i128 {
    weighted(packs.small, small)
        .saturating_add(weighted(packs.medium, medium))
        .saturating_add(weighted(packs.big, big))
}

/// Score removed for administratively credited ("ghost") packs.
pub fn ghost_cost(user: &UserRecord, coefficients: &ScoreCoefficients) -> i64 {
    clamp_i64(pack_value(
        &user.ghost_packs,
        coefficients.ghost_small_pack,
        coefficients.ghost_medium_pack,
        coefficients.ghost_big_pack,
    ))
}

/// `skill + resources + bonus - ghost_cost`. May be negative; never clamped to zero.
pub fn compute_success(user: &UserRecord, coefficients: &ScoreCoefficients) -> i64 {
    let skill = weighted(user.record.victories, coefficients.victory)
        .saturating_add(weighted(user.record.defeats, coefficients.defeat));
    let resources = pack_value(
        &user.packs,
        coefficients.small_pack,
        coefficients.medium_pack,
        coefficients.big_pack,
    );
    let bonus = weighted(user.referrals, coefficients.referral);
    let ghost = pack_value(
        &user.ghost_packs,
        coefficients.ghost_small_pack,
        coefficients.ghost_medium_pack,
        coefficients.ghost_big_pack,
    );
    clamp_i64(
        skill
            .saturating_add(resources)
            .saturating_add(bonus)
            .saturating_sub(ghost),
    )
}

/// Percentage of games won; `0.0` when nothing has been played.
pub fn compute_win_rate(victories: u64, games_played: u64) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    100.0 * victories as f64 / games_played as f64
}

/// Leaderboard ordering key. Smaller keys rank higher: success descending, then user id
/// ascending so equal scores still get distinct, stable positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankKey {
    pub success: i64,
    pub user_id: u64,
}

impl RankKey {
    pub fn of(user: &UserRecord, coefficients: &ScoreCoefficients) -> Self {
        Self {
            success: compute_success(user, coefficients),
            user_id: user.user_id,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .success
            .cmp(&self.success)
            .then(self.user_id.cmp(&other.user_id))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
