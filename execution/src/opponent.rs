use pitchside_types::{GameError, GameRules, RankedEntry, UserRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::leaderboard::{position_of, window_around};
use crate::state::{unavailable, Ledger};

/// Picks a simulated opponent ranked within `opponent_rank_radius` of `user_id`.
///
/// This reads a point-in-time slice of the leaderboard; concurrent callers may see
/// overlapping candidates, which is fine since opponents never play live.
pub async fn pick_opponent<L: Ledger, R: Rng>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
    rng: &mut R,
) -> Result<RankedEntry, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    pick_opponent_for(ledger, rules, &user, rng).await
}

pub(crate) async fn pick_opponent_for<L: Ledger, R: Rng>(
    ledger: &L,
    rules: &GameRules,
    user: &UserRecord,
    rng: &mut R,
) -> Result<RankedEntry, GameError> {
    let position = position_of(ledger, &rules.coefficients, user).await?;
    let (offset, limit) = window_around(position, rules.opponent_rank_radius);
    let candidates: Vec<RankedEntry> = ledger
        .ranked_window(&rules.coefficients, offset, limit)
        .await
        .map_err(unavailable)?
        .into_iter()
        .filter(|entry| entry.user_id != user.user_id)
        .collect();
    debug!(
        user_id = user.user_id,
        position,
        candidates = candidates.len(),
        "opponent window loaded"
    );
    candidates
        .choose(rng)
        .cloned()
        .ok_or(GameError::NoOpponent { position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ranked_user, seeded_rng, user};
    use crate::state::Memory;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_never_picks_self() {
        let rules = GameRules::default();
        let ledger = Memory::with_users((1..=10).map(|id| ranked_user(id, id)));
        let mut rng = seeded_rng(7);
        for id in 1..=10 {
            for _ in 0..20 {
                let opponent = pick_opponent(&ledger, &rules, id, &mut rng).await.unwrap();
                assert_ne!(opponent.user_id, id);
            }
        }
    }

    #[tokio::test]
    async fn test_candidates_come_from_nearby_ranks() {
        let rules = GameRules::default();
        // user id == victories, so rank = 11 - id
        let ledger = Memory::with_users((1..=10).map(|id| ranked_user(id, id)));
        let mut rng = seeded_rng(1);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_opponent(&ledger, &rules, 5, &mut rng).await.unwrap().user_id);
        }
        // user 5 is at rank 6: window ranks 4..=8 hold ids 7, 6, 4, 3
        assert_eq!(seen, HashSet::from([7, 6, 4, 3]));
    }

    #[tokio::test]
    async fn test_window_clips_at_leader() {
        let rules = GameRules::default();
        let ledger = Memory::with_users((1..=10).map(|id| ranked_user(id, id)));
        let mut rng = seeded_rng(3);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_opponent(&ledger, &rules, 10, &mut rng).await.unwrap().user_id);
        }
        assert_eq!(seen, HashSet::from([9, 8]));
    }

    #[tokio::test]
    async fn test_alone_on_the_board() {
        let rules = GameRules::default();
        let ledger = Memory::with_users([user(1)]);
        let mut rng = seeded_rng(0);
        assert_eq!(
            pick_opponent(&ledger, &rules, 1, &mut rng).await,
            Err(GameError::NoOpponent { position: 1 })
        );
    }

    #[tokio::test]
    async fn test_zero_radius_has_no_candidates() {
        let rules = GameRules {
            opponent_rank_radius: 0,
            ..GameRules::default()
        };
        let ledger = Memory::with_users([ranked_user(1, 1), ranked_user(2, 2)]);
        let mut rng = seeded_rng(0);
        assert!(matches!(
            pick_opponent(&ledger, &rules, 1, &mut rng).await,
            Err(GameError::NoOpponent { .. })
        ));
    }
}
