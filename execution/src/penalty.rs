//! The penalty shoot-out mini-game.
//!
//! Access is gated on success score; each series spends one daily attempt and pays a fixed
//! reward per goal. Spending the attempt and crediting the reward is one conditional ledger
//! update, applied before the pacing pause.

use pitchside_types::{GameError, GameRules, MinigameReport, MinigameResult, UserRecord};
use rand::Rng;
use tracing::{info, warn};

use crate::pacing::{draw_inclusive, draw_wait, pause};
use crate::score::compute_success;
use crate::state::{unavailable, Conditional, Ledger, MinigameSettlement};

/// Whether `user` has reached the success needed to see the mini-game.
pub fn is_eligible(user: &UserRecord, rules: &GameRules) -> bool {
    compute_success(user, &rules.coefficients) >= rules.penalty_success_requirement
}

pub async fn check_minigame_access<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
) -> Result<bool, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    Ok(is_eligible(&user, rules))
}

/// Like [`check_minigame_access`], but turns a locked mini-game into
/// [`GameError::NotEligible`] and hands back the loaded record.
pub async fn require_minigame_access<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
) -> Result<UserRecord, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    let success = compute_success(&user, &rules.coefficients);
    if success < rules.penalty_success_requirement {
        return Err(GameError::NotEligible {
            success,
            required: rules.penalty_success_requirement,
        });
    }
    Ok(user)
}

/// Plays one penalty series.
///
/// Eligibility is the caller's concern (see [`require_minigame_access`]); this only checks
/// the remaining attempts.
pub async fn play_minigame<L: Ledger, R: Rng>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
    rng: &mut R,
) -> Result<MinigameReport, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    if user.minigame_attempts_left == 0 {
        return Err(GameError::NoAttemptsLeft);
    }

    let goals = draw_inclusive(rules.penalty_goals(), rng);
    let reward = u64::from(goals).saturating_mul(rules.penalty_goal_reward);
    let wait = draw_wait(rules.penalty_wait_ms(), rng);

    let after = match ledger
        .settle_minigame(user_id, &MinigameSettlement { reward })
        .await
        .map_err(unavailable)?
    {
        Conditional::Applied(after) => after,
        Conditional::Rejected(_) => {
            warn!(user_id, "penalty series rejected at settlement: attempt spent concurrently");
            return Err(GameError::NoAttemptsLeft);
        }
        Conditional::Missing => return Err(GameError::NotFound { user_id }),
    };
    info!(
        user_id,
        goals,
        reward,
        attempts_left = after.minigame_attempts_left,
        "penalty series settled"
    );

    pause(wait).await;

    Ok(MinigameReport {
        locale: user.profile.locale,
        result: MinigameResult {
            goals,
            reward,
            attempts_left: after.minigame_attempts_left,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ranked_user, seeded_rng, user};
    use crate::state::Memory;

    fn rules() -> GameRules {
        GameRules::default().without_waits()
    }

    #[tokio::test]
    async fn test_no_attempts_left_changes_nothing() {
        let mut subject = user(1);
        subject.minigame_attempts_left = 0;
        let ledger = Memory::with_users([subject]);
        let before = ledger.snapshot(1).unwrap();
        let mut rng = seeded_rng(0);
        assert_eq!(
            play_minigame(&ledger, &rules(), 1, &mut rng).await,
            Err(GameError::NoAttemptsLeft)
        );
        assert_eq!(ledger.snapshot(1).unwrap(), before);
    }

    #[tokio::test]
    async fn test_reward_is_credited_per_goal() {
        let rules = GameRules {
            penalty_min_goals: 2,
            penalty_max_goals: 2,
            penalty_goal_reward: 10,
            ..rules()
        };
        let ledger = Memory::with_users([user(1)]);
        let before = ledger.snapshot(1).unwrap();
        assert_eq!(before.minigame_attempts_left, 3);
        let mut rng = seeded_rng(0);
        let report = play_minigame(&ledger, &rules, 1, &mut rng).await.unwrap();
        assert_eq!(
            report.result,
            MinigameResult {
                goals: 2,
                reward: 20,
                attempts_left: 2,
            }
        );
        let after = ledger.snapshot(1).unwrap();
        assert_eq!(after.balances.coins, before.balances.coins + 20);
        assert_eq!(after.balances.received_coins, before.balances.received_coins + 20);
        assert_eq!(after.minigame_attempts_left, 2);
    }

    #[tokio::test]
    async fn test_goals_within_range() {
        let rules = rules();
        let mut subject = user(1);
        subject.minigame_attempts_left = 200;
        let ledger = Memory::with_users([subject]);
        let mut rng = seeded_rng(3);
        for _ in 0..200 {
            let report = play_minigame(&ledger, &rules, 1, &mut rng).await.unwrap();
            assert!(rules.penalty_goals().contains(&report.result.goals));
            assert_eq!(
                report.result.reward,
                u64::from(report.result.goals) * rules.penalty_goal_reward
            );
        }
        assert_eq!(
            play_minigame(&ledger, &rules, 1, &mut rng).await,
            Err(GameError::NoAttemptsLeft)
        );
    }

    #[tokio::test]
    async fn test_access_threshold() {
        let rules = rules();
        // 10 victories * 10 = 100, exactly the requirement.
        let ledger = Memory::with_users([ranked_user(1, 10), ranked_user(2, 9)]);
        assert!(check_minigame_access(&ledger, &rules, 1).await.unwrap());
        assert!(!check_minigame_access(&ledger, &rules, 2).await.unwrap());
        assert_eq!(require_minigame_access(&ledger, &rules, 1).await.unwrap().user_id, 1);
        assert_eq!(
            require_minigame_access(&ledger, &rules, 2).await,
            Err(GameError::NotEligible {
                success: 90,
                required: 100,
            })
        );
        assert_eq!(
            check_minigame_access(&ledger, &rules, 3).await,
            Err(GameError::NotFound { user_id: 3 })
        );
    }

    #[tokio::test]
    async fn test_double_tap_spends_one_attempt() {
        let rules = rules();
        let mut subject = user(1);
        subject.minigame_attempts_left = 1;
        let ledger = Memory::with_users([subject]);
        let mut rng_a = seeded_rng(1);
        let mut rng_b = seeded_rng(2);
        let (a, b) = tokio::join!(
            play_minigame(&ledger, &rules, 1, &mut rng_a),
            play_minigame(&ledger, &rules, 1, &mut rng_b)
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results.contains(&Err(GameError::NoAttemptsLeft)));
        assert_eq!(ledger.snapshot(1).unwrap().minigame_attempts_left, 0);
    }

    #[tokio::test]
    async fn test_interleaved_double_tap_is_rejected_at_settlement() {
        let rules = rules();
        let mut subject = user(1);
        subject.minigame_attempts_left = 1;
        let ledger = Memory::with_users([subject]);
        ledger.set_yield_after_read(true);
        let mut rng_a = seeded_rng(1);
        let mut rng_b = seeded_rng(2);
        let (a, b) = tokio::join!(
            play_minigame(&ledger, &rules, 1, &mut rng_a),
            play_minigame(&ledger, &rules, 1, &mut rng_b)
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results.contains(&Err(GameError::NoAttemptsLeft)));
        assert_eq!(ledger.rejected_settlements(), 1);
        assert_eq!(ledger.snapshot(1).unwrap().minigame_attempts_left, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let ledger = Memory::with_users([user(1)]);
        ledger.set_offline(true);
        let mut rng = seeded_rng(0);
        assert!(matches!(
            play_minigame(&ledger, &rules(), 1, &mut rng).await,
            Err(GameError::StoreUnavailable(_))
        ));
    }
}
