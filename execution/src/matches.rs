//! Simulated matches against a nearby leaderboard opponent.
//!
//! The outcome is two independent uniform draws; the opponent's success is shown to the
//! user but never weights the odds.
//!
//! Order of work: load and pre-check balances, pick the opponent, draw the result, then
//! settle cost and outcome in one conditional ledger update. A failed opponent search
//! therefore costs nothing, and a caller dropped during the pacing pause cannot leave a
//! half-applied match behind.

use pitchside_types::{
    GameError, GameRules, LossReason, MatchOutcome, MatchReport, MatchResult, MatchStart,
    UserRecord,
};
use rand::Rng;
use tracing::{info, warn};

use crate::opponent::pick_opponent_for;
use crate::pacing::{draw_inclusive, draw_wait, pause};
use crate::state::{unavailable, Conditional, Ledger, MatchSettlement};

fn insufficient(user: &UserRecord, rules: &GameRules) -> GameError {
    GameError::InsufficientResources {
        have_coins: user.balances.coins,
        have_tickets: user.balances.tickets,
        need_coins: rules.match_cost_coins,
        need_tickets: rules.match_cost_tickets,
    }
}

/// Draws both sides' goals and the resulting outcome.
pub fn draw_outcome<R: Rng>(rules: &GameRules, rng: &mut R) -> (u32, u32, MatchOutcome) {
    let player_score = draw_inclusive(rules.match_scores(), rng);
    let opponent_score = draw_inclusive(rules.match_scores(), rng);
    let outcome = if player_score > opponent_score {
        MatchOutcome::Win
    } else if player_score < opponent_score {
        let reason = LossReason::ALL[rng.gen_range(0..LossReason::ALL.len())];
        MatchOutcome::Loss { reason }
    } else {
        MatchOutcome::Draw
    };
    (player_score, opponent_score, outcome)
}

/// Ledger changes for one match with the given outcome.
pub fn settlement_for(rules: &GameRules, outcome: &MatchOutcome) -> MatchSettlement {
    let base = MatchSettlement {
        cost_coins: rules.match_cost_coins,
        cost_tickets: rules.match_cost_tickets,
        ..MatchSettlement::default()
    };
    match outcome {
        MatchOutcome::Win => MatchSettlement {
            coins_won: rules.match_win_coins_reward,
            cups_won: rules.match_win_cups_reward,
            victories: 1,
            ..base
        },
        MatchOutcome::Loss { .. } => MatchSettlement { defeats: 1, ..base },
        MatchOutcome::Draw => base,
    }
}

pub async fn play_match<L: Ledger, R: Rng>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
    rng: &mut R,
) -> Result<MatchReport, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    if !user.can_afford(rules.match_cost_coins, rules.match_cost_tickets) {
        warn!(
            user_id,
            coins = user.balances.coins,
            tickets = user.balances.tickets,
            "match rejected: insufficient resources"
        );
        return Err(insufficient(&user, rules));
    }

    let opponent = pick_opponent_for(ledger, rules, &user, rng).await?;
    let (player_score, opponent_score, outcome) = draw_outcome(rules, rng);
    let settlement = settlement_for(rules, &outcome);
    let wait = draw_wait(rules.match_wait_ms(), rng);

    match ledger
        .settle_match(user_id, &settlement)
        .await
        .map_err(unavailable)?
    {
        Conditional::Applied(_) => {}
        Conditional::Rejected(current) => {
            warn!(user_id, "match rejected at settlement: balance spent concurrently");
            return Err(insufficient(&current, rules));
        }
        Conditional::Missing => return Err(GameError::NotFound { user_id }),
    }
    info!(
        user_id,
        opponent_id = opponent.user_id,
        player_score,
        opponent_score,
        ?outcome,
        "match settled"
    );

    pause(wait).await;

    Ok(MatchReport {
        locale: user.profile.locale,
        start: MatchStart {
            opponent_id: opponent.user_id,
            opponent_name: opponent.name,
            opponent_success: opponent.success,
        },
        result: MatchResult {
            outcome,
            player_score,
            opponent_score,
            coins_spent: settlement.cost_coins,
            tickets_spent: settlement.cost_tickets,
            coins_won: settlement.coins_won,
            cups_won: settlement.cups_won,
        },
    })
}
