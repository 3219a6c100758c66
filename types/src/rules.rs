use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("{name} range is empty (min={min}, max={max})")]
    EmptyRange {
        name: &'static str,
        min: u64,
        max: u64,
    },
    #[error("defeat_coefficient must be zero or negative (got={0})")]
    PositiveDefeatCoefficient(i64),
    #[error("daily_minigame_attempts must be > 0")]
    NoDailyAttempts,
}

/// Integer weights of the success formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCoefficients {
    pub victory: i64,
    pub defeat: i64,
    pub small_pack: i64,
    pub medium_pack: i64,
    pub big_pack: i64,
    pub referral: i64,
    pub ghost_small_pack: i64,
    pub ghost_medium_pack: i64,
    pub ghost_big_pack: i64,
}

impl Default for ScoreCoefficients {
    fn default() -> Self {
        Self {
            victory: VICTORY_COEFFICIENT,
            defeat: DEFEAT_COEFFICIENT,
            small_pack: SMALL_PACK_COEFFICIENT,
            medium_pack: MEDIUM_PACK_COEFFICIENT,
            big_pack: BIG_PACK_COEFFICIENT,
            referral: REFERRALS_COEFFICIENT,
            ghost_small_pack: GHOST_SMALL_PACKS_COEFFICIENT,
            ghost_medium_pack: GHOST_MEDIUM_PACKS_COEFFICIENT,
            ghost_big_pack: GHOST_BIG_PACKS_COEFFICIENT,
        }
    }
}

/// Gameplay tuning. Every field defaults to the matching constant in [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub coefficients: ScoreCoefficients,
    pub starting_coins: u64,
    pub starting_tickets: u64,
    pub daily_minigame_attempts: u32,
    pub match_cost_coins: u64,
    pub match_cost_tickets: u64,
    pub match_win_coins_reward: u64,
    pub match_win_cups_reward: u64,
    pub match_min_score: u32,
    pub match_max_score: u32,
    pub match_wait_min_ms: u64,
    pub match_wait_max_ms: u64,
    pub opponent_rank_radius: u64,
    pub penalty_min_goals: u32,
    pub penalty_max_goals: u32,
    pub penalty_goal_reward: u64,
    pub penalty_success_requirement: i64,
    pub penalty_wait_min_ms: u64,
    pub penalty_wait_max_ms: u64,
    pub referral_coins_reward: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            coefficients: ScoreCoefficients::default(),
            starting_coins: STARTING_COINS,
            starting_tickets: STARTING_TICKETS,
            daily_minigame_attempts: DAILY_MINIGAME_ATTEMPTS,
            match_cost_coins: MATCH_COST_COINS,
            match_cost_tickets: MATCH_COST_TICKETS,
            match_win_coins_reward: MATCH_WIN_COINS_REWARD,
            match_win_cups_reward: MATCH_WIN_CUPS_REWARD,
            match_min_score: MATCH_MIN_SCORE,
            match_max_score: MATCH_MAX_SCORE,
            match_wait_min_ms: MATCH_WAIT_MIN_MS,
            match_wait_max_ms: MATCH_WAIT_MAX_MS,
            opponent_rank_radius: OPPONENT_RANK_RADIUS,
            penalty_min_goals: PENALTY_MIN_GOALS,
            penalty_max_goals: PENALTY_MAX_GOALS,
            penalty_goal_reward: PENALTY_GOAL_REWARD,
            penalty_success_requirement: PENALTY_SUCCESS_REQUIREMENT,
            penalty_wait_min_ms: PENALTY_WAIT_MIN_MS,
            penalty_wait_max_ms: PENALTY_WAIT_MAX_MS,
            referral_coins_reward: REFERRAL_COINS_REWARD,
        }
    }
}

impl GameRules {
    /// Rules with both pacing delays disabled.
    pub fn without_waits(mut self) -> Self {
        self.match_wait_min_ms = 0;
        self.match_wait_max_ms = 0;
        self.penalty_wait_min_ms = 0;
        self.penalty_wait_max_ms = 0;
        self
    }

    pub fn match_scores(&self) -> RangeInclusive<u32> {
        self.match_min_score..=self.match_max_score
    }

    pub fn match_wait_ms(&self) -> RangeInclusive<u64> {
        self.match_wait_min_ms..=self.match_wait_max_ms
    }

    pub fn penalty_goals(&self) -> RangeInclusive<u32> {
        self.penalty_min_goals..=self.penalty_max_goals
    }

    pub fn penalty_wait_ms(&self) -> RangeInclusive<u64> {
        self.penalty_wait_min_ms..=self.penalty_wait_max_ms
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let ranges = [
            (
                "match score",
                self.match_min_score as u64,
                self.match_max_score as u64,
            ),
            ("match wait", self.match_wait_min_ms, self.match_wait_max_ms),
            (
                "penalty goals",
                self.penalty_min_goals as u64,
                self.penalty_max_goals as u64,
            ),
            (
                "penalty wait",
                self.penalty_wait_min_ms,
                self.penalty_wait_max_ms,
            ),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(RulesError::EmptyRange { name, min, max });
            }
        }
        if self.coefficients.defeat > 0 {
            return Err(RulesError::PositiveDefeatCoefficient(
                self.coefficients.defeat,
            ));
        }
        if self.daily_minigame_attempts == 0 {
            return Err(RulesError::NoDailyAttempts);
        }
        Ok(())
    }
}
