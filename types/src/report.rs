use serde::{Deserialize, Serialize};

use crate::user::{Locale, UserRecord};

/// A leaderboard row: enough to rank and to show an opponent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub user_id: u64,
    pub name: String,
    pub success: i64,
}

/// Flavour text attached to a lost match. No mechanical effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Offside,
    RefereeDecision,
    Injury,
    Weather,
    OwnGoal,
    MissedPenalty,
}

impl LossReason {
    pub const ALL: [LossReason; 6] = [
        LossReason::Offside,
        LossReason::RefereeDecision,
        LossReason::Injury,
        LossReason::Weather,
        LossReason::OwnGoal,
        LossReason::MissedPenalty,
    ];

    /// Localisation key of the reason text.
    pub fn message_key(&self) -> &'static str {
        match self {
            LossReason::Offside => "messages.loss_reasons.offside",
            LossReason::RefereeDecision => "messages.loss_reasons.referee_decision",
            LossReason::Injury => "messages.loss_reasons.injury",
            LossReason::Weather => "messages.loss_reasons.weather",
            LossReason::OwnGoal => "messages.loss_reasons.own_goal",
            LossReason::MissedPenalty => "messages.loss_reasons.missed_penalty",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Loss { reason: LossReason },
    Draw,
}

impl MatchOutcome {
    pub fn message_key(&self) -> &'static str {
        match self {
            MatchOutcome::Win => "messages.match_win",
            MatchOutcome::Loss { .. } => "messages.match_lose",
            MatchOutcome::Draw => "messages.match_draw",
        }
    }
}

/// Parameters of the "match started" message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStart {
    pub opponent_id: u64,
    pub opponent_name: String,
    pub opponent_success: i64,
}

/// Parameters of the match result message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    pub player_score: u32,
    pub opponent_score: u32,
    pub coins_spent: u64,
    pub tickets_spent: u64,
    pub coins_won: u64,
    pub cups_won: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub locale: Locale,
    pub start: MatchStart,
    pub result: MatchResult,
}

/// Parameters of the penalty series result message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameResult {
    pub goals: u32,
    pub reward: u64,
    pub attempts_left: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameReport {
    pub locale: Locale,
    pub result: MinigameResult,
}

/// Everything the profile screen shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullStats {
    pub user: UserRecord,
    pub win_rate: f64,
    pub success: i64,
    pub ghost_success: i64,
    pub position: u64,
    pub draws: u64,
}
