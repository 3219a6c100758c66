/// Maximum display name length accepted at registration
pub const MAX_NAME_LENGTH: usize = 32;

/// Coins granted on registration
pub const STARTING_COINS: u64 = 1_000;

/// Entry tickets granted on registration
pub const STARTING_TICKETS: u64 = 100;

/// Penalty series a user may play per day
pub const DAILY_MINIGAME_ATTEMPTS: u32 = 3;

// Success formula coefficients.
pub const VICTORY_COEFFICIENT: i64 = 10;
/// Must be zero or negative: defeats never raise success.
pub const DEFEAT_COEFFICIENT: i64 = -2;
pub const SMALL_PACK_COEFFICIENT: i64 = 5;
pub const MEDIUM_PACK_COEFFICIENT: i64 = 15;
pub const BIG_PACK_COEFFICIENT: i64 = 40;
pub const REFERRALS_COEFFICIENT: i64 = 25;
pub const GHOST_SMALL_PACKS_COEFFICIENT: i64 = 5;
pub const GHOST_MEDIUM_PACKS_COEFFICIENT: i64 = 15;
pub const GHOST_BIG_PACKS_COEFFICIENT: i64 = 40;

/// Match entry fee
pub const MATCH_COST_COINS: u64 = 50;
pub const MATCH_COST_TICKETS: u64 = 10;

/// Match win rewards
pub const MATCH_WIN_COINS_REWARD: u64 = 120;
pub const MATCH_WIN_CUPS_REWARD: u64 = 1;

/// Simulated goals per side in a match (inclusive)
pub const MATCH_MIN_SCORE: u32 = 0;
pub const MATCH_MAX_SCORE: u32 = 5;

/// "Match in progress" pacing delay in milliseconds (inclusive)
pub const MATCH_WAIT_MIN_MS: u64 = 3_000;
pub const MATCH_WAIT_MAX_MS: u64 = 6_000;

/// Ranks on each side of the subject considered for matchmaking
pub const OPPONENT_RANK_RADIUS: u64 = 2;

/// Goals scored in a penalty series (inclusive)
pub const PENALTY_MIN_GOALS: u32 = 0;
pub const PENALTY_MAX_GOALS: u32 = 5;

/// Coins credited per penalty goal
pub const PENALTY_GOAL_REWARD: u64 = 10;

/// Success required before the penalty mini-game is offered
pub const PENALTY_SUCCESS_REQUIREMENT: i64 = 100;

/// Penalty pacing delay in milliseconds (inclusive)
pub const PENALTY_WAIT_MIN_MS: u64 = 2_000;
pub const PENALTY_WAIT_MAX_MS: u64 = 4_000;

/// Coins credited to a referrer for every new user they bring in
pub const REFERRAL_COINS_REWARD: u64 = 40_000;

/// Largest leaderboard page served by `top`
pub const MAX_LEADERBOARD_PAGE: u64 = 100;
