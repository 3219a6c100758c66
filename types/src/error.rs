use thiserror::Error;

/// Every way a game operation can end without its happy-path result.
///
/// All variants except [`GameError::StoreUnavailable`] are ordinary, user-facing outcomes and
/// carry the values their message template needs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("user {user_id} not found")]
    NotFound { user_id: u64 },
    #[error("user {user_id} already registered")]
    AlreadyRegistered { user_id: u64 },
    #[error("invalid name (len={len}, max={max})")]
    InvalidName { len: usize, max: usize },
    #[error("user {user_id} is banned (until={until:?})")]
    Banned { user_id: u64, until: Option<u64> },
    #[error(
        "insufficient resources: have {have_coins} coins/{have_tickets} tickets, need {need_coins}/{need_tickets}"
    )]
    InsufficientResources {
        have_coins: u64,
        have_tickets: u64,
        need_coins: u64,
        need_tickets: u64,
    },
    #[error("no opponent near position {position}")]
    NoOpponent { position: u64 },
    #[error("no mini-game attempts left")]
    NoAttemptsLeft,
    #[error("success {success} below mini-game requirement {required}")]
    NotEligible { success: i64, required: i64 },
    #[error("users cannot refer themselves")]
    SelfReferral,
    #[error("user {user_id} may not perform admin actions")]
    Forbidden { user_id: u64 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl GameError {
    /// Short machine-readable name of the kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::NotFound { .. } => "not_found",
            GameError::AlreadyRegistered { .. } => "already_registered",
            GameError::InvalidName { .. } => "invalid_name",
            GameError::Banned { .. } => "banned",
            GameError::InsufficientResources { .. } => "insufficient_resources",
            GameError::NoOpponent { .. } => "no_opponent",
            GameError::NoAttemptsLeft => "no_attempts_left",
            GameError::NotEligible { .. } => "not_eligible",
            GameError::SelfReferral => "self_referral",
            GameError::Forbidden { .. } => "forbidden",
            GameError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Localisation key of the one message shown for this kind.
    pub fn message_key(&self) -> &'static str {
        match self {
            GameError::NotFound { .. } => "messages.user_not_found",
            GameError::AlreadyRegistered { .. } => "messages.already_registered",
            GameError::InvalidName { .. } => "messages.name_empty",
            GameError::Banned { .. } => "messages.banned",
            GameError::InsufficientResources { .. } => "messages.insufficient_resources",
            GameError::NoOpponent { .. } => "messages.no_opponents",
            GameError::NoAttemptsLeft => "messages.no_attempts_left",
            GameError::NotEligible { .. } => "messages.penalty_locked",
            GameError::SelfReferral => "messages.self_referral",
            GameError::Forbidden { .. } => "messages.forbidden",
            GameError::StoreUnavailable(_) => "messages.internal_error",
        }
    }

    pub fn is_expected(&self) -> bool {
        !matches!(self, GameError::StoreUnavailable(_))
    }
}

impl From<anyhow::Error> for GameError {
    fn from(err: anyhow::Error) -> Self {
        GameError::StoreUnavailable(format!("{err:#}"))
    }
}
