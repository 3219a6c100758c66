//! Registration, referrals, profile statistics and locale changes.

use pitchside_types::{
    constants::MAX_NAME_LENGTH, FullStats, GameError, GameRules, Locale, UserRecord,
};
use tracing::{info, warn};

use crate::leaderboard::position_of;
use crate::score::{compute_success, compute_win_rate, ghost_cost};
use crate::state::{unavailable, Ledger};

/// A first contact from the messaging platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub user_id: u64,
    pub name: String,
    /// Platform language code such as `"uk"`; unknown or missing codes fall back to English.
    pub language_code: Option<String>,
    pub referrer_id: Option<u64>,
}

/// Trims `name` and checks it is between 1 and [`MAX_NAME_LENGTH`] characters.
pub fn normalize_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(GameError::InvalidName {
            len,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Creates the user record and, if a valid referrer is named, pays the referral reward.
///
/// A bad referrer (self, unknown or banned) is logged and ignored. A store failure while
/// crediting the referrer is returned to the caller; the new user stays registered.
pub async fn register<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
    registration: Registration,
    now: u64,
) -> Result<UserRecord, GameError> {
    let Registration {
        user_id,
        name,
        language_code,
        referrer_id,
    } = registration;
    let name = normalize_name(&name)?;
    let locale = Locale::from_language_code(language_code.as_deref());
    let user = UserRecord::new(user_id, name, locale, now, rules);
    if !ledger.insert_user(user.clone()).await.map_err(unavailable)? {
        return Err(GameError::AlreadyRegistered { user_id });
    }
    info!(user_id, %locale, ?referrer_id, "user registered");

    if let Some(referrer_id) = referrer_id {
        match apply_referral(ledger, rules, user_id, referrer_id, now).await {
            Ok(()) => {}
            Err(err) if err.is_expected() => {
                warn!(user_id, referrer_id, %err, "referral ignored");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(user)
}

/// Credits `referrer_id` for bringing in `new_user_id`.
pub async fn apply_referral<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
    new_user_id: u64,
    referrer_id: u64,
    now: u64,
) -> Result<(), GameError> {
    if referrer_id == new_user_id {
        return Err(GameError::SelfReferral);
    }
    let referrer = ledger
        .get_user(referrer_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound {
            user_id: referrer_id,
        })?;
    if referrer.ban.is_active(now) {
        return Err(GameError::Banned {
            user_id: referrer_id,
            until: referrer.ban.ban_end,
        });
    }
    if !ledger
        .credit_referral(referrer_id, rules.referral_coins_reward)
        .await
        .map_err(unavailable)?
    {
        return Err(GameError::NotFound {
            user_id: referrer_id,
        });
    }
    info!(referrer_id, new_user_id, reward = rules.referral_coins_reward, "referral credited");
    Ok(())
}

pub async fn get_user_record<L: Ledger>(ledger: &L, user_id: u64) -> Result<UserRecord, GameError> {
    ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })
}

pub async fn get_full_stats<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
    user_id: u64,
) -> Result<FullStats, GameError> {
    let user = get_user_record(ledger, user_id).await?;
    let position = position_of(ledger, &rules.coefficients, &user).await?;
    Ok(FullStats {
        win_rate: compute_win_rate(user.record.victories, user.record.games_played),
        success: compute_success(&user, &rules.coefficients),
        ghost_success: ghost_cost(&user, &rules.coefficients),
        position,
        draws: user.record.draws(),
        user,
    })
}

pub async fn change_locale<L: Ledger>(
    ledger: &L,
    user_id: u64,
    locale: Locale,
) -> Result<(), GameError> {
    if !ledger.set_locale(user_id, locale).await.map_err(unavailable)? {
        return Err(GameError::NotFound { user_id });
    }
    info!(user_id, %locale, "locale changed");
    Ok(())
}
