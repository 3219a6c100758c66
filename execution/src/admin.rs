//! Administrative actions: pack grants, bans and the daily attempts reset.

use pitchside_types::{BanState, GameError, GameRules, PackTier};
use std::collections::HashSet;
use tracing::info;

use crate::state::{unavailable, Ledger};

/// Set of user ids allowed to run admin actions.
#[derive(Clone, Debug, Default)]
pub struct AdminPolicy {
    admin_ids: HashSet<u64>,
}

impl AdminPolicy {
    pub fn new(admin_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            admin_ids: admin_ids.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    pub fn authorize(&self, actor_id: u64) -> Result<(), GameError> {
        if self.is_admin(actor_id) {
            Ok(())
        } else {
            Err(GameError::Forbidden { user_id: actor_id })
        }
    }

    /// Credits `count` packs of `tier` to `user_id`.
    ///
    /// Ghost grants raise the raw count the user sees and the ghost counter by the same
    /// amount, so they leave success unchanged.
    pub async fn grant_packs<L: Ledger>(
        &self,
        ledger: &L,
        actor_id: u64,
        user_id: u64,
        tier: PackTier,
        count: u64,
        ghost: bool,
    ) -> Result<(), GameError> {
        self.authorize(actor_id)?;
        if !ledger
            .grant_packs(user_id, tier, count, ghost)
            .await
            .map_err(unavailable)?
        {
            return Err(GameError::NotFound { user_id });
        }
        info!(actor_id, user_id, %tier, count, ghost, "packs granted");
        Ok(())
    }

    /// Bans `user_id` until `until` (unix seconds), or indefinitely when `None`.
    pub async fn set_ban<L: Ledger>(
        &self,
        ledger: &L,
        actor_id: u64,
        user_id: u64,
        until: Option<u64>,
    ) -> Result<(), GameError> {
        self.authorize(actor_id)?;
        let ban = BanState {
            is_banned: true,
            ban_end: until,
        };
        if !ledger.set_ban(user_id, ban).await.map_err(unavailable)? {
            return Err(GameError::NotFound { user_id });
        }
        info!(actor_id, user_id, ?until, "user banned");
        Ok(())
    }

    pub async fn lift_ban<L: Ledger>(
        &self,
        ledger: &L,
        actor_id: u64,
        user_id: u64,
    ) -> Result<(), GameError> {
        self.authorize(actor_id)?;
        if !ledger
            .set_ban(user_id, BanState::default())
            .await
            .map_err(unavailable)?
        {
            return Err(GameError::NotFound { user_id });
        }
        info!(actor_id, user_id, "ban lifted");
        Ok(())
    }
}

/// Restores every user's mini-game attempts to the daily limit. Returns the users touched.
pub async fn reset_minigame_attempts<L: Ledger>(
    ledger: &L,
    rules: &GameRules,
) -> Result<u64, GameError> {
    let touched = ledger
        .reset_minigame_attempts(rules.daily_minigame_attempts)
        .await
        .map_err(unavailable)?;
    info!(touched, attempts = rules.daily_minigame_attempts, "mini-game attempts reset");
    Ok(touched)
}
