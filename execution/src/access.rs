//! Access gate run before every user-initiated operation.

use pitchside_types::{GameError, UserRecord};
use std::future::Future;
use tracing::debug;

use crate::state::{unavailable, Ledger};

/// Loads `user_id` and refuses it while a ban is active at `now` (unix seconds).
///
/// A store failure is returned as an error rather than waved through, so an outage can
/// never let a banned user act.
pub async fn admit<L: Ledger>(ledger: &L, user_id: u64, now: u64) -> Result<UserRecord, GameError> {
    let user = ledger
        .get_user(user_id)
        .await
        .map_err(unavailable)?
        .ok_or(GameError::NotFound { user_id })?;
    if user.ban.is_active(now) {
        debug!(user_id, until = ?user.ban.ban_end, "refused banned user");
        return Err(GameError::Banned {
            user_id,
            until: user.ban.ban_end,
        });
    }
    Ok(user)
}

/// Runs `op` only if `user_id` passes [`admit`].
pub async fn guarded<L, T, F, Fut>(ledger: &L, user_id: u64, now: u64, op: F) -> Result<T, GameError>
where
    L: Ledger,
    F: FnOnce(UserRecord) -> Fut,
    Fut: Future<Output = Result<T, GameError>>,
{
    let user = admit(ledger, user_id, now).await?;
    op(user).await
}
