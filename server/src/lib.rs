use pitchside_execution::{
    access, account, admin, leaderboard, matches, opponent, penalty, AdminPolicy, Ledger,
    Registration,
};
use pitchside_types::{
    FullStats, GameError, GameRules, Locale, MatchReport, MinigameReport, PackTier, RankedEntry,
    UserRecord,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{error, info};

mod api;
pub use api::Api;

mod config;
pub use config::{load_rules, ServerConfig};

mod locale_cache;
pub use locale_cache::LocaleCache;

mod store;
pub use store::{verify_schema, SchemaReport, SqliteLedger};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// The game service: a ledger plus everything a request needs besides it.
///
/// Every user-initiated operation first passes the access gate, so banned or unknown users
/// never reach the game logic.
pub struct Game<L: Ledger> {
    ledger: L,
    rules: GameRules,
    admins: AdminPolicy,
    locales: LocaleCache,
    rng: Mutex<StdRng>,
    pub config: ServerConfig,
}

impl<L: Ledger + 'static> Game<L> {
    pub fn new(ledger: L, rules: GameRules, config: ServerConfig) -> Self {
        let rng = match config.deterministic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ledger,
            admins: AdminPolicy::new(config.admin_ids.iter().copied()),
            locales: LocaleCache::new(config.locale_cache_capacity()),
            rng: Mutex::new(rng),
            rules,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// A per-request generator derived from the service seed.
    fn request_rng(&self) -> StdRng {
        let seed = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen();
        StdRng::seed_from_u64(seed)
    }

    pub async fn register(&self, registration: Registration) -> Result<UserRecord, GameError> {
        let user = account::register(&self.ledger, &self.rules, registration, unix_now()).await?;
        self.locales.insert(user.user_id, user.profile.locale);
        Ok(user)
    }

    pub async fn user(&self, user_id: u64) -> Result<UserRecord, GameError> {
        access::admit(&self.ledger, user_id, unix_now()).await
    }

    pub async fn stats(&self, user_id: u64) -> Result<FullStats, GameError> {
        access::guarded(&self.ledger, user_id, unix_now(), |_| {
            account::get_full_stats(&self.ledger, &self.rules, user_id)
        })
        .await
    }

    pub async fn position(&self, user_id: u64) -> Result<u64, GameError> {
        access::guarded(&self.ledger, user_id, unix_now(), |_| {
            leaderboard::get_position(&self.ledger, &self.rules.coefficients, user_id)
        })
        .await
    }

    /// Previews the opponent a match would currently draw. Nothing is charged.
    pub async fn opponent(&self, user_id: u64) -> Result<RankedEntry, GameError> {
        let mut rng = self.request_rng();
        access::guarded(&self.ledger, user_id, unix_now(), |_| async move {
            opponent::pick_opponent(&self.ledger, &self.rules, user_id, &mut rng).await
        })
        .await
    }

    pub async fn play_match(&self, user_id: u64) -> Result<MatchReport, GameError> {
        let mut rng = self.request_rng();
        access::guarded(&self.ledger, user_id, unix_now(), |_| async move {
            matches::play_match(&self.ledger, &self.rules, user_id, &mut rng).await
        })
        .await
    }

    pub async fn minigame_access(&self, user_id: u64) -> Result<bool, GameError> {
        let user = access::admit(&self.ledger, user_id, unix_now()).await?;
        Ok(penalty::is_eligible(&user, &self.rules))
    }

    pub async fn play_minigame(&self, user_id: u64) -> Result<MinigameReport, GameError> {
        access::admit(&self.ledger, user_id, unix_now()).await?;
        penalty::require_minigame_access(&self.ledger, &self.rules, user_id).await?;
        let mut rng = self.request_rng();
        penalty::play_minigame(&self.ledger, &self.rules, user_id, &mut rng).await
    }

    /// The user's locale, served from the cache when possible.
    pub async fn locale(&self, user_id: u64) -> Result<Locale, GameError> {
        if let Some(locale) = self.locales.get(user_id) {
            return Ok(locale);
        }
        let user = account::get_user_record(&self.ledger, user_id).await?;
        // A concurrent change may have cached a newer locale since the read.
        Ok(self.locales.fill(user_id, user.profile.locale))
    }

    pub async fn change_locale(&self, user_id: u64, locale: Locale) -> Result<(), GameError> {
        access::admit(&self.ledger, user_id, unix_now()).await?;
        // Drop first so a failed write can never leave a stale entry behind.
        self.locales.invalidate(user_id);
        account::change_locale(&self.ledger, user_id, locale).await?;
        self.locales.insert(user_id, locale);
        Ok(())
    }

    pub async fn leaderboard(&self, limit: u64) -> Result<Vec<RankedEntry>, GameError> {
        leaderboard::top(&self.ledger, &self.rules.coefficients, limit).await
    }

    pub async fn grant_packs(
        &self,
        actor_id: u64,
        user_id: u64,
        tier: PackTier,
        count: u64,
        ghost: bool,
    ) -> Result<(), GameError> {
        self.admins
            .grant_packs(&self.ledger, actor_id, user_id, tier, count, ghost)
            .await
    }

    pub async fn set_ban(
        &self,
        actor_id: u64,
        user_id: u64,
        until: Option<u64>,
    ) -> Result<(), GameError> {
        self.admins.set_ban(&self.ledger, actor_id, user_id, until).await
    }

    pub async fn lift_ban(&self, actor_id: u64, user_id: u64) -> Result<(), GameError> {
        self.admins.lift_ban(&self.ledger, actor_id, user_id).await
    }

    pub async fn reset_minigame_attempts(&self, actor_id: u64) -> Result<u64, GameError> {
        self.admins.authorize(actor_id)?;
        admin::reset_minigame_attempts(&self.ledger, &self.rules).await
    }

    /// Spawns the periodic mini-game attempts reset, if an interval is configured.
    pub fn spawn_daily_reset(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.config.minigame_reset_interval()?;
        let game = Arc::clone(self);
        info!(period_secs = period.as_secs(), "mini-game reset scheduled");
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; skip it so a restart does not refill.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = admin::reset_minigame_attempts(&game.ledger, &game.rules).await {
                    error!(%err, "scheduled mini-game reset failed");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchside_execution::{mocks, Memory};
    use std::time::Duration;

    const ADMIN: u64 = 1_000;

    fn game(users: impl IntoIterator<Item = UserRecord>) -> Game<Memory> {
        let config = ServerConfig {
            admin_ids: vec![ADMIN],
            deterministic_seed: Some(7),
            ..ServerConfig::default()
        };
        Game::new(
            Memory::with_users(users),
            GameRules::default().without_waits(),
            config,
        )
    }

    #[tokio::test]
    async fn test_banned_user_cannot_play() {
        let game = game([mocks::funded_user(1, 500, 500), mocks::ranked_user(2, 1)]);
        game.set_ban(ADMIN, 1, None).await.unwrap();
        assert!(matches!(
            game.play_match(1).await,
            Err(GameError::Banned { user_id: 1, .. })
        ));
        assert!(matches!(game.stats(1).await, Err(GameError::Banned { .. })));
        let untouched = game.ledger().snapshot(1).unwrap();
        assert_eq!(untouched.balances.coins, 500);

        game.lift_ban(ADMIN, 1).await.unwrap();
        assert!(game.play_match(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_deterministic_seed_replays() {
        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let game = game([mocks::funded_user(1, 5_000, 5_000), mocks::ranked_user(2, 1)]);
            let mut reports = Vec::new();
            for _ in 0..5 {
                reports.push(game.play_match(1).await.unwrap().result);
            }
            outcomes.push(reports);
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }

    #[tokio::test]
    async fn test_minigame_requires_success() {
        let game = game([mocks::user(1), mocks::ranked_user(2, 10)]);
        assert!(!game.minigame_access(1).await.unwrap());
        assert_eq!(
            game.play_minigame(1).await,
            Err(GameError::NotEligible {
                success: 0,
                required: 100,
            })
        );
        assert!(game.minigame_access(2).await.unwrap());
        let report = game.play_minigame(2).await.unwrap();
        assert_eq!(report.result.attempts_left, 2);

        assert_eq!(
            game.reset_minigame_attempts(2).await,
            Err(GameError::Forbidden { user_id: 2 })
        );
        assert_eq!(game.reset_minigame_attempts(ADMIN).await, Ok(2));
        assert_eq!(game.ledger().snapshot(2).unwrap().minigame_attempts_left, 3);
    }

    #[tokio::test]
    async fn test_locale_cache_follows_changes() {
        let game = game([]);
        game.register(Registration {
            user_id: 1,
            name: "Olena".to_string(),
            language_code: Some("uk".to_string()),
            referrer_id: None,
        })
        .await
        .unwrap();
        assert_eq!(game.locale(1).await, Ok(Locale::UkUa));
        game.change_locale(1, Locale::EnUs).await.unwrap();
        assert_eq!(game.locale(1).await, Ok(Locale::EnUs));
        assert_eq!(game.ledger().snapshot(1).unwrap().profile.locale, Locale::EnUs);

        game.ledger().set_offline(true);
        assert!(game.change_locale(1, Locale::CsCz).await.is_err());
        game.ledger().set_offline(false);
        assert_eq!(game.locale(1).await, Ok(Locale::EnUs));
    }

    #[tokio::test]
    async fn test_locale_read_racing_a_change_keeps_the_new_locale() {
        let mut subject = mocks::user(1);
        subject.profile.locale = Locale::UkUa;
        let game = game([subject]);
        game.ledger().set_yield_after_read(true);

        // The change reads first, the lookup misses and reads the old locale, then the
        // change finishes before the lookup resumes.
        let (changed, read) = tokio::join!(game.change_locale(1, Locale::EnUs), game.locale(1));
        assert_eq!(changed, Ok(()));
        assert_eq!(read, Ok(Locale::EnUs));
        assert_eq!(game.locale(1).await, Ok(Locale::EnUs));
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_reset_runs_on_interval() {
        let mut spent = mocks::user(1);
        spent.minigame_attempts_left = 0;
        let mut game = game([spent]);
        game.config.minigame_reset_interval_secs = Some(60);
        let game = Arc::new(game);
        let handle = game.spawn_daily_reset().unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(game.ledger().snapshot(1).unwrap().minigame_attempts_left, 0);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(game.ledger().snapshot(1).unwrap().minigame_attempts_left, 3);
        handle.abort();
    }
}
