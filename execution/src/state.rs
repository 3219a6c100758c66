use anyhow::Result;
use pitchside_types::{BanState, GameError, Locale, PackTier, RankedEntry, ScoreCoefficients, UserRecord};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use anyhow::bail;
#[cfg(any(test, feature = "mocks"))]
use std::collections::BTreeMap;
#[cfg(any(test, feature = "mocks"))]
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(any(test, feature = "mocks"))]
use std::sync::Mutex;

use crate::score::RankKey;

/// Counter changes produced by one simulated match, cost included.
///
/// Every match adds one game played; at most one of `victories`/`defeats` is set.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MatchSettlement {
    pub cost_coins: u64,
    pub cost_tickets: u64,
    pub coins_won: u64,
    pub cups_won: u64,
    pub victories: u64,
    pub defeats: u64,
}

impl MatchSettlement {
    /// Applies the settlement if the user can pay; returns `false` and leaves the record
    /// untouched otherwise.
    pub fn apply(&self, user: &mut UserRecord) -> bool {
        if !user.can_afford(self.cost_coins, self.cost_tickets) {
            return false;
        }
        let balances = &mut user.balances;
        balances.coins = balances.coins - self.cost_coins + self.coins_won;
        balances.tickets -= self.cost_tickets;
        balances.cups += self.cups_won;
        let record = &mut user.record;
        record.victories += self.victories;
        record.defeats += self.defeats;
        record.games_played += 1;
        true
    }
}

/// Changes produced by one penalty series: one attempt spent, `reward` coins earned.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MinigameSettlement {
    pub reward: u64,
}

impl MinigameSettlement {
    pub fn apply(&self, user: &mut UserRecord) -> bool {
        if user.minigame_attempts_left == 0 {
            return false;
        }
        user.minigame_attempts_left -= 1;
        user.balances.coins += self.reward;
        user.balances.received_coins += self.reward;
        true
    }
}

/// Result of a conditional read-modify-write against one user row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conditional {
    /// Condition held; carries the record after the update.
    Applied(UserRecord),
    /// Condition failed; carries the unchanged record.
    Rejected(UserRecord),
    Missing,
}

/// Durable per-user storage.
///
/// Every mutating method is a single atomic read-modify-write on one row: concurrent calls
/// for the same user are serialized by the implementation and never lose an update.
/// Ranking methods order users by [`RankKey`] (success descending, then user id ascending)
/// with success computed from `coefficients`.
pub trait Ledger: Send + Sync {
    fn get_user(&self, user_id: u64) -> impl Future<Output = Result<Option<UserRecord>>> + Send;

    /// Inserts a new record; returns `false` without writing if the id exists.
    fn insert_user(&self, user: UserRecord) -> impl Future<Output = Result<bool>> + Send;

    /// Number of users ranked strictly before `key`.
    fn count_ranked_before(
        &self,
        coefficients: &ScoreCoefficients,
        key: RankKey,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Users at ranks `offset + 1 ..= offset + limit`, best first.
    fn ranked_window(
        &self,
        coefficients: &ScoreCoefficients,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<RankedEntry>>> + Send;

    /// Debits the match cost and applies the outcome, only if the user can pay.
    fn settle_match(
        &self,
        user_id: u64,
        settlement: &MatchSettlement,
    ) -> impl Future<Output = Result<Conditional>> + Send;

    /// Spends one attempt and credits the reward, only if an attempt is left.
    fn settle_minigame(
        &self,
        user_id: u64,
        settlement: &MinigameSettlement,
    ) -> impl Future<Output = Result<Conditional>> + Send;

    /// Credits a referral: coins, received coins and the referral counter.
    fn credit_referral(
        &self,
        referrer_id: u64,
        coins: u64,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn set_locale(&self, user_id: u64, locale: Locale) -> impl Future<Output = Result<bool>> + Send;

    /// Adds packs of one tier; ghost grants also raise the matching ghost counter.
    fn grant_packs(
        &self,
        user_id: u64,
        tier: PackTier,
        count: u64,
        ghost: bool,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn set_ban(&self, user_id: u64, ban: BanState) -> impl Future<Output = Result<bool>> + Send;

    /// Sets every user's remaining attempts to `attempts`; returns the number of rows touched.
    fn reset_minigame_attempts(&self, attempts: u32) -> impl Future<Output = Result<u64>> + Send;
}

/// Logs a ledger failure and turns it into the user-facing error kind.
pub(crate) fn unavailable(err: anyhow::Error) -> GameError {
    tracing::error!(?err, "ledger operation failed");
    GameError::from(err)
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    users: Mutex<BTreeMap<u64, UserRecord>>,
    offline: AtomicBool,
    referrals_failing: AtomicBool,
    yield_after_read: AtomicBool,
    rejected_settlements: AtomicU64,
}

#[cfg(any(test, feature = "mocks"))]
impl Memory {
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let memory = Self::default();
        memory
            .users
            .lock()
            .unwrap()
            .extend(users.into_iter().map(|user| (user.user_id, user)));
        memory
    }

    /// Makes every subsequent call fail, as if the backing store went away.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes only [`Ledger::credit_referral`] fail.
    pub fn set_referrals_failing(&self, failing: bool) {
        self.referrals_failing.store(failing, Ordering::SeqCst);
    }

    /// Yields to the scheduler after every [`Ledger::get_user`] read, so concurrent callers
    /// interleave between their reads and their writes.
    pub fn set_yield_after_read(&self, enabled: bool) {
        self.yield_after_read.store(enabled, Ordering::SeqCst);
    }

    /// Conditional settlements whose condition failed at write time.
    pub fn rejected_settlements(&self) -> u64 {
        self.rejected_settlements.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, user_id: u64) -> Option<UserRecord> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    fn with_users_mut<T>(&self, f: impl FnOnce(&mut BTreeMap<u64, UserRecord>) -> T) -> Result<T> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("memory ledger offline");
        }
        let mut users = self.users.lock().unwrap();
        Ok(f(&mut users))
    }

    fn update(&self, user_id: u64, f: impl FnOnce(&mut UserRecord)) -> Result<bool> {
        self.with_users_mut(|users| match users.get_mut(&user_id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        })
    }

    fn conditional(&self, user_id: u64, f: impl FnOnce(&mut UserRecord) -> bool) -> Result<Conditional> {
        let outcome = self.with_users_mut(|users| match users.get_mut(&user_id) {
            Some(user) => {
                if f(user) {
                    Conditional::Applied(user.clone())
                } else {
                    Conditional::Rejected(user.clone())
                }
            }
            None => Conditional::Missing,
        })?;
        if matches!(outcome, Conditional::Rejected(_)) {
            self.rejected_settlements.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    fn ranked(users: &BTreeMap<u64, UserRecord>, coefficients: &ScoreCoefficients) -> Vec<(RankKey, RankedEntry)> {
        let mut ranked: Vec<_> = users
            .values()
            .map(|user| {
                let key = RankKey::of(user, coefficients);
                let entry = RankedEntry {
                    user_id: user.user_id,
                    name: user.profile.name.clone(),
                    success: key.success,
                };
                (key, entry)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));
        ranked
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Ledger for Memory {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserRecord>> {
        let user = self.with_users_mut(|users| users.get(&user_id).cloned())?;
        if self.yield_after_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(user)
    }

    async fn insert_user(&self, user: UserRecord) -> Result<bool> {
        self.with_users_mut(|users| {
            if users.contains_key(&user.user_id) {
                return false;
            }
            users.insert(user.user_id, user);
            true
        })
    }

    async fn count_ranked_before(&self, coefficients: &ScoreCoefficients, key: RankKey) -> Result<u64> {
        self.with_users_mut(|users| {
            users
                .values()
                .filter(|user| RankKey::of(user, coefficients) < key)
                .count() as u64
        })
    }

    async fn ranked_window(
        &self,
        coefficients: &ScoreCoefficients,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RankedEntry>> {
        self.with_users_mut(|users| {
            Self::ranked(users, coefficients)
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(_, entry)| entry)
                .collect()
        })
    }

    async fn settle_match(&self, user_id: u64, settlement: &MatchSettlement) -> Result<Conditional> {
        self.conditional(user_id, |user| settlement.apply(user))
    }

    async fn settle_minigame(
        &self,
        user_id: u64,
        settlement: &MinigameSettlement,
    ) -> Result<Conditional> {
        self.conditional(user_id, |user| settlement.apply(user))
    }

    async fn credit_referral(&self, referrer_id: u64, coins: u64) -> Result<bool> {
        if self.referrals_failing.load(Ordering::SeqCst) {
            bail!("referral credit failed");
        }
        self.update(referrer_id, |user| {
            user.balances.coins += coins;
            user.balances.received_coins += coins;
            user.referrals += 1;
        })
    }

    async fn set_locale(&self, user_id: u64, locale: Locale) -> Result<bool> {
        self.update(user_id, |user| user.profile.locale = locale)
    }

    async fn grant_packs(&self, user_id: u64, tier: PackTier, count: u64, ghost: bool) -> Result<bool> {
        self.update(user_id, |user| {
            user.packs.add(tier, count);
            if ghost {
                user.ghost_packs.add(tier, count);
            }
        })
    }

    async fn set_ban(&self, user_id: u64, ban: BanState) -> Result<bool> {
        self.update(user_id, |user| user.ban = ban)
    }

    async fn reset_minigame_attempts(&self, attempts: u32) -> Result<u64> {
        self.with_users_mut(|users| {
            for user in users.values_mut() {
                user.minigame_attempts_left = attempts;
            }
            users.len() as u64
        })
    }
}
