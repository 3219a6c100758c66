//! SQLite-backed [`Ledger`].
//!
//! One `users` row per player. Success is never stored: ranking queries evaluate the score
//! expression over the counters with the caller's coefficients bound as parameters.
//! Every mutation is a single conditional `UPDATE` inside an immediate transaction, so
//! concurrent requests for the same user cannot lose or double-apply a change.

use anyhow::{anyhow, Context};
use pitchside_execution::{Conditional, Ledger, MatchSettlement, MinigameSettlement, RankKey};
use pitchside_types::{
    BanState, Locale, MatchRecord, PackCounts, PackTier, RankedEntry, ScoreCoefficients,
    UserBalances, UserProfile, UserRecord,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        locale TEXT NOT NULL,
        registered_at INTEGER NOT NULL,
        coins INTEGER NOT NULL CHECK (coins >= 0),
        tickets INTEGER NOT NULL CHECK (tickets >= 0),
        cups INTEGER NOT NULL DEFAULT 0 CHECK (cups >= 0),
        received_coins INTEGER NOT NULL DEFAULT 0,
        received_tickets INTEGER NOT NULL DEFAULT 0,
        games_played INTEGER NOT NULL DEFAULT 0,
        victories INTEGER NOT NULL DEFAULT 0,
        defeats INTEGER NOT NULL DEFAULT 0,
        small_packs INTEGER NOT NULL DEFAULT 0,
        medium_packs INTEGER NOT NULL DEFAULT 0,
        big_packs INTEGER NOT NULL DEFAULT 0,
        ghost_small_packs INTEGER NOT NULL DEFAULT 0,
        ghost_medium_packs INTEGER NOT NULL DEFAULT 0,
        ghost_big_packs INTEGER NOT NULL DEFAULT 0,
        referrals INTEGER NOT NULL DEFAULT 0,
        minigame_attempts_left INTEGER NOT NULL DEFAULT 0 CHECK (minigame_attempts_left >= 0),
        is_banned INTEGER NOT NULL DEFAULT 0,
        ban_end INTEGER,
        CHECK (victories + defeats <= games_played)
    );
    CREATE INDEX IF NOT EXISTS users_by_name ON users (name);";

const EXPECTED_OBJECTS: [&str; 2] = ["users", "users_by_name"];

const USER_COLUMNS: &str = "user_id, name, locale, registered_at, coins, tickets, cups, \
    received_coins, received_tickets, games_played, victories, defeats, small_packs, \
    medium_packs, big_packs, ghost_small_packs, ghost_medium_packs, ghost_big_packs, \
    referrals, minigame_attempts_left, is_banned, ban_end";

/// Success as SQL; coefficients bind to `?1..=?9` in [`ScoreCoefficients`] field order.
const SUCCESS_EXPR: &str = "(victories * ?1 + defeats * ?2 \
    + small_packs * ?3 + medium_packs * ?4 + big_packs * ?5 \
    + referrals * ?6 \
    - (ghost_small_packs * ?7 + ghost_medium_packs * ?8 + ghost_big_packs * ?9))";

/// Objects found by [`verify_schema`] that differ from what this build expects.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

fn init_schema_sqlite(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;",
    )
    .context("configure ledger connection")?;
    conn.execute_batch(SCHEMA).context("init ledger schema")?;
    Ok(())
}

/// Compares the tables and indexes present in `conn` against the expected set.
pub fn verify_schema(conn: &Connection) -> anyhow::Result<SchemaReport> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type IN ('table', 'index') AND name NOT LIKE 'sqlite_%'",
    )?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    let expected: BTreeSet<String> = EXPECTED_OBJECTS.iter().map(|name| name.to_string()).collect();
    Ok(SchemaReport {
        missing: expected.difference(&present).cloned().collect(),
        unexpected: present.difference(&expected).cloned().collect(),
    })
}

fn conversion_error(idx: usize, err: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, anyhow!("{err}").into())
}

fn read_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let locale: String = row.get(2)?;
    let locale: Locale = locale.parse().map_err(|err| conversion_error(2, err))?;
    Ok(UserRecord {
        user_id: row.get(0)?,
        profile: UserProfile {
            name: row.get(1)?,
            locale,
            registered_at: row.get(3)?,
        },
        balances: UserBalances {
            coins: row.get(4)?,
            tickets: row.get(5)?,
            cups: row.get(6)?,
            received_coins: row.get(7)?,
            received_tickets: row.get(8)?,
        },
        record: MatchRecord {
            games_played: row.get(9)?,
            victories: row.get(10)?,
            defeats: row.get(11)?,
        },
        packs: PackCounts {
            small: row.get(12)?,
            medium: row.get(13)?,
            big: row.get(14)?,
        },
        ghost_packs: PackCounts {
            small: row.get(15)?,
            medium: row.get(16)?,
            big: row.get(17)?,
        },
        referrals: row.get(18)?,
        minigame_attempts_left: row.get(19)?,
        ban: BanState {
            is_banned: row.get(20)?,
            ban_end: row.get(21)?,
        },
    })
}

fn load_user(conn: &Connection, user_id: u64) -> anyhow::Result<Option<UserRecord>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        params![user_id],
        read_user,
    )
    .optional()
    .with_context(|| format!("load user {user_id}"))
}

/// Runs a conditional `UPDATE` and classifies the outcome.
///
/// `changed == 0` means either the row is missing or the condition failed; the row is
/// re-read inside the same transaction to tell the two apart.
fn conditional_update(
    conn: &mut Connection,
    user_id: u64,
    update: impl FnOnce(&Connection) -> rusqlite::Result<usize>,
) -> anyhow::Result<Conditional> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let changed = update(&*tx).with_context(|| format!("update user {user_id}"))?;
    let current = load_user(&tx, user_id)?;
    tx.commit()?;
    Ok(match current {
        None => Conditional::Missing,
        Some(user) if changed > 0 => Conditional::Applied(user),
        Some(user) => Conditional::Rejected(user),
    })
}

fn pack_columns(tier: PackTier) -> (&'static str, &'static str) {
    match tier {
        PackTier::Small => ("small_packs", "ghost_small_packs"),
        PackTier::Medium => ("medium_packs", "ghost_medium_packs"),
        PackTier::Big => ("big_packs", "ghost_big_packs"),
    }
}

#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Opens (creating if needed) the ledger at `path` and checks its schema.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open ledger db {}", path.display()))?;
        init_schema_sqlite(&conn)?;
        let report = verify_schema(&conn)?;
        if !report.is_clean() {
            warn!(
                missing = ?report.missing,
                unexpected = ?report.unexpected,
                "ledger schema differs from expected"
            );
        }
        info!(path = %path.display(), "ledger opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| anyhow!("ledger connection poisoned"))?;
            f(&mut conn)
        })
        .await
        .context("ledger task failed")?
    }
}

impl Ledger for SqliteLedger {
    async fn get_user(&self, user_id: u64) -> anyhow::Result<Option<UserRecord>> {
        self.with_conn(move |conn| load_user(conn, user_id)).await
    }

    async fn insert_user(&self, user: UserRecord) -> anyhow::Result<bool> {
        self.with_conn(move |conn| {
            let inserted = conn
                .execute(
                    &format!(
                        "INSERT OR IGNORE INTO users ({USER_COLUMNS}) VALUES \
                         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
                          ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
                    ),
                    params![
                        user.user_id,
                        user.profile.name,
                        user.profile.locale.as_str(),
                        user.profile.registered_at,
                        user.balances.coins,
                        user.balances.tickets,
                        user.balances.cups,
                        user.balances.received_coins,
                        user.balances.received_tickets,
                        user.record.games_played,
                        user.record.victories,
                        user.record.defeats,
                        user.packs.small,
                        user.packs.medium,
                        user.packs.big,
                        user.ghost_packs.small,
                        user.ghost_packs.medium,
                        user.ghost_packs.big,
                        user.referrals,
                        user.minigame_attempts_left,
                        user.ban.is_banned,
                        user.ban.ban_end,
                    ],
                )
                .with_context(|| format!("insert user {}", user.user_id))?;
            Ok(inserted == 1)
        })
        .await
    }

    async fn count_ranked_before(
        &self,
        coefficients: &ScoreCoefficients,
        key: RankKey,
    ) -> anyhow::Result<u64> {
        let c = coefficients.clone();
        self.with_conn(move |conn| {
            let count: u64 = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM users \
                         WHERE {SUCCESS_EXPR} > ?10 OR ({SUCCESS_EXPR} = ?10 AND user_id < ?11)"
                    ),
                    params![
                        c.victory,
                        c.defeat,
                        c.small_pack,
                        c.medium_pack,
                        c.big_pack,
                        c.referral,
                        c.ghost_small_pack,
                        c.ghost_medium_pack,
                        c.ghost_big_pack,
                        key.success,
                        key.user_id,
                    ],
                    |row| row.get(0),
                )
                .context("count ranked users")?;
            Ok(count)
        })
        .await
    }

    async fn ranked_window(
        &self,
        coefficients: &ScoreCoefficients,
        offset: u64,
        limit: u64,
    ) -> anyhow::Result<Vec<RankedEntry>> {
        let c = coefficients.clone();
        // SQLite LIMIT is signed; anything past i64::MAX is "all rows" anyway.
        let limit = limit.min(i64::MAX as u64);
        let offset = offset.min(i64::MAX as u64);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT user_id, name, {SUCCESS_EXPR} AS success FROM users \
                 ORDER BY success DESC, user_id ASC LIMIT ?10 OFFSET ?11"
            ))?;
            let entries = stmt
                .query_map(
                    params![
                        c.victory,
                        c.defeat,
                        c.small_pack,
                        c.medium_pack,
                        c.big_pack,
                        c.referral,
                        c.ghost_small_pack,
                        c.ghost_medium_pack,
                        c.ghost_big_pack,
                        limit,
                        offset,
                    ],
                    |row| {
                        Ok(RankedEntry {
                            user_id: row.get(0)?,
                            name: row.get(1)?,
                            success: row.get(2)?,
                        })
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("load ranked window")?;
            Ok(entries)
        })
        .await
    }

    async fn settle_match(
        &self,
        user_id: u64,
        settlement: &MatchSettlement,
    ) -> anyhow::Result<Conditional> {
        let s = settlement.clone();
        self.with_conn(move |conn| {
            conditional_update(conn, user_id, |tx| {
                tx.execute(
                    "UPDATE users SET
                         coins = coins - ?2 + ?4,
                         tickets = tickets - ?3,
                         cups = cups + ?5,
                         victories = victories + ?6,
                         defeats = defeats + ?7,
                         games_played = games_played + 1
                     WHERE user_id = ?1 AND coins >= ?2 AND tickets >= ?3",
                    params![
                        user_id,
                        s.cost_coins,
                        s.cost_tickets,
                        s.coins_won,
                        s.cups_won,
                        s.victories,
                        s.defeats,
                    ],
                )
            })
        })
        .await
    }

    async fn settle_minigame(
        &self,
        user_id: u64,
        settlement: &MinigameSettlement,
    ) -> anyhow::Result<Conditional> {
        let reward = settlement.reward;
        self.with_conn(move |conn| {
            conditional_update(conn, user_id, |tx| {
                tx.execute(
                    "UPDATE users SET
                         minigame_attempts_left = minigame_attempts_left - 1,
                         coins = coins + ?2,
                         received_coins = received_coins + ?2
                     WHERE user_id = ?1 AND minigame_attempts_left > 0",
                    params![user_id, reward],
                )
            })
        })
        .await
    }

    async fn credit_referral(&self, referrer_id: u64, coins: u64) -> anyhow::Result<bool> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET
                         coins = coins + ?2,
                         received_coins = received_coins + ?2,
                         referrals = referrals + 1
                     WHERE user_id = ?1",
                    params![referrer_id, coins],
                )
                .with_context(|| format!("credit referral to {referrer_id}"))?;
            Ok(changed == 1)
        })
        .await
    }

    async fn set_locale(&self, user_id: u64, locale: Locale) -> anyhow::Result<bool> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET locale = ?2 WHERE user_id = ?1",
                    params![user_id, locale.as_str()],
                )
                .with_context(|| format!("set locale of {user_id}"))?;
            Ok(changed == 1)
        })
        .await
    }

    async fn grant_packs(
        &self,
        user_id: u64,
        tier: PackTier,
        count: u64,
        ghost: bool,
    ) -> anyhow::Result<bool> {
        let (raw, ghost_column) = pack_columns(tier);
        self.with_conn(move |conn| {
            let sql = if ghost {
                format!(
                    "UPDATE users SET {raw} = {raw} + ?2, {ghost_column} = {ghost_column} + ?2 \
                     WHERE user_id = ?1"
                )
            } else {
                format!("UPDATE users SET {raw} = {raw} + ?2 WHERE user_id = ?1")
            };
            let changed = conn
                .execute(&sql, params![user_id, count])
                .with_context(|| format!("grant packs to {user_id}"))?;
            Ok(changed == 1)
        })
        .await
    }

    async fn set_ban(&self, user_id: u64, ban: BanState) -> anyhow::Result<bool> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET is_banned = ?2, ban_end = ?3 WHERE user_id = ?1",
                    params![user_id, ban.is_banned, ban.ban_end],
                )
                .with_context(|| format!("set ban of {user_id}"))?;
            Ok(changed == 1)
        })
        .await
    }

    async fn reset_minigame_attempts(&self, attempts: u32) -> anyhow::Result<u64> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET minigame_attempts_left = ?1",
                    params![attempts],
                )
                .context("reset minigame attempts")?;
            Ok(changed as u64)
        })
        .await
    }
}
