use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::rules::GameRules;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserInvariantError {
    #[error("match counters exceed games played (victories={victories}, defeats={defeats}, games_played={games_played})")]
    CountersExceedGames {
        victories: u64,
        defeats: u64,
        games_played: u64,
    },
    #[error("ghost {tier} packs exceed raw packs (ghost={ghost}, raw={raw})")]
    GhostExceedsRaw {
        tier: PackTier,
        ghost: u64,
        raw: u64,
    },
}

/// Languages the bot ships translations for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "uk_UA")]
    UkUa,
    #[serde(rename = "ru_RU")]
    RuRu,
    #[serde(rename = "cs_CZ")]
    CsCz,
}

impl Locale {
    pub const ALL: [Locale; 4] = [Locale::EnUs, Locale::UkUa, Locale::RuRu, Locale::CsCz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::EnUs => "en_US",
            Locale::UkUa => "uk_UA",
            Locale::RuRu => "ru_RU",
            Locale::CsCz => "cs_CZ",
        }
    }

    /// Maps a messaging-platform language code (`"uk"`, `"ru"`, ...) to a locale,
    /// falling back to English.
    pub fn from_language_code(code: Option<&str>) -> Self {
        match code.map(|code| code.to_ascii_lowercase()) {
            Some(code) if code == "uk" => Locale::UkUa,
            Some(code) if code == "ru" => Locale::RuRu,
            Some(code) if code == "cs" => Locale::CsCz,
            _ => Locale::EnUs,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.as_str().eq_ignore_ascii_case(value))
            .ok_or("valid values: en_US, uk_UA, ru_RU, cs_CZ")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackTier {
    Small,
    Medium,
    Big,
}

impl fmt::Display for PackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PackTier::Small => "small",
            PackTier::Medium => "medium",
            PackTier::Big => "big",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub locale: Locale,
    /// Unix seconds.
    pub registered_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserBalances {
    pub coins: u64,
    pub tickets: u64,
    pub cups: u64,
    /// Lifetime coins credited from rewards; never decreases.
    pub received_coins: u64,
    /// Lifetime tickets credited from rewards; never decreases.
    pub received_tickets: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    pub games_played: u64,
    pub victories: u64,
    pub defeats: u64,
}

impl MatchRecord {
    pub fn draws(&self) -> u64 {
        self.games_played
            .saturating_sub(self.victories.saturating_add(self.defeats))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackCounts {
    pub small: u64,
    pub medium: u64,
    pub big: u64,
}

impl PackCounts {
    pub fn get(&self, tier: PackTier) -> u64 {
        match tier {
            PackTier::Small => self.small,
            PackTier::Medium => self.medium,
            PackTier::Big => self.big,
        }
    }

    pub fn add(&mut self, tier: PackTier, count: u64) {
        let slot = match tier {
            PackTier::Small => &mut self.small,
            PackTier::Medium => &mut self.medium,
            PackTier::Big => &mut self.big,
        };
        *slot = slot.saturating_add(count);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BanState {
    pub is_banned: bool,
    /// Unix seconds; `None` with `is_banned` set means indefinite.
    pub ban_end: Option<u64>,
}

impl BanState {
    pub fn is_active(&self, now: u64) -> bool {
        self.is_banned && self.ban_end.map_or(true, |end| end > now)
    }
}

/// One registered player.
///
/// `packs` holds the raw counts shown to the user, ghost grants included. `ghost_packs`
/// tracks the administratively credited share of those counts so it can be removed from
/// the success score.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: u64,
    pub profile: UserProfile,
    pub balances: UserBalances,
    pub record: MatchRecord,
    pub packs: PackCounts,
    pub ghost_packs: PackCounts,
    pub referrals: u64,
    pub minigame_attempts_left: u32,
    pub ban: BanState,
}

impl UserRecord {
    pub fn new(user_id: u64, name: String, locale: Locale, now: u64, rules: &GameRules) -> Self {
        Self {
            user_id,
            profile: UserProfile {
                name,
                locale,
                registered_at: now,
            },
            balances: UserBalances {
                coins: rules.starting_coins,
                tickets: rules.starting_tickets,
                ..UserBalances::default()
            },
            record: MatchRecord::default(),
            packs: PackCounts::default(),
            ghost_packs: PackCounts::default(),
            referrals: 0,
            minigame_attempts_left: rules.daily_minigame_attempts,
            ban: BanState::default(),
        }
    }

    pub fn validate_invariants(&self) -> Result<(), UserInvariantError> {
        let MatchRecord {
            games_played,
            victories,
            defeats,
        } = self.record;
        if victories.saturating_add(defeats) > games_played {
            return Err(UserInvariantError::CountersExceedGames {
                victories,
                defeats,
                games_played,
            });
        }
        for tier in [PackTier::Small, PackTier::Medium, PackTier::Big] {
            let (ghost, raw) = (self.ghost_packs.get(tier), self.packs.get(tier));
            if ghost > raw {
                return Err(UserInvariantError::GhostExceedsRaw { tier, ghost, raw });
            }
        }
        Ok(())
    }

    pub fn can_afford(&self, coins: u64, tickets: u64) -> bool {
        self.balances.coins >= coins && self.balances.tickets >= tickets
    }
}
