use anyhow::Context;
use pitchside_types::GameRules;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_LOCALE_CACHE_CAPACITY: usize = 10_000;
const DEFAULT_MINIGAME_RESET_INTERVAL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_HTTP_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug, Serialize)]
pub struct ServerConfig {
    /// Users allowed to call the admin endpoints.
    pub admin_ids: Vec<u64>,
    /// Seeds the game RNG; entropy is used when unset.
    pub deterministic_seed: Option<u64>,
    pub locale_cache_capacity: Option<usize>,
    /// `None` disables the periodic reset.
    pub minigame_reset_interval_secs: Option<u64>,
    pub http_body_limit_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            deterministic_seed: None,
            locale_cache_capacity: Some(DEFAULT_LOCALE_CACHE_CAPACITY),
            minigame_reset_interval_secs: Some(DEFAULT_MINIGAME_RESET_INTERVAL_SECS),
            http_body_limit_bytes: Some(DEFAULT_HTTP_BODY_LIMIT_BYTES),
        }
    }
}

impl ServerConfig {
    pub fn locale_cache_capacity(&self) -> usize {
        self.locale_cache_capacity
            .unwrap_or(DEFAULT_LOCALE_CACHE_CAPACITY)
            .max(1)
    }

    pub fn minigame_reset_interval(&self) -> Option<Duration> {
        self.minigame_reset_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Loads gameplay rules from a YAML file (defaults when `path` is `None`) and validates them.
///
/// Fields missing from the file keep their defaults.
pub fn load_rules(path: Option<&Path>) -> anyhow::Result<GameRules> {
    let rules = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read rules file {}", path.display()))?;
            serde_yaml::from_str::<GameRules>(&raw)
                .with_context(|| format!("parse rules file {}", path.display()))?
        }
        None => GameRules::default(),
    };
    rules.validate().context("invalid rules")?;
    Ok(rules)
}
