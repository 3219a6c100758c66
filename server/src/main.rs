use anyhow::{Context, Result};
use clap::Parser;
use pitchside_server::{load_rules, Api, Game, ServerConfig, SqliteLedger};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_DB_PATH: &str = "pitchside.db";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host interface to bind (default: localhost).
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Path to the SQLite ledger (created when missing).
    #[arg(long, env = "DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,

    /// YAML file overriding gameplay rules; fields left out keep their defaults.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Comma-separated user ids allowed to call admin endpoints.
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    admin_ids: Vec<u64>,

    /// Seed for the game RNG (optional; entropy when omitted).
    #[arg(long)]
    deterministic_seed: Option<u64>,

    /// Maximum number of cached user locales (0 uses default).
    #[arg(long)]
    locale_cache_capacity: Option<usize>,

    /// Seconds between mini-game attempt resets (0 disables the reset).
    #[arg(long)]
    minigame_reset_interval_secs: Option<u64>,

    /// Max request body size in bytes (0 disables limit).
    #[arg(long)]
    http_body_limit_bytes: Option<usize>,

    /// Log level: error, warn, info, debug or trace.
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Maps an optional arg value to Option: 0 => None, Some(v) => Some(v), None => default
fn map_optional_limit<T: Copy + PartialEq + From<u8>>(
    arg: Option<T>,
    default: Option<T>,
) -> Option<T> {
    match arg {
        Some(v) if v == T::from(0) => None,
        Some(v) => Some(v),
        None => default,
    }
}

/// Maps an optional arg value keeping default on 0: 0 => default, Some(v) => Some(v), None => default
fn map_optional_default_on_zero<T: Copy + PartialEq + From<u8>>(
    arg: Option<T>,
    default: Option<T>,
) -> Option<T> {
    match arg {
        Some(v) if v == T::from(0) => default,
        Some(v) => Some(v),
        None => default,
    }
}

fn build_config(args: &Args) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        admin_ids: args.admin_ids.clone(),
        deterministic_seed: args.deterministic_seed.or(defaults.deterministic_seed),
        locale_cache_capacity: map_optional_default_on_zero(
            args.locale_cache_capacity,
            defaults.locale_cache_capacity,
        ),
        minigame_reset_interval_secs: map_optional_limit(
            args.minigame_reset_interval_secs,
            defaults.minigame_reset_interval_secs,
        ),
        http_body_limit_bytes: map_optional_limit(
            args.http_body_limit_bytes,
            defaults.http_body_limit_bytes,
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    init_tracing(args.log_level);

    let rules = load_rules(args.rules.as_deref())?;
    let config = build_config(&args);
    if config.admin_ids.is_empty() {
        tracing::warn!("ADMIN_IDS is empty; admin endpoints will reject every caller");
    }
    let ledger = SqliteLedger::open(&args.db_path)?;
    info!(
        db = %args.db_path.display(),
        admins = config.admin_ids.len(),
        seeded = config.deterministic_seed.is_some(),
        "pitchside ledger ready"
    );

    let game = Arc::new(Game::new(ledger, rules, config));
    let _reset = game.spawn_daily_reset();
    let app = Api::new(game).router();

    // Start server
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("axum server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_ids_and_limits() {
        let args = Args::parse_from([
            "pitchside-server",
            "--admin-ids",
            "10,20",
            "--deterministic-seed",
            "7",
            "--minigame-reset-interval-secs",
            "0",
            "--locale-cache-capacity",
            "0",
        ]);
        let config = build_config(&args);
        assert_eq!(config.admin_ids, vec![10, 20]);
        assert_eq!(config.deterministic_seed, Some(7));
        assert_eq!(config.minigame_reset_interval(), None);
        assert_eq!(
            config.locale_cache_capacity,
            ServerConfig::default().locale_cache_capacity
        );
    }

    #[test]
    fn keeps_defaults_when_unset() {
        let args = Args::parse_from(["pitchside-server", "--log-level", "debug"]);
        assert_eq!(args.log_level, tracing::Level::DEBUG);
        let config = build_config(&args);
        let defaults = ServerConfig::default();
        assert_eq!(config.minigame_reset_interval_secs, defaults.minigame_reset_interval_secs);
        assert_eq!(config.http_body_limit_bytes, defaults.http_body_limit_bytes);
    }
}
