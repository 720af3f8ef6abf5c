use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use harvest_common::helpers::parse_boolean_flag;
use harvest_engine::DEFAULT_MATCH_VALIDITY_HOURS;
use log::*;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/harvest.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How often the match expiry sweep runs.
    pub sweep_interval: std::time::Duration,
    /// How long new match offers stay open.
    pub match_validity: Duration,
    /// Capacity of each event channel. Events that do not fit are dropped.
    pub event_buffer_size: usize,
    /// Apply the embedded schema migrations at start-up.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            match_validity: Duration::hours(DEFAULT_MATCH_VALIDITY_HOURS),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("HARVEST_DATABASE_URL").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            warn!("🪛️ HARVEST_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_positive(
            "HARVEST_DB_MAX_CONNECTIONS",
            env::var("HARVEST_DB_MAX_CONNECTIONS").ok(),
            DEFAULT_MAX_CONNECTIONS,
        );
        let sweep_secs = parse_positive(
            "HARVEST_EXPIRY_SWEEP_INTERVAL",
            env::var("HARVEST_EXPIRY_SWEEP_INTERVAL").ok(),
            DEFAULT_SWEEP_INTERVAL_SECS,
        );
        let validity_hours = parse_positive(
            "HARVEST_MATCH_VALIDITY",
            env::var("HARVEST_MATCH_VALIDITY").ok(),
            DEFAULT_MATCH_VALIDITY_HOURS,
        );
        let event_buffer_size = parse_positive(
            "HARVEST_EVENT_BUFFER_SIZE",
            env::var("HARVEST_EVENT_BUFFER_SIZE").ok(),
            DEFAULT_EVENT_BUFFER_SIZE,
        );
        let run_migrations = parse_boolean_flag(env::var("HARVEST_RUN_MIGRATIONS").ok(), true);
        Self {
            database_url,
            max_connections,
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            match_validity: Duration::hours(validity_hours),
            event_buffer_size,
            run_migrations,
        }
    }
}

/// Parses a strictly positive number from an environment value. Missing values quietly take the default; values that
/// are present but invalid are logged and replaced by the default.
fn parse_positive<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
    T::Err: Display,
{
    let Some(value) = value else {
        info!("🪛️ {name} is not set. Using the default value of {default}.");
        return default;
    };
    match value.trim().parse::<T>() {
        Ok(v) if v > T::default() => v,
        Ok(v) => {
            error!("🪛️ {name} must be greater than zero, but was {v}. Using the default value of {default} instead.");
            default
        },
        Err(e) => {
            error!("🪛️ {value} is not a valid value for {name}. {e} Using the default value of {default} instead.");
            default
        },
    }
}
