use std::collections::HashMap;
use thiserror::Error;

/// Items allowed per trade side, inclusive upper bound.
pub const MAX_ITEMS_PER_SIDE: usize = 9;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Time-to-live for an unjoined active trade before expiry.
    pub trade_ttl_ms: i64,
    /// Interval between expiry sweeps.
    pub sweep_interval_ms: u64,
    /// Freshness window for cached catalog reads.
    pub catalog_cache_ttl_ms: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        // Default: 7 days.
        let trade_ttl_ms = parse_positive_i64(&env_map, "TRADE_TTL_MS", "604800000")?;

        let sweep_interval_ms = env_map
            .get("SWEEP_INTERVAL_MS")
            .map(|s| s.as_str())
            .unwrap_or("60000")
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SWEEP_INTERVAL_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let catalog_cache_ttl_ms = parse_positive_i64(&env_map, "CATALOG_CACHE_TTL_MS", "30000")?;

        Ok(Config {
            port,
            database_path,
            trade_ttl_ms,
            sweep_interval_ms,
            catalog_cache_ttl_ms,
        })
    }
}

fn parse_positive_i64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<i64, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            ConfigError::InvalidValue(key.to_string(), "must be a positive integer".to_string())
        })
}
