/// Runtime configuration loaded from the environment at process start.
///
/// Two surfaces: `ScoringConfig` (threshold set handed by value to the
/// scoring engine, immutable after construction) and `ProviderConfig`
/// (credentials and endpoint overrides for the external providers).
use serde::Serialize;
use std::env;

use crate::arguments::get_arg_value;

/// Default upstream migration stream endpoint
pub const DEFAULT_PUMPPORTAL_WS_URL: &str = "wss://pumpportal.fun/api/data";

/// Scoring thresholds. Loaded once, passed by value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoringConfig {
    pub min_score: i32,
    pub max_dev_holdings: f64,
    pub min_holders: i64,
    pub max_top10: f64,
    pub min_unique_ratio: f64,
    pub min_token_age_hours: f64,
    pub min_liquidity_ratio: f64,
    pub max_price_volatility: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 60,
            max_dev_holdings: 0.15,
            min_holders: 50,
            max_top10: 0.30,
            min_unique_ratio: 0.60,
            min_token_age_hours: 1.0,
            min_liquidity_ratio: 0.05,
            max_price_volatility: 50.0,
        }
    }
}

impl ScoringConfig {
    /// Build from environment, falling back to defaults for anything unset
    /// or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_score: env_parse("MIN_SCORE_THRESHOLD", defaults.min_score),
            max_dev_holdings: env_parse("MAX_DEV_HOLDINGS", defaults.max_dev_holdings),
            min_holders: env_parse("MIN_HOLDERS", defaults.min_holders),
            max_top10: env_parse("MAX_TOP10", defaults.max_top10),
            min_unique_ratio: env_parse("MIN_UNIQUE_RATIO", defaults.min_unique_ratio),
            min_token_age_hours: env_parse("MIN_TOKEN_AGE_HOURS", defaults.min_token_age_hours),
            min_liquidity_ratio: env_parse("MIN_LIQUIDITY_RATIO", defaults.min_liquidity_ratio),
            max_price_volatility: env_parse("MAX_PRICE_VOLATILITY", defaults.max_price_volatility),
        }
    }
}

/// Provider credentials and endpoint overrides.
///
/// Each provider carries an ordered credential list: primary key first,
/// then up to two fallbacks. Key rotation advances through the list on
/// 401/429 responses.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub moralis_keys: Vec<String>,
    pub helius_keys: Vec<String>,
    pub pumpportal_ws_url: String,
    pub port: u16,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let port = get_arg_value("--port")
            .and_then(|v| v.parse::<u16>().ok())
            .or_else(|| env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()))
            .unwrap_or(3000);

        Self {
            moralis_keys: read_key_chain("MORALIS_API_KEY"),
            helius_keys: read_key_chain("HELIUS_API_KEY"),
            pumpportal_ws_url: env::var("PUMPPORTAL_WS_URL")
                .unwrap_or_else(|_| DEFAULT_PUMPPORTAL_WS_URL.to_string()),
            port,
        }
    }
}

/// Read `NAME`, `NAME_2`, `NAME_3` from the environment, keeping order and
/// skipping unset or empty entries.
fn read_key_chain(base: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for name in [base.to_string(), format!("{}_2", base), format!("{}_3", base)] {
        if let Ok(value) = env::var(&name) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                keys.push(trimmed);
            }
        }
    }
    keys
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScoringConfig::default();
        assert_eq!(config.min_score, 60);
        assert_eq!(config.min_holders, 50);
        assert!((config.max_dev_holdings - 0.15).abs() < f64::EPSILON);
        assert!((config.max_top10 - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_parse_fallback() {
        // Unset variable falls back to the provided default
        assert_eq!(env_parse("GRADWATCH_TEST_UNSET_VAR", 42i32), 42);
    }
}
