//! Configuration management for the traffic classifier service.
//!
//! This module handles loading application configuration from a
//! configuration file and environment variables, with defaults matching
//! the documented detection thresholds.

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use std::env;

use crate::models::Config;

/// Load configuration from `CONFIG_FILE` (optional) and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let config_file = env::var("CONFIG_FILE").unwrap_or_else(|_| "config/default.toml".to_string());

    let config = ConfigBuilder::builder()
        .add_source(File::with_name(&config_file).required(false))
        .add_source(Environment::default().separator("__"))
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("thresholds.requests_per_minute_limit", 200)?
        .set_default("thresholds.min_interval_ms", 25)?
        .set_default("thresholds.max_paths_per_minute", 80)?
        .set_default("thresholds.max_user_agents_per_window", 3)?
        .set_default("thresholds.large_request_bytes", 500_000)?
        .set_default("decision.attack_threshold", 0.6)?
        .set_default("decision.trusted_asset_cutoff", 0.6)?
        .set_default("decision.high_trust_cutoff", 0.85)?
        .set_default("decision.high_trust_min_requests", 5)?
        .set_default("decision.corroboration_bonus", 0.15)?
        .set_default("decision.legitimacy_discount", 0.6)?
        .set_default("decision.attack_penalty", 0.2)?
        .set_default("decision.persistence_weight", 0.85)?
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_into_valid_config() {
        let config = load_config().unwrap();
        assert_eq!(config.thresholds.requests_per_minute_limit, 200);
        assert_eq!(config.thresholds.min_interval_ms, 25);
        assert_eq!(config.decision.high_trust_min_requests, 5);
        assert!(config.thresholds.validate().is_ok());
        assert!(config.decision.validate().is_ok());
    }
}
