use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating classifier configuration
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("threshold `{0}` must be greater than zero")]
    ZeroThreshold(&'static str),
    #[error("parameter `{name}` must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Detection thresholds applied by the heuristic detectors.
///
/// Immutable for the lifetime of a classifier instance; supplied once at
/// construction by the configuration loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Sustained request rate above which an IP is considered rapid-firing
    pub requests_per_minute_limit: u32,
    /// Mean inter-request interval below which traffic looks scripted (ms)
    pub min_interval_ms: u64,
    /// Adjusted distinct paths per minute above which an IP looks like a scanner
    pub max_paths_per_minute: u32,
    /// Distinct user agents tolerated within one window
    pub max_user_agents_per_window: u32,
    /// Request payload size above which a single request is abusive (bytes)
    pub large_request_bytes: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            requests_per_minute_limit: 200,
            min_interval_ms: 25,
            max_paths_per_minute: 80,
            max_user_agents_per_window: 3,
            large_request_bytes: 500_000,
        }
    }
}

impl ThresholdConfig {
    /// Validate that every threshold is usable by the detectors.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.requests_per_minute_limit == 0 {
            return Err(ConfigValidationError::ZeroThreshold(
                "requests_per_minute_limit",
            ));
        }
        if self.min_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroThreshold("min_interval_ms"));
        }
        if self.max_paths_per_minute == 0 {
            return Err(ConfigValidationError::ZeroThreshold("max_paths_per_minute"));
        }
        if self.max_user_agents_per_window == 0 {
            return Err(ConfigValidationError::ZeroThreshold(
                "max_user_agents_per_window",
            ));
        }
        if self.large_request_bytes == 0 {
            return Err(ConfigValidationError::ZeroThreshold("large_request_bytes"));
        }
        Ok(())
    }
}

/// Parameters of the decision combiner and the legitimacy scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Combined confidence at or above which a request is declared an attack
    pub attack_threshold: f64,
    /// Legitimacy above which static-asset fetches are accepted without analysis
    pub trusted_asset_cutoff: f64,
    /// Legitimacy above which any request from a well-known IP is accepted
    pub high_trust_cutoff: f64,
    /// In-window requests required before the high-trust fast path applies
    pub high_trust_min_requests: usize,
    /// Bonus added when two or more detectors agree
    pub corroboration_bonus: f64,
    /// Fraction of the legitimacy score subtracted from the evidence sum
    pub legitimacy_discount: f64,
    /// Legitimacy penalty applied on a positive verdict
    pub attack_penalty: f64,
    /// Weight of the previous legitimacy score in the smoothing update
    pub persistence_weight: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            attack_threshold: 0.6,
            trusted_asset_cutoff: 0.6,
            high_trust_cutoff: 0.85,
            high_trust_min_requests: 5,
            corroboration_bonus: 0.15,
            legitimacy_discount: 0.6,
            attack_penalty: 0.2,
            persistence_weight: 0.85,
        }
    }
}

impl DecisionConfig {
    /// Validate that every parameter is within its meaningful range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let unit_params = [
            ("attack_threshold", self.attack_threshold),
            ("trusted_asset_cutoff", self.trusted_asset_cutoff),
            ("high_trust_cutoff", self.high_trust_cutoff),
            ("corroboration_bonus", self.corroboration_bonus),
            ("legitimacy_discount", self.legitimacy_discount),
            ("attack_penalty", self.attack_penalty),
        ];
        for (name, value) in unit_params {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::OutOfRange {
                    name,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        // A persistence weight of 1.0 would freeze reputation forever.
        if !(0.0..1.0).contains(&self.persistence_weight) {
            return Err(ConfigValidationError::OutOfRange {
                name: "persistence_weight",
                min: 0.0,
                max: 1.0,
                value: self.persistence_weight,
            });
        }
        Ok(())
    }
}

/// Verdict returned for a single analyzed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether the request was classified as part of an attack
    pub is_attack: bool,
    /// Names of the detectors that fired
    pub matched_patterns: Vec<String>,
    /// Combined confidence in [0, 1]
    pub confidence: f64,
}

impl ClassificationResult {
    /// A benign verdict with no matched patterns.
    pub fn benign() -> Self {
        Self {
            is_attack: false,
            matched_patterns: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Detection thresholds
    pub thresholds: ThresholdConfig,
    /// Decision combiner parameters
    pub decision: DecisionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            thresholds: ThresholdConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}
