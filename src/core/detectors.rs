//! Heuristic detectors.
//!
//! Four independent checks over one IP's window (plus the global ledger for
//! cross-IP correlation). Each returns `None` when it does not fire, or a
//! `Detection` carrying the pattern name and a confidence in [0, 1]. The
//! detectors hold no state of their own.

use std::time::Instant;

use crate::core::ledger::RequestLedger;
use crate::core::path_classifier::{PathClass, PathClassifier};
use crate::core::tracker::{IpWindow, WINDOW};
use crate::models::ThresholdConfig;
use crate::utils::clamp_unit;

pub const RAPID_FIRE: &str = "rapid_fire";
pub const PATH_SCANNING: &str = "path_scanning";
pub const AGENT_SWITCHING: &str = "agent_switching";
pub const RESOURCE_ABUSE: &str = "resource_abuse";

/// Confidence assigned to a sensitive-signature hit, independent of rate.
const SENSITIVE_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to a request with no user agent at all.
const MISSING_AGENT_CONFIDENCE: f64 = 0.2;

/// Distinct source IPs on one expensive path before it counts as targeted.
const EXPENSIVE_PATH_MIN_IPS: usize = 5;

/// A fired detector: which pattern matched and how strongly.
#[derive(Debug, Clone)]
pub struct Detection {
    pub pattern: &'static str,
    pub confidence: f64,
}

impl Detection {
    fn new(pattern: &'static str, confidence: f64) -> Self {
        Self {
            pattern,
            confidence: clamp_unit(confidence),
        }
    }
}

/// Rapid-fire: sustained rate above the per-minute limit, or mean
/// inter-arrival below the minimum interval. Needs at least 3 requests.
pub fn rapid_fire(
    window: &IpWindow,
    now: Instant,
    thresholds: &ThresholdConfig,
) -> Option<Detection> {
    let count = window.request_count();
    if count < 3 {
        return None;
    }
    let rate = count as f64 / window.elapsed_secs(now) * 60.0;
    let mean_ms = window.mean_interval_ms()?;

    let limit = thresholds.requests_per_minute_limit as f64;
    let min_interval = thresholds.min_interval_ms as f64;

    let mut confidence = 0.0;
    if rate > limit {
        // Scales with the overshoot ratio; saturates at 4x the limit so the
        // interval term below can still discriminate.
        confidence = (rate / limit / 4.0).min(0.8);
    }
    if mean_ms < min_interval {
        confidence += 0.2 * (1.0 - mean_ms / min_interval);
    }

    if confidence > 0.0 {
        Some(Detection::new(RAPID_FIRE, confidence))
    } else {
        None
    }
}

/// Path-scanning: a sensitive signature anywhere in the window fires
/// unconditionally; otherwise the adjusted path-diversity rate is checked
/// once 10 distinct paths have accumulated.
pub fn path_scanning(
    window: &IpWindow,
    paths: &PathClassifier,
    now: Instant,
    thresholds: &ThresholdConfig,
) -> Option<Detection> {
    if window.paths().any(|p| paths.is_sensitive(p)) {
        return Some(Detection::new(PATH_SCANNING, SENSITIVE_CONFIDENCE));
    }
    if window.distinct_paths() < 10 {
        return None;
    }
    // Discount resources browsers fetch on their own and plain static
    // assets; a legitimate page load touches many of those.
    let adjusted = window
        .paths()
        .filter(|p| !paths.is_auto_fetched(p) && paths.classify(p) != PathClass::StaticAsset)
        .count();
    if adjusted < 10 {
        return None;
    }
    let per_minute = adjusted as f64 / window.elapsed_secs(now) * 60.0;
    let max = thresholds.max_paths_per_minute as f64;
    if per_minute > max {
        Some(Detection::new(
            PATH_SCANNING,
            0.5 + 0.5 * (per_minute / max - 1.0),
        ))
    } else {
        None
    }
}

/// Agent-switching: more distinct user agents in one window than a single
/// client plausibly has, strengthened when the agents carry automation
/// tokens. A missing user agent is a weak signal on its own.
pub fn agent_switching(
    window: &IpWindow,
    current_agent: Option<&str>,
    paths: &PathClassifier,
    thresholds: &ThresholdConfig,
) -> Option<Detection> {
    if window.request_count() < 3 {
        return None;
    }
    let distinct = window.distinct_agents();
    let max = thresholds.max_user_agents_per_window as usize;
    if distinct > max {
        let excess = (distinct - max) as f64;
        let mut confidence = (0.4 + 0.15 * excess).min(0.8);
        let automation = window
            .agents()
            .filter(|a| paths.is_automation_agent(a))
            .count();
        let fraction = automation as f64 / distinct as f64;
        if fraction >= 0.3 {
            // Diversity plus automation tokens is stronger evidence than
            // diversity alone.
            confidence += 0.3 * fraction;
        }
        return Some(Detection::new(AGENT_SWITCHING, confidence));
    }
    match current_agent {
        None => Some(Detection::new(AGENT_SWITCHING, MISSING_AGENT_CONFIDENCE)),
        Some(agent) if agent.is_empty() => {
            Some(Detection::new(AGENT_SWITCHING, MISSING_AGENT_CONFIDENCE))
        }
        Some(_) => None,
    }
}

/// Resource-abuse: an oversized payload, or an expensive-operation path that
/// the ledger shows many distinct IPs converging on.
pub fn resource_abuse(
    path: &str,
    size: u64,
    ledger: &RequestLedger,
    paths: &PathClassifier,
    now: Instant,
    thresholds: &ThresholdConfig,
) -> Option<Detection> {
    let large = thresholds.large_request_bytes;
    if size > large {
        let excess = size as f64 / large as f64;
        return Some(Detection::new(RESOURCE_ABUSE, 0.5 + 0.25 * (excess - 1.0)));
    }
    if paths.is_expensive(path) {
        let since = now.checked_sub(WINDOW);
        let ips = ledger.distinct_ips_for_path(path, since);
        if ips >= EXPENSIVE_PATH_MIN_IPS {
            return Some(Detection::new(RESOURCE_ABUSE, 0.4 + 0.05 * ips as f64));
        }
    }
    None
}
