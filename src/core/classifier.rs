//! Decision combiner.
//!
//! `TrafficClassifier` owns all mutable classification state behind one
//! coarse mutex, held for the full duration of one `analyze` call. The call
//! records the request, prunes the caller's window, tries the fast-accept
//! paths, runs the four detectors, discounts the evidence by the IP's
//! legitimacy, and applies the decision threshold. No I/O happens inside
//! the critical section and the call never suspends.

use std::sync::{Arc, Mutex};

use log::warn;

use crate::core::clock::{Clock, SystemClock};
use crate::core::detectors::{self, Detection};
use crate::core::ledger::{LedgerEntry, RequestLedger};
use crate::core::legitimacy::LegitimacyScorer;
use crate::core::path_classifier::{PathClass, PathClassifier};
use crate::core::tracker::ActivityTracker;
use crate::models::{
    ClassificationResult, ConfigValidationError, DecisionConfig, ThresholdConfig,
};
use crate::utils::normalize_path;

struct ClassifierState {
    tracker: ActivityTracker,
    ledger: RequestLedger,
    reputation: LegitimacyScorer,
}

/// Behavioral traffic classifier.
///
/// Constructed once per process and shared by reference across request
/// handlers; all state lives inside the instance.
pub struct TrafficClassifier {
    thresholds: ThresholdConfig,
    decision: DecisionConfig,
    paths: PathClassifier,
    clock: Arc<dyn Clock>,
    state: Mutex<ClassifierState>,
}

impl TrafficClassifier {
    /// Create a classifier with the system clock.
    pub fn new(
        thresholds: ThresholdConfig,
        decision: DecisionConfig,
    ) -> Result<Self, ConfigValidationError> {
        Self::with_clock(thresholds, decision, Arc::new(SystemClock))
    }

    /// Create a classifier with an injected clock, for replayable analysis.
    pub fn with_clock(
        thresholds: ThresholdConfig,
        decision: DecisionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigValidationError> {
        thresholds.validate()?;
        decision.validate()?;
        let persistence_weight = decision.persistence_weight;
        Ok(Self {
            thresholds,
            decision,
            paths: PathClassifier::new(),
            clock,
            state: Mutex::new(ClassifierState {
                tracker: ActivityTracker::new(),
                ledger: RequestLedger::new(),
                reputation: LegitimacyScorer::new(persistence_weight),
            }),
        })
    }

    /// Classify one inbound request.
    ///
    /// # Arguments
    ///
    /// * `ip` - Source IP of the request
    /// * `path` - Request path, query string included
    /// * `user_agent` - User-agent header if present
    /// * `size` - Request payload size in bytes
    ///
    /// # Returns
    ///
    /// `true` when the request is classified as part of an attack.
    pub fn analyze(&self, ip: &str, path: &str, user_agent: Option<&str>, size: u64) -> bool {
        self.analyze_detailed(ip, path, user_agent, size).is_attack
    }

    /// Classify one inbound request, returning the matched patterns and the
    /// combined confidence alongside the verdict.
    pub fn analyze_detailed(
        &self,
        ip: &str,
        path: &str,
        user_agent: Option<&str>,
        size: u64,
    ) -> ClassificationResult {
        let now = self.clock.now();
        let path = normalize_path(path);
        let class = self.paths.classify(path);
        let is_static = class == PathClass::StaticAsset;

        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let state = &mut *guard;

        state.tracker.prune(ip, now);
        state.ledger.push(LedgerEntry {
            ip: ip.to_string(),
            path: path.to_string(),
            user_agent: user_agent.map(str::to_string),
            timestamp: now,
            size,
            is_static,
            is_api: class == PathClass::Api,
        });
        let first_seen = !state.reputation.is_known(ip);
        let window = state.tracker.record(ip, path, user_agent, class, now);

        // Reputation is updated on every analyzed request, fast-accepted or
        // not, so idle-then-active IPs keep an honest score.
        let legitimacy = state.reputation.observe(ip, window, now, is_static);

        // Cold start: an IP with no reputation history gets the benefit of
        // the doubt. An IP merely returning from an idle gap does not; its
        // score already says what its traffic looked like.
        if first_seen {
            return ClassificationResult::benign();
        }

        // Fast-accept A: routine asset fetch from an IP with established
        // trust.
        if is_static && legitimacy >= self.decision.trusted_asset_cutoff {
            return ClassificationResult::benign();
        }

        // Fast-accept B: enough history and very high legitimacy.
        if window.request_count() >= self.decision.high_trust_min_requests
            && legitimacy >= self.decision.high_trust_cutoff
        {
            return ClassificationResult::benign();
        }

        let mut detections: Vec<Detection> = Vec::new();
        if let Some(d) = detectors::rapid_fire(window, now, &self.thresholds) {
            detections.push(d);
        }
        if let Some(d) = detectors::path_scanning(window, &self.paths, now, &self.thresholds) {
            detections.push(d);
        }
        if let Some(d) =
            detectors::agent_switching(window, user_agent, &self.paths, &self.thresholds)
        {
            detections.push(d);
        }
        if let Some(d) = detectors::resource_abuse(
            path,
            size,
            &state.ledger,
            &self.paths,
            now,
            &self.thresholds,
        ) {
            detections.push(d);
        }

        if detections.is_empty() {
            return ClassificationResult::benign();
        }

        let evidence: f64 = detections.iter().map(|d| d.confidence).sum();
        let mut combined = evidence - legitimacy * self.decision.legitimacy_discount;
        if detections.len() >= 2 {
            // Independent detectors agreeing is stronger evidence than any
            // single heuristic.
            combined += self.decision.corroboration_bonus;
        }
        let combined = combined.clamp(0.0, 1.0);

        let is_attack = combined >= self.decision.attack_threshold;
        let matched_patterns: Vec<String> = detections
            .iter()
            .map(|d| d.pattern.to_string())
            .collect();

        if is_attack {
            state.reputation.penalize(ip, self.decision.attack_penalty);
            warn!(
                "attack verdict for {}: patterns={:?} confidence={:.2}",
                ip, matched_patterns, combined
            );
        }

        ClassificationResult {
            is_attack,
            matched_patterns,
            confidence: combined,
        }
    }

    /// Current legitimacy score for an IP (neutral when never seen).
    pub fn legitimacy(&self, ip: &str) -> f64 {
        let guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.reputation.score(ip)
    }
}
