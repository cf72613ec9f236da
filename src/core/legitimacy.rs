//! Per-IP legitimacy scoring.
//!
//! Maintains a smoothed reputation in [0, 1] estimating how human the IP's
//! traffic looks. The score outlives the sliding window on purpose: an IP
//! that goes idle keeps its reputation, while its windowed activity is
//! reclaimed. Updated on every analyzed request regardless of verdict.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::tracker::IpWindow;
use crate::utils::clamp_unit;

/// Score assumed for an IP with no recorded history.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// How soon after a page request an asset fetch still counts as part of the
/// same page load.
const PAGE_LOAD_HORIZON: Duration = Duration::from_secs(2);

// Component weights: static ratio / interval variability / load sequence.
const RATIO_WEIGHT: f64 = 0.35;
const VARIABILITY_WEIGHT: f64 = 0.25;
const SEQUENCE_WEIGHT: f64 = 0.40;

/// Reputation store plus the smoothing update.
pub struct LegitimacyScorer {
    scores: HashMap<String, f64>,
    persistence_weight: f64,
}

impl LegitimacyScorer {
    pub fn new(persistence_weight: f64) -> Self {
        Self {
            scores: HashMap::new(),
            persistence_weight,
        }
    }

    /// Current score for an IP; neutral when never seen.
    pub fn score(&self, ip: &str) -> f64 {
        self.scores.get(ip).copied().unwrap_or(NEUTRAL_SCORE)
    }

    /// Whether the IP has any recorded reputation at all.
    pub fn is_known(&self, ip: &str) -> bool {
        self.scores.contains_key(ip)
    }

    /// Fold the current window's signal into the IP's score and return the
    /// updated value. No single observation can swing the score abruptly.
    pub fn observe(
        &mut self,
        ip: &str,
        window: &IpWindow,
        now: Instant,
        current_is_static: bool,
    ) -> f64 {
        let signal = Self::signal(window, now, current_is_static);
        let old = self.score(ip);
        let new = clamp_unit(
            old * self.persistence_weight + signal * (1.0 - self.persistence_weight),
        );
        self.scores.insert(ip.to_string(), new);
        new
    }

    /// Knock the IP's score down after a positive verdict, so repeat
    /// offenders are flagged faster next time.
    pub fn penalize(&mut self, ip: &str, amount: f64) -> f64 {
        let new = clamp_unit(self.score(ip) - amount);
        self.scores.insert(ip.to_string(), new);
        new
    }

    /// Number of IPs with a recorded score. Never shrinks: reputation is
    /// process-lifetime state.
    pub fn tracked_ips(&self) -> usize {
        self.scores.len()
    }

    fn signal(window: &IpWindow, now: Instant, current_is_static: bool) -> f64 {
        let total = window.request_count();

        // Browsers interleave pages and their assets; all-assets or
        // no-assets traffic at volume is unusual in either direction.
        let ratio = if total < 5 {
            0.55
        } else {
            let static_fraction = window.static_hits() as f64 / total as f64;
            if (0.2..=0.9).contains(&static_fraction) {
                0.8
            } else {
                0.3
            }
        };

        // Human traffic has irregular inter-arrival times; metronomic
        // bursts do not.
        let variability = match window.interval_cv() {
            None => 0.55,
            Some(cv) if cv >= 0.5 => 0.8,
            Some(cv) if cv < 0.1 => 0.2,
            Some(cv) => 0.2 + (cv - 0.1) * 1.5,
        };

        // An asset fetch promptly after a page request is the shape of a
        // normal page load.
        let sequence = if current_is_static && window.page_loaded_within(now, PAGE_LOAD_HORIZON) {
            0.85
        } else {
            0.5
        };

        RATIO_WEIGHT * ratio + VARIABILITY_WEIGHT * variability + SEQUENCE_WEIGHT * sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualClock};
    use crate::core::path_classifier::PathClass;
    use crate::core::tracker::ActivityTracker;

    #[test]
    fn unknown_ip_reads_neutral() {
        let scorer = LegitimacyScorer::new(0.85);
        assert_eq!(scorer.score("8.8.8.8"), NEUTRAL_SCORE);
        assert!(!scorer.is_known("8.8.8.8"));
    }

    #[test]
    fn any_observation_makes_an_ip_known() {
        let clock = ManualClock::new();
        let mut tracker = ActivityTracker::new();
        let mut scorer = LegitimacyScorer::new(0.85);
        let window = tracker.record("5.5.5.5", "/", None, PathClass::Page, clock.now());
        scorer.observe("5.5.5.5", window, clock.now(), false);
        assert!(scorer.is_known("5.5.5.5"));
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let clock = ManualClock::new();
        let mut tracker = ActivityTracker::new();
        let mut scorer = LegitimacyScorer::new(0.85);
        for i in 0..200 {
            tracker.record("1.1.1.1", &format!("/p{}", i), None, PathClass::Page, clock.now());
            clock.advance(Duration::from_millis(7));
            let score =
                scorer.observe("1.1.1.1", tracker.window("1.1.1.1").unwrap(), clock.now(), false);
            assert!((0.0..=1.0).contains(&score));
        }
        for _ in 0..20 {
            let score = scorer.penalize("1.1.1.1", 0.3);
            assert!((0.0..=1.0).contains(&score));
        }
        assert_eq!(scorer.score("1.1.1.1"), 0.0);
    }

    #[test]
    fn browser_shaped_traffic_raises_score() {
        let clock = ManualClock::new();
        let mut tracker = ActivityTracker::new();
        let mut scorer = LegitimacyScorer::new(0.85);
        let mut score = scorer.score("2.2.2.2");

        // Page load followed by its assets, with irregular pacing.
        for _cycle in 0..6 {
            tracker.record("2.2.2.2", "/", None, PathClass::Page, clock.now());
            score = scorer.observe("2.2.2.2", tracker.window("2.2.2.2").unwrap(), clock.now(), false);
            for (i, jitter) in [23u64, 41, 17, 52, 31, 44].iter().enumerate() {
                clock.advance(Duration::from_millis(*jitter));
                tracker.record(
                    "2.2.2.2",
                    &format!("/assets/a{}.js", i),
                    None,
                    PathClass::StaticAsset,
                    clock.now(),
                );
                score =
                    scorer.observe("2.2.2.2", tracker.window("2.2.2.2").unwrap(), clock.now(), true);
            }
            clock.advance(Duration::from_secs(10));
        }
        assert!(score > NEUTRAL_SCORE);
    }

    #[test]
    fn metronomic_page_hammering_lowers_score() {
        let clock = ManualClock::new();
        let mut tracker = ActivityTracker::new();
        let mut scorer = LegitimacyScorer::new(0.85);
        let mut score = scorer.score("3.3.3.3");
        for _ in 0..30 {
            tracker.record("3.3.3.3", "/login", None, PathClass::Page, clock.now());
            score = scorer.observe("3.3.3.3", tracker.window("3.3.3.3").unwrap(), clock.now(), false);
            clock.advance(Duration::from_millis(100));
        }
        assert!(score < NEUTRAL_SCORE);
    }

    #[test]
    fn penalty_is_gradual_and_clamped() {
        let mut scorer = LegitimacyScorer::new(0.85);
        assert_eq!(scorer.penalize("4.4.4.4", 0.2), 0.3);
        assert_eq!(scorer.penalize("4.4.4.4", 0.2), 0.1);
        assert_eq!(scorer.penalize("4.4.4.4", 0.2), 0.0);
    }
}
