//! Per-IP sliding-window activity tracking.
//!
//! Each IP gets a rolling 60-second window of request timestamps, the
//! distinct paths and user agents seen in that window, and static/API hit
//! counters. Pruning is lazy: it runs for the calling IP only, on every
//! call, and deletes the whole window once no timestamps remain. Reputation
//! is deliberately not stored here so it survives window expiry.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::core::path_classifier::PathClass;

/// Trailing interval over which per-IP activity is considered.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Floor for elapsed-time computations, guarding against division by zero
/// on near-simultaneous timestamps.
pub const MIN_ELAPSED_SECS: f64 = 0.1;

struct WindowEntry {
    at: Instant,
    path: String,
    agent: Option<String>,
    class: PathClass,
}

/// One IP's activity within the trailing window.
pub struct IpWindow {
    entries: VecDeque<WindowEntry>,
    path_counts: HashMap<String, u32>,
    agent_counts: HashMap<String, u32>,
    static_hits: u32,
    api_hits: u32,
    last_page_at: Option<Instant>,
}

impl IpWindow {
    fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            path_counts: HashMap::new(),
            agent_counts: HashMap::new(),
            static_hits: 0,
            api_hits: 0,
            last_page_at: None,
        }
    }

    fn record(&mut self, path: &str, agent: Option<&str>, class: PathClass, at: Instant) {
        *self.path_counts.entry(path.to_string()).or_insert(0) += 1;
        if let Some(agent) = agent {
            *self.agent_counts.entry(agent.to_string()).or_insert(0) += 1;
        }
        match class {
            PathClass::StaticAsset => self.static_hits += 1,
            PathClass::Api => self.api_hits += 1,
            PathClass::Page => self.last_page_at = Some(at),
        }
        self.entries.push_back(WindowEntry {
            at,
            path: path.to_string(),
            agent: agent.map(str::to_string),
            class,
        });
    }

    /// Drop entries older than the window, keeping the derived sets and
    /// counters consistent with what remains. Returns true when empty.
    fn prune(&mut self, now: Instant) -> bool {
        let cutoff = now.checked_sub(WINDOW);
        while let Some(front) = self.entries.front() {
            match cutoff {
                Some(cutoff) if front.at < cutoff => {}
                _ => break,
            }
            let expired = match self.entries.pop_front() {
                Some(entry) => entry,
                None => break,
            };
            if let Some(count) = self.path_counts.get_mut(&expired.path) {
                *count -= 1;
                if *count == 0 {
                    self.path_counts.remove(&expired.path);
                }
            }
            if let Some(agent) = expired.agent {
                if let Some(count) = self.agent_counts.get_mut(&agent) {
                    *count -= 1;
                    if *count == 0 {
                        self.agent_counts.remove(&agent);
                    }
                }
            }
            match expired.class {
                PathClass::StaticAsset => self.static_hits -= 1,
                PathClass::Api => self.api_hits -= 1,
                PathClass::Page => {}
            }
        }
        if let (Some(cutoff), Some(last_page)) = (cutoff, self.last_page_at) {
            if last_page < cutoff {
                self.last_page_at = None;
            }
        }
        self.entries.is_empty()
    }

    /// Requests currently in the window.
    pub fn request_count(&self) -> usize {
        self.entries.len()
    }

    /// Distinct paths currently in the window.
    pub fn distinct_paths(&self) -> usize {
        self.path_counts.len()
    }

    /// Distinct user agents currently in the window.
    pub fn distinct_agents(&self) -> usize {
        self.agent_counts.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.path_counts.keys().map(String::as_str)
    }

    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.agent_counts.keys().map(String::as_str)
    }

    pub fn static_hits(&self) -> u32 {
        self.static_hits
    }

    pub fn api_hits(&self) -> u32 {
        self.api_hits
    }

    /// Seconds spanned by the window contents, floored at `MIN_ELAPSED_SECS`.
    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        match self.entries.front() {
            Some(earliest) => now
                .saturating_duration_since(earliest.at)
                .as_secs_f64()
                .max(MIN_ELAPSED_SECS),
            None => MIN_ELAPSED_SECS,
        }
    }

    /// Mean inter-arrival time in milliseconds over consecutive requests.
    /// None with fewer than two requests.
    pub fn mean_interval_ms(&self) -> Option<f64> {
        if self.entries.len() < 2 {
            return None;
        }
        let mut total = 0.0;
        for pair in self.entries.iter().zip(self.entries.iter().skip(1)) {
            total += pair.1.at.saturating_duration_since(pair.0.at).as_secs_f64() * 1000.0;
        }
        Some(total / (self.entries.len() - 1) as f64)
    }

    /// Coefficient of variation of inter-arrival times. Low values mean
    /// metronomic, scripted timing. None with fewer than three requests.
    pub fn interval_cv(&self) -> Option<f64> {
        if self.entries.len() < 3 {
            return None;
        }
        let intervals: Vec<f64> = self
            .entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .map(|(a, b)| b.at.saturating_duration_since(a.at).as_secs_f64())
            .collect();
        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        if mean == 0.0 {
            return Some(0.0);
        }
        let variance =
            intervals.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
        Some(variance.sqrt() / mean)
    }

    /// True when a page request happened within `horizon` before `now`.
    pub fn page_loaded_within(&self, now: Instant, horizon: Duration) -> bool {
        self.last_page_at
            .map(|at| now.saturating_duration_since(at) <= horizon)
            .unwrap_or(false)
    }
}

/// All per-IP windows, keyed by source IP.
pub struct ActivityTracker {
    windows: HashMap<String, IpWindow>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Append one request to the IP's window, creating it on first sight,
    /// and return the window it landed in.
    pub fn record(
        &mut self,
        ip: &str,
        path: &str,
        agent: Option<&str>,
        class: PathClass,
        now: Instant,
    ) -> &IpWindow {
        let window = self
            .windows
            .entry(ip.to_string())
            .or_insert_with(IpWindow::new);
        window.record(path, agent, class, now);
        window
    }

    /// Prune the IP's window; reclaim it entirely once empty.
    pub fn prune(&mut self, ip: &str, now: Instant) {
        if let Some(window) = self.windows.get_mut(ip) {
            if window.prune(now) {
                self.windows.remove(ip);
            }
        }
    }

    pub fn window(&self, ip: &str) -> Option<&IpWindow> {
        self.windows.get(ip)
    }

    /// Number of IPs with live window state.
    pub fn tracked_ips(&self) -> usize {
        self.windows.len()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}
