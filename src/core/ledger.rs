//! Global request ledger.
//!
//! A fixed-capacity ring buffer of recent requests across all IPs, used by
//! the resource-abuse detector to spot many distinct sources converging on
//! the same expensive path. Never consulted for single-IP decisions.

use std::collections::HashSet;
use std::time::Instant;

/// Ring buffer capacity; the oldest entry is overwritten once full.
pub const LEDGER_CAPACITY: usize = 1000;

/// One request as seen by the ledger.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub ip: String,
    pub path: String,
    pub user_agent: Option<String>,
    pub timestamp: Instant,
    pub size: u64,
    pub is_static: bool,
    pub is_api: bool,
}

/// Bounded cross-IP request history with overwrite-oldest semantics.
pub struct RequestLedger {
    entries: Vec<LedgerEntry>,
    next: usize,
    capacity: usize,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        // A zero-capacity ring has nowhere to write; floor it at one.
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            next: 0,
            capacity,
        }
    }

    /// Append an entry, overwriting the oldest once at capacity.
    pub fn push(&mut self, entry: LedgerEntry) {
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.next] = entry;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct IPs that hit `path` at or after `since`. A `since` of `None`
    /// considers the whole buffer.
    pub fn distinct_ips_for_path(&self, path: &str, since: Option<Instant>) -> usize {
        let mut ips = HashSet::new();
        for entry in &self.entries {
            if entry.path != path {
                continue;
            }
            if let Some(since) = since {
                if entry.timestamp < since {
                    continue;
                }
            }
            ips.insert(entry.ip.as_str());
        }
        ips.len()
    }
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ip: &str, path: &str, timestamp: Instant) -> LedgerEntry {
        LedgerEntry {
            ip: ip.to_string(),
            path: path.to_string(),
            user_agent: None,
            timestamp,
            size: 0,
            is_static: false,
            is_api: false,
        }
    }

    #[test]
    fn overwrites_oldest_at_capacity() {
        let now = Instant::now();
        let mut ledger = RequestLedger::with_capacity(3);
        for i in 0..5 {
            ledger.push(entry(&format!("10.0.0.{}", i), "/x", now));
        }
        assert_eq!(ledger.len(), 3);
        // Entries 0 and 1 were overwritten by 3 and 4.
        assert_eq!(ledger.distinct_ips_for_path("/x", None), 3);
    }

    #[test]
    fn zero_capacity_is_floored() {
        let now = Instant::now();
        let mut ledger = RequestLedger::with_capacity(0);
        ledger.push(entry("1.1.1.1", "/x", now));
        ledger.push(entry("2.2.2.2", "/x", now));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.distinct_ips_for_path("/x", None), 1);
    }

    #[test]
    fn distinct_ips_are_deduplicated_per_path() {
        let now = Instant::now();
        let mut ledger = RequestLedger::new();
        ledger.push(entry("1.1.1.1", "/search", now));
        ledger.push(entry("1.1.1.1", "/search", now));
        ledger.push(entry("2.2.2.2", "/search", now));
        ledger.push(entry("3.3.3.3", "/other", now));
        assert_eq!(ledger.distinct_ips_for_path("/search", None), 2);
        assert_eq!(ledger.distinct_ips_for_path("/other", None), 1);
        assert_eq!(ledger.distinct_ips_for_path("/missing", None), 0);
    }

    #[test]
    fn since_filter_excludes_older_entries() {
        let base = Instant::now();
        let later = base + std::time::Duration::from_secs(90);
        let mut ledger = RequestLedger::new();
        ledger.push(entry("1.1.1.1", "/search", base));
        ledger.push(entry("2.2.2.2", "/search", later));
        assert_eq!(
            ledger.distinct_ips_for_path("/search", Some(base + std::time::Duration::from_secs(60))),
            1
        );
    }
}
