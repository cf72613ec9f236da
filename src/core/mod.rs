//! Core functionality for the behavioral traffic classifier.
//!
//! This module contains the classification pipeline: path classification,
//! per-IP sliding-window tracking, the global request ledger, the heuristic
//! detectors, the legitimacy scorer, and the decision combiner.

pub mod classifier;
pub mod clock;
pub mod detectors;
pub mod ledger;
pub mod legitimacy;
pub mod path_classifier;
pub mod tracker;

pub use classifier::TrafficClassifier;
pub use clock::{Clock, SystemClock};
pub use detectors::Detection;
pub use ledger::{LedgerEntry, RequestLedger, LEDGER_CAPACITY};
pub use legitimacy::LegitimacyScorer;
pub use path_classifier::{PathClass, PathClassifier};
pub use tracker::{ActivityTracker, IpWindow, WINDOW};
