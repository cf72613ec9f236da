//! Behavioral Traffic Classifier
//!
//! Inspects every inbound request's (source IP, path, user agent, payload
//! size) and emits a real-time attack / not-attack verdict, combining
//! sliding-window rate analysis, pattern detectors, and an adaptive per-IP
//! legitimacy score. The verdict drives IP banning in an external
//! enforcement layer; this crate performs no blocking itself.

pub mod api;
pub mod config;
pub mod core;
pub mod models;
pub mod utils;
