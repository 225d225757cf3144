//! TrialIQ: deterministic clinical-trial eligibility matching.
//!
//! The library exposes the trial catalog, the weighted-rule scoring engine,
//! and the service/HTTP boundary around them. The binary in `main.rs` wires
//! everything up behind a small CLI.

pub mod config;
pub mod error;
pub mod matching;
pub mod telemetry;
