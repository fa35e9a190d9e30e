//! IP Reputation Scorer
//!
//! Aggregates IP geolocation, threat-intelligence and browser-derived signals
//! into a single 0-100 reputation score with an ordered risk-factor list and a
//! deduction ledger.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gatherers;
pub mod geo;
pub mod isp;
pub mod models;
pub mod proxy;
pub mod reporter;
pub mod scoring;
pub mod tables;
pub mod threat_intel;
pub mod ui;
pub mod utils;

pub use analysis::{AnalysisOutcome, AnalysisRun};
pub use config::AnalysisConfig;
pub use errors::{IpScoreError, IpScoreResult};
pub use scoring::{ScoreAggregator, ScoreReport};
