//! Geo-consistency checks
//!
//! Cross-validates what the IP lookup says about location against what the
//! browser reports: timezone, language and round-trip latency. Each sub-check
//! adds its own penalty; the aggregator only looks at the total.

use crate::models::{FingerprintRecord, IpRecord, NetworkRecord};
use crate::tables::ScoringTables;
use serde::{Deserialize, Serialize};

pub const TIMEZONE_PENALTY: i32 = 8;
pub const LANGUAGE_PENALTY: i32 = 5;
pub const LATENCY_PENALTY: i32 = 3;

/// Hour distance beyond which two zones disagree
const MAX_TIMEZONE_HOURS: f64 = 2.0;

pub const REASON_TIMEZONE: &str = "timezone mismatch";
pub const REASON_LANGUAGE: &str = "language anomaly";
pub const REASON_LATENCY: &str = "latency anomaly";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoConsistencyResult {
    pub consistent: bool,
    pub penalty: i32,
    pub reasons: Vec<String>,
}

impl GeoConsistencyResult {
    pub fn consistent() -> Self {
        Self {
            consistent: true,
            penalty: 0,
            reasons: Vec::new(),
        }
    }

    /// Reasons joined for display
    pub fn summary(&self) -> String {
        if self.reasons.is_empty() {
            "Location information consistent".to_string()
        } else {
            self.reasons.join(", ")
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeoConsistencyChecker {
    tables: ScoringTables,
}

impl GeoConsistencyChecker {
    pub fn new(tables: &ScoringTables) -> Self {
        Self {
            tables: tables.clone(),
        }
    }

    /// Absolute hour distance between two zones; unlisted zones are UTC+0
    pub fn timezone_distance(&self, a: &str, b: &str) -> f64 {
        (self.tables.timezone_offset(a) - self.tables.timezone_offset(b)).abs()
    }

    pub fn check(
        &self,
        ip: &IpRecord,
        network: &NetworkRecord,
        fingerprint: &FingerprintRecord,
    ) -> GeoConsistencyResult {
        let mut result = GeoConsistencyResult::consistent();
        let mut flag = |reason: &str, penalty: i32| {
            result.reasons.push(reason.to_string());
            result.penalty += penalty;
        };

        if let (Some(ip_zone), Some(browser_zone)) = (ip.timezone(), network.time_zone()) {
            if ip_zone != browser_zone
                && self.timezone_distance(ip_zone, browser_zone) > MAX_TIMEZONE_HOURS
            {
                flag(REASON_TIMEZONE, TIMEZONE_PENALTY);
            }
        }

        let country = ip.country_code().unwrap_or_default();

        if let Some(lang) = fingerprint.primary_language() {
            let expected = self.tables.expected_languages(country);
            if !expected.is_empty() && !expected.iter().any(|e| e == lang) {
                flag(REASON_LANGUAGE, LANGUAGE_PENALTY);
            }
        }

        if let Some(latency) = network.latency_ms() {
            let expected = self.tables.expected_latency_ms(country);
            if latency > expected * 2.0 {
                flag(REASON_LATENCY, LATENCY_PENALTY);
            }
        }

        result.consistent = result.reasons.is_empty();
        result
    }
}

impl Default for GeoConsistencyChecker {
    fn default() -> Self {
        Self::new(&ScoringTables::builtin())
    }
}
