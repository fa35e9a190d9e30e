//! Threat Intelligence Module
//!
//! Checks an address against the five fixed threat sources. Lookups go
//! through a [`ThreatFeed`]; the shipped [`SimulatedFeed`] answers with the
//! deterministic estimator instead of calling a real reputation API.

mod classifier;
mod estimator;

pub use classifier::{classify, THREAT_THRESHOLD};
pub use estimator::{estimate, is_reserved_ip, rolling_hash};

use crate::errors::IpScoreResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Threat severity tier, ordered low < medium < high < critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Points subtracted from the score for one threat of this tier
    pub fn deduction(self) -> i32 {
        match self {
            Severity::Low => 5,
            Severity::Medium => 10,
            Severity::High => 20,
            Severity::Critical => 30,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A configured threat source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatSource {
    /// Display name
    pub name: &'static str,
    /// Key mixed into the estimator hash
    pub key: &'static str,
    /// Display weight. Not used in scoring.
    pub weight: u32,
}

/// The five sources checked on every run, in check order
pub const THREAT_SOURCES: [ThreatSource; 5] = [
    ThreatSource { name: "Malware Database", key: "malware", weight: 40 },
    ThreatSource { name: "Spam Lists", key: "spam", weight: 25 },
    ThreatSource { name: "Botnet", key: "botnet", weight: 35 },
    ThreatSource { name: "Attack Source IP", key: "attack", weight: 30 },
    ThreatSource { name: "Phishing Websites", key: "phishing", weight: 20 },
];

/// Outcome of one source check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatCheckResult {
    pub source_name: String,
    pub is_threat: bool,
    pub severity: Option<Severity>,
    pub weight: u32,
    pub details: String,
    #[serde(default)]
    pub errored: bool,
}

impl ThreatCheckResult {
    /// Flagged result with the given severity. Used by tests to hand-build inputs.
    #[cfg(test)]
    pub(crate) fn threat(source_name: &str, severity: Severity) -> Self {
        Self {
            is_threat: true,
            severity: Some(severity),
            ..Self::clear(source_name)
        }
    }

    /// Clean result carrying the named source's weight (0 for unknown names)
    #[cfg(test)]
    pub(crate) fn clear(source_name: &str) -> Self {
        let weight = THREAT_SOURCES
            .iter()
            .find(|source| source.name == source_name)
            .map_or(0, |source| source.weight);
        Self {
            source_name: source_name.to_string(),
            is_threat: false,
            severity: None,
            weight,
            details: String::new(),
            errored: false,
        }
    }

    fn from_verdict(source: &ThreatSource, verdict: ThreatVerdict) -> Self {
        Self {
            source_name: source.name.to_string(),
            is_threat: verdict.is_threat,
            severity: verdict.severity.filter(|_| verdict.is_threat),
            weight: source.weight,
            details: verdict.details,
            errored: false,
        }
    }

    fn failed(source: &ThreatSource, message: String) -> Self {
        Self {
            source_name: source.name.to_string(),
            is_threat: false,
            severity: None,
            weight: source.weight,
            details: message,
            errored: true,
        }
    }
}

/// What a feed says about one (ip, source) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatVerdict {
    pub is_threat: bool,
    pub severity: Option<Severity>,
    pub details: String,
}

/// A threat-intelligence backend
pub trait ThreatFeed: Send + Sync {
    fn lookup(&self, ip: &str, source: &ThreatSource) -> IpScoreResult<ThreatVerdict>;
}

/// Feed that answers from the deterministic estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedFeed;

impl ThreatFeed for SimulatedFeed {
    fn lookup(&self, ip: &str, source: &ThreatSource) -> IpScoreResult<ThreatVerdict> {
        Ok(basic_threat_check(ip, source.key))
    }
}

/// Reserved-range short-circuit, then estimate and classify
pub fn basic_threat_check(ip: &str, check_name: &str) -> ThreatVerdict {
    if is_reserved_ip(ip) {
        return ThreatVerdict {
            is_threat: false,
            severity: None,
            details: "Reserved/Private IP".to_string(),
        };
    }

    let probability = estimate(ip, check_name);
    let (is_threat, severity) = classify(probability);
    ThreatVerdict {
        is_threat,
        severity,
        details: format!("Risk assessment: {:.1}%", probability * 100.0),
    }
}

/// Threat intelligence engine
#[derive(Clone)]
pub struct ThreatIntelEngine {
    feed: Arc<dyn ThreatFeed>,
    /// Delay between consecutive source lookups
    pacing: Duration,
}

impl ThreatIntelEngine {
    /// Engine backed by the simulated feed, no pacing
    pub fn new() -> Self {
        Self::with_feed(Arc::new(SimulatedFeed))
    }

    pub fn with_feed(feed: Arc<dyn ThreatFeed>) -> Self {
        Self {
            feed,
            pacing: Duration::ZERO,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Check a single source. A feed failure is recorded, not propagated.
    pub fn check_source(&self, ip: &str, source: &ThreatSource) -> ThreatCheckResult {
        match self.feed.lookup(ip, source) {
            Ok(verdict) => {
                if verdict.is_threat {
                    log::debug!("{} flagged {} ({:?})", source.name, ip, verdict.severity);
                }
                ThreatCheckResult::from_verdict(source, verdict)
            }
            Err(e) => {
                log::warn!("Threat source {} failed for {}: {}", source.name, ip, e);
                ThreatCheckResult::failed(source, e.to_string())
            }
        }
    }

    /// Check every configured source in order
    pub async fn check_all(&self, ip: &str) -> Vec<ThreatCheckResult> {
        let mut results = Vec::with_capacity(THREAT_SOURCES.len());
        for (i, source) in THREAT_SOURCES.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            results.push(self.check_source(ip, source));
        }
        results
    }
}

impl Default for ThreatIntelEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IpScoreError;

    struct FlakyFeed;

    impl ThreatFeed for FlakyFeed {
        fn lookup(&self, ip: &str, source: &ThreatSource) -> IpScoreResult<ThreatVerdict> {
            if source.key == "botnet" {
                Err(IpScoreError::feed(source.name, "rate limited"))
            } else {
                SimulatedFeed.lookup(ip, source)
            }
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Critical.deduction(), 30);
        assert_eq!(Severity::Low.to_string(), "low");
    }

    #[test]
    fn test_hand_built_results_carry_source_weight() {
        let flagged = ThreatCheckResult::threat("Botnet", Severity::High);
        assert_eq!(flagged.weight, 35);
        assert!(flagged.is_threat);
        assert_eq!(flagged.severity, Some(Severity::High));

        assert_eq!(ThreatCheckResult::clear("Phishing Websites").weight, 20);
        assert_eq!(ThreatCheckResult::clear("Unlisted Feed").weight, 0);
    }

    #[test]
    fn test_private_range_never_a_threat() {
        let engine = ThreatIntelEngine::new();
        for source in &THREAT_SOURCES {
            for ip in ["10.0.0.1", "10.20.30.40", "10.255.0.9"] {
                let result = engine.check_source(ip, source);
                assert!(!result.is_threat);
                assert_eq!(result.severity, None);
                assert_eq!(result.details, "Reserved/Private IP");
            }
        }
    }

    #[tokio::test]
    async fn test_check_all_golden_address() {
        let results = ThreatIntelEngine::new().check_all("220.246.84.46").await;
        assert_eq!(results.len(), 5);

        let flagged: Vec<_> = results.iter().filter(|r| r.is_threat).collect();
        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].source_name, "Malware Database");
        assert_eq!(flagged[0].severity, Some(Severity::Critical));
        assert_eq!(flagged[0].details, "Risk assessment: 95.9%");
        assert_eq!(flagged[1].source_name, "Attack Source IP");
        assert_eq!(flagged[1].severity, Some(Severity::Critical));
        assert!(results.iter().filter(|r| !r.is_threat).all(|r| r.severity.is_none()));
    }

    #[tokio::test]
    async fn test_feed_failure_is_isolated() {
        let engine = ThreatIntelEngine::with_feed(Arc::new(FlakyFeed));
        let results = engine.check_all("1.2.3.4").await;
        assert_eq!(results.len(), 5);

        let botnet = &results[2];
        assert!(botnet.errored);
        assert!(!botnet.is_threat);
        assert!(botnet.details.contains("rate limited"));

        // 1.2.3.4: malware 0.835 (low), spam 0.935 (high)
        assert_eq!(results[0].severity, Some(Severity::Low));
        assert_eq!(results[1].severity, Some(Severity::High));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_sources() {
        let engine = ThreatIntelEngine::new().with_pacing(Duration::from_millis(100));
        let start = tokio::time::Instant::now();
        let results = engine.check_all("8.8.8.8").await;
        assert_eq!(results.len(), 5);
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
