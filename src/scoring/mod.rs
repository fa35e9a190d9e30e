//! Score Aggregation Module
//!
//! Folds the threat results, proxy assessment and geo-consistency result of a
//! single run into a 0-100 score, the ordered risk-factor list and the
//! deduction ledger. Split into submodules:
//! - `floor`: ordered floor policy applied after deductions
//! - `risk`: score bands and security recommendations

pub mod floor;
pub mod risk;

use crate::geo::GeoConsistencyResult;
use crate::proxy::ProxyAssessment;
use crate::threat_intel::{Severity, ThreatCheckResult};
use floor::{select_rule, FloorContext};
use serde::{Deserialize, Serialize};

pub const INITIAL_SCORE: i32 = 100;
/// Proxy detections at or below this confidence never cost points
pub const PROXY_CONFIDENCE_GATE: f64 = 0.9;
/// Geo penalty above which the anomaly counts as severe
pub const SEVERE_GEO_PENALTY: i32 = 10;
/// Flat deduction for a severe geo anomaly, whatever the checker's penalty
pub const GEO_DEDUCTION: i32 = 2;
pub const SEVERE_GEO_FACTOR: &str = "severe geographic anomaly";

/// One line of the deduction ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub label: String,
    pub amount: i32,
}

impl std::fmt::Display for Deduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: -{}", self.label, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub initial_score: i32,
    pub final_score: u8,
    /// Detection order: threats, then proxy, then geo
    pub risk_factors: Vec<String>,
    pub deduction_ledger: Vec<Deduction>,
    /// Name of the floor rule that fired
    pub floor_rule: String,
}

impl ScoreReport {
    pub fn total_deducted(&self) -> i32 {
        self.deduction_ledger.iter().map(|d| d.amount).sum()
    }
}

/// Stateless score aggregator. Every call is a pure fold over its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(
        &self,
        threats: &[ThreatCheckResult],
        proxy: &ProxyAssessment,
        geo: &GeoConsistencyResult,
    ) -> ScoreReport {
        let mut score = INITIAL_SCORE;
        let mut risk_factors = Vec::new();
        let mut ledger = Vec::new();

        let mut threat_deduction = 0;
        for threat in threats.iter().filter(|t| t.is_threat) {
            let severity = threat_severity(threat);
            let amount = severity.deduction();
            threat_deduction += amount;
            risk_factors.push(format!("{} ({})", threat.source_name, severity));
            ledger.push(Deduction {
                label: format!("Threat Intelligence-{}", threat.source_name),
                amount,
            });
        }
        score -= threat_deduction;

        if proxy.detected && proxy.confidence > PROXY_CONFIDENCE_GATE {
            let amount = proxy.proxy_type.deduction();
            if amount > 0 {
                score -= amount;
                risk_factors.push(proxy.proxy_type.to_string());
                ledger.push(Deduction {
                    label: format!("Proxy Detection-{}", proxy.proxy_type),
                    amount,
                });
            }
        }

        if !geo.consistent && geo.penalty > SEVERE_GEO_PENALTY {
            score -= GEO_DEDUCTION;
            risk_factors.push(SEVERE_GEO_FACTOR.to_string());
            ledger.push(Deduction {
                label: "Geolocation".to_string(),
                amount: GEO_DEDUCTION,
            });
        }

        let ctx = FloorContext {
            risk_factor_count: risk_factors.len(),
            has_critical: threats.iter().any(|t| is_threat_of(t, Severity::Critical)),
            has_high: threats.iter().any(|t| is_threat_of(t, Severity::High)),
        };
        let rule = select_rule(&ctx);
        let floored = rule.action.apply(score);
        log::debug!(
            "Raw score {} with {} risk factor(s); floor rule '{}' -> {}",
            score,
            ctx.risk_factor_count,
            rule.name,
            floored
        );

        ScoreReport {
            initial_score: INITIAL_SCORE,
            final_score: floored.clamp(0, 100) as u8,
            risk_factors,
            deduction_ledger: ledger,
            floor_rule: rule.name.to_string(),
        }
    }
}

/// A flagged result always carries a tier; a malformed one counts as low.
fn threat_severity(threat: &ThreatCheckResult) -> Severity {
    threat.severity.unwrap_or(Severity::Low)
}

fn is_threat_of(threat: &ThreatCheckResult, severity: Severity) -> bool {
    threat.is_threat && threat.severity == Some(severity)
}
