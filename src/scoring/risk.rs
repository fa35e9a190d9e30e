//! Score bands and security recommendations
//!
//! Presentation helpers derived from a finished [`ScoreReport`]. Nothing here
//! feeds back into the score.

use super::ScoreReport;
use crate::models::FingerprintRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Average,
    Risk,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreBand::Excellent,
            75..=89 => ScoreBand::Good,
            60..=74 => ScoreBand::Average,
            _ => ScoreBand::Risk,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent Security",
            ScoreBand::Good => "Good Security",
            ScoreBand::Average => "Average Security",
            ScoreBand::Risk => "Security Risk",
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub const TIP_USE_VPN: &str = "Consider using VPN services to improve network security";
pub const TIP_CHANGE_NETWORK: &str = "Your IP has security risks, consider changing network environment";
pub const TIP_AUTOMATION: &str = "Automation tools detected, may affect privacy security";
pub const TIP_SAFE: &str = "Your network environment is relatively safe, maintain good habits";
pub const TIP_REGULAR_CHECKS: &str = "Regular IP security checks are a good habit";
pub const TIP_FIREWALL: &str = "Enable firewall to protect your device";

/// Recommendations for the user, most specific first
pub fn security_tips(report: &ScoreReport, fingerprint: &FingerprintRecord) -> Vec<&'static str> {
    let mut tips = Vec::new();

    if report.final_score < 70 {
        tips.push(TIP_USE_VPN);
    }
    if !report.risk_factors.is_empty() {
        tips.push(TIP_CHANGE_NETWORK);
    }
    if fingerprint.webdriver {
        tips.push(TIP_AUTOMATION);
    }

    if tips.is_empty() {
        tips.extend([TIP_SAFE, TIP_REGULAR_CHECKS, TIP_FIREWALL]);
    }

    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(score: u8, factors: &[&str]) -> ScoreReport {
        ScoreReport {
            initial_score: 100,
            final_score: score,
            risk_factors: factors.iter().map(|f| f.to_string()).collect(),
            deduction_ledger: Vec::new(),
            floor_rule: String::new(),
        }
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(90), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(89), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(75), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(74), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(59), ScoreBand::Risk);
        assert_eq!(ScoreBand::from_score(0).to_string(), "Security Risk");
    }

    #[test]
    fn test_clean_report_gets_generic_tips() {
        let tips = security_tips(&report(100, &[]), &FingerprintRecord::default());
        assert_eq!(tips, vec![TIP_SAFE, TIP_REGULAR_CHECKS, TIP_FIREWALL]);
    }

    #[test]
    fn test_low_score_with_automation() {
        let fingerprint = FingerprintRecord {
            webdriver: true,
            ..FingerprintRecord::default()
        };
        let tips = security_tips(&report(40, &["Malware Database (critical)"]), &fingerprint);
        assert_eq!(tips, vec![TIP_USE_VPN, TIP_CHANGE_NETWORK, TIP_AUTOMATION]);
    }

    #[test]
    fn test_single_factor_above_seventy() {
        let tips = security_tips(&report(98, &["vpn"]), &FingerprintRecord::default());
        assert_eq!(tips, vec![TIP_CHANGE_NETWORK]);
    }
}
