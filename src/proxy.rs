//! Proxy/VPN heuristic
//!
//! Scores org/ISP keywords and the ASN against the provider tables. Nothing
//! here touches the network: it only reads already-fetched metadata.

use crate::models::IpRecord;
use crate::tables::{AsnRule, ProviderRule, ScoringTables};
use crate::utils::asn_number;
use serde::{Deserialize, Serialize};

/// Detection score above which a proxy counts as detected
pub const DETECTION_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Direct,
    Cloud,
    Datacenter,
    Vpn,
    Hosting,
    Overseas,
    Cdn,
}

impl ProxyType {
    /// Human-readable label for the dashboard
    pub fn display_name(self) -> &'static str {
        match self {
            ProxyType::Direct => "Direct Connection",
            ProxyType::Cloud => "Cloud Server",
            ProxyType::Datacenter => "Data Center",
            ProxyType::Vpn => "VPN Service",
            ProxyType::Hosting => "Hosting Service",
            ProxyType::Overseas => "Overseas Hosting",
            ProxyType::Cdn => "CDN",
        }
    }

    /// Score deduction once a detection clears the confidence gate
    pub fn deduction(self) -> i32 {
        match self {
            ProxyType::Vpn => 8,
            ProxyType::Datacenter => 5,
            ProxyType::Overseas => 3,
            ProxyType::Cloud | ProxyType::Hosting | ProxyType::Cdn => 0,
            ProxyType::Direct => 3,
        }
    }
}

impl std::fmt::Display for ProxyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProxyType::Direct => "direct",
            ProxyType::Cloud => "cloud",
            ProxyType::Datacenter => "datacenter",
            ProxyType::Vpn => "vpn",
            ProxyType::Hosting => "hosting",
            ProxyType::Overseas => "overseas",
            ProxyType::Cdn => "cdn",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyAssessment {
    pub detected: bool,
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,
    /// In [0, 1]. The match score when detected, `1 - score` otherwise.
    pub confidence: f64,
    pub penalty: i32,
}

impl ProxyAssessment {
    pub fn direct() -> Self {
        Self {
            detected: false,
            proxy_type: ProxyType::Direct,
            confidence: 1.0,
            penalty: 0,
        }
    }

    /// Risk label shown next to the detection
    pub fn risk_level(&self) -> &'static str {
        if !self.detected {
            return "Low";
        }
        match self.proxy_type {
            ProxyType::Vpn | ProxyType::Datacenter => "High",
            _ => "Medium",
        }
    }
}

/// Running best match while walking the tables
struct Indicators {
    score: f64,
    proxy_type: ProxyType,
    penalty: i32,
}

impl Indicators {
    /// Raise the score to `weight`; the row only takes over when it strictly
    /// raised it, so the first row at the maximum weight wins.
    fn offer(&mut self, weight: f64, proxy_type: ProxyType, penalty: i32) {
        if weight > self.score {
            self.score = weight;
            self.proxy_type = proxy_type;
            self.penalty = penalty;
        }
    }
}

/// Proxy/VPN detector over injected keyword and ASN tables
#[derive(Debug, Clone)]
pub struct ProxyDetector {
    providers: Vec<ProviderRule>,
    asn_rules: Vec<AsnRule>,
}

impl ProxyDetector {
    pub fn new(tables: &ScoringTables) -> Self {
        Self {
            providers: tables.proxy_providers.clone(),
            asn_rules: tables.asn_rules.clone(),
        }
    }

    fn indicators(&self, record: &IpRecord) -> Indicators {
        let mut found = Indicators {
            score: 0.0,
            proxy_type: ProxyType::Direct,
            penalty: 0,
        };

        let org = record.org().unwrap_or_default().to_lowercase();
        let isp = record.isp().unwrap_or_default().to_lowercase();

        for rule in &self.providers {
            let hit = rule
                .keywords
                .iter()
                .any(|k| org.contains(k.as_str()) || isp.contains(k.as_str()));
            if hit {
                found.offer(rule.weight, rule.proxy_type, rule.penalty);
            }
        }

        if let Some(asn) = record.asn().and_then(asn_number) {
            for rule in self.asn_rules.iter().filter(|r| r.contains(asn)) {
                let penalty = (rule.weight * 20.0).round() as i32;
                found.offer(rule.weight, rule.proxy_type, penalty);
            }
        }

        found
    }

    /// Assess an IP record. Pure: repeated calls on the same record agree.
    pub fn assess(&self, record: &IpRecord) -> ProxyAssessment {
        let found = self.indicators(record);

        if found.score > DETECTION_THRESHOLD {
            ProxyAssessment {
                detected: true,
                proxy_type: found.proxy_type,
                confidence: found.score,
                penalty: found.penalty,
            }
        } else {
            ProxyAssessment {
                detected: false,
                proxy_type: ProxyType::Direct,
                confidence: 1.0 - found.score,
                penalty: 0,
            }
        }
    }
}

impl Default for ProxyDetector {
    fn default() -> Self {
        Self::new(&ScoringTables::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(org: &str, isp: &str, asn: Option<&str>) -> IpRecord {
        IpRecord {
            ip: Some("203.0.113.7".to_string()),
            org: Some(org.to_string()),
            isp: Some(isp.to_string()),
            asn: asn.map(str::to_string),
            ..IpRecord::default()
        }
    }

    #[test]
    fn test_vpn_keyword_detected_with_high_confidence() {
        let result = ProxyDetector::default().assess(&record("NordVPN S.A.", "", None));
        assert!(result.detected);
        assert_eq!(result.proxy_type, ProxyType::Vpn);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.penalty, 25);
        assert_eq!(result.risk_level(), "High");
    }

    #[test]
    fn test_keyword_matches_isp_field() {
        let result = ProxyDetector::default().assess(&record("", "Linode LLC", None));
        assert!(result.detected);
        assert_eq!(result.proxy_type, ProxyType::Datacenter);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.penalty, 22);
    }

    #[test]
    fn test_higher_weight_overrides_earlier_match() {
        // "amazon" (cloud 0.8) then "proxy" (vpn 0.95)
        let result = ProxyDetector::default().assess(&record("Amazon Proxy Services", "", None));
        assert_eq!(result.proxy_type, ProxyType::Vpn);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_first_row_wins_at_equal_weight() {
        // cloud (0.8) and overseas (0.8) both match
        let result = ProxyDetector::default().assess(&record("Amazon OVH Reseller", "", None));
        assert!(result.detected);
        assert_eq!(result.proxy_type, ProxyType::Cloud);
        assert_eq!(result.penalty, 18);
    }

    #[test]
    fn test_hosting_keyword_alone_not_detected() {
        let result = ProxyDetector::default().assess(&record("Acme Hosting", "", None));
        assert!(!result.detected);
        assert_eq!(result.proxy_type, ProxyType::Direct);
        assert!((result.confidence - 0.3).abs() < 1e-9);
        assert_eq!(result.risk_level(), "Low");
    }

    #[test]
    fn test_cdn_asn_below_detection() {
        let result = ProxyDetector::default().assess(&record("Cloudflare, Inc.", "", Some("AS13335")));
        assert!(!result.detected);
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_amazon_asn_does_not_beat_keyword() {
        let detector = ProxyDetector::default();
        let asn_only = detector.assess(&record("Unlabelled", "", Some("AS16509")));
        assert!(!asn_only.detected, "0.7 is not above the threshold");
        assert!((asn_only.confidence - 0.3).abs() < 1e-9);

        let both = detector.assess(&record("Amazon.com, Inc.", "", Some("AS16509")));
        assert!(both.detected);
        assert_eq!(both.proxy_type, ProxyType::Cloud);
        assert_eq!(both.penalty, 18);
    }

    fn detector_with_asn(asn: u64, proxy_type: ProxyType, weight: f64) -> ProxyDetector {
        let mut tables = ScoringTables::builtin();
        tables.asn_rules.push(AsnRule {
            owner: "Example Transit".to_string(),
            min: asn,
            max: asn,
            proxy_type,
            weight,
        });
        ProxyDetector::new(&tables)
    }

    #[test]
    fn test_asn_penalty_scales_weight() {
        let detector = detector_with_asn(9009, ProxyType::Vpn, 0.95);
        let result = detector.assess(&record("Unlabelled", "", Some("AS9009")));
        assert!(result.detected);
        assert_eq!(result.proxy_type, ProxyType::Vpn);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.penalty, 19);
    }

    #[test]
    fn test_heavier_asn_row_overrides_keyword() {
        let detector = detector_with_asn(9009, ProxyType::Vpn, 0.95);
        // "amazon" keyword row is cloud 0.8 with penalty 18
        let result = detector.assess(&record("Amazon.com, Inc.", "", Some("AS9009")));
        assert_eq!(result.proxy_type, ProxyType::Vpn);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.penalty, 19);

        // An ASN row at the keyword's weight leaves the keyword in place
        let tied = detector_with_asn(9009, ProxyType::Overseas, 0.9);
        let result = tied.assess(&record("Linode LLC", "", Some("AS9009")));
        assert_eq!(result.proxy_type, ProxyType::Datacenter);
        assert_eq!(result.penalty, 22);
    }

    #[test]
    fn test_missing_org_means_no_evidence() {
        let detector = ProxyDetector::default();
        let result = detector.assess(&IpRecord::detection_failed());
        assert_eq!(result, ProxyAssessment::direct());

        let garbage_asn = detector.assess(&record("", "", Some("none")));
        assert_eq!(garbage_asn, ProxyAssessment::direct());
    }

    #[test]
    fn test_assess_is_idempotent() {
        let detector = ProxyDetector::default();
        let input = record("Hetzner Online GmbH", "", Some("AS24940"));
        assert_eq!(detector.assess(&input), detector.assess(&input));
    }

    #[test]
    fn test_type_deductions() {
        assert_eq!(ProxyType::Vpn.deduction(), 8);
        assert_eq!(ProxyType::Datacenter.deduction(), 5);
        assert_eq!(ProxyType::Overseas.deduction(), 3);
        assert_eq!(ProxyType::Cloud.deduction(), 0);
        assert_eq!(ProxyType::Hosting.deduction(), 0);
        assert_eq!(ProxyType::Cdn.deduction(), 0);
        assert_eq!(ProxyType::Datacenter.display_name(), "Data Center");
    }
}
