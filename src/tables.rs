//! Lookup tables driving the proxy, geo and ISP heuristics.
//!
//! The built-in tables reproduce the production values. A JSON file with the
//! same shape can replace them wholesale (`--tables`).

use crate::errors::{IpScoreError, IpScoreResult};
use crate::proxy::ProxyType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Keyword row matched against the lower-cased org and ISP fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRule {
    pub keywords: Vec<String>,
    pub proxy_type: ProxyType,
    pub penalty: i32,
    pub weight: f64,
}

/// Inclusive ASN range row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsnRule {
    pub owner: String,
    pub min: u64,
    pub max: u64,
    pub proxy_type: ProxyType,
    pub weight: f64,
}

impl AsnRule {
    pub fn contains(&self, asn: u64) -> bool {
        asn >= self.min && asn <= self.max
    }
}

/// All heuristic tables, injected into each component at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    pub proxy_providers: Vec<ProviderRule>,
    pub asn_rules: Vec<AsnRule>,
    /// IANA zone → UTC offset in hours. Unlisted zones count as 0.
    pub timezone_offsets: HashMap<String, f64>,
    /// ISO country code → expected primary language subtags
    pub country_languages: HashMap<String, Vec<String>>,
    /// ISO country code → expected latency in ms
    pub country_latency_ms: HashMap<String, f64>,
    pub default_latency_ms: f64,
    /// Org keywords that mark a cloud or hosting ISP
    pub risky_isp_keywords: Vec<String>,
}

fn provider(keywords: &[&str], proxy_type: ProxyType, penalty: i32, weight: f64) -> ProviderRule {
    ProviderRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        proxy_type,
        penalty,
        weight,
    }
}

fn asn(owner: &str, number: u64, proxy_type: ProxyType, weight: f64) -> AsnRule {
    AsnRule {
        owner: owner.to_string(),
        min: number,
        max: number,
        proxy_type,
        weight,
    }
}

impl ScoringTables {
    /// Built-in production tables
    pub fn builtin() -> Self {
        let proxy_providers = vec![
            provider(&["amazon", "aws", "ec2"], ProxyType::Cloud, 18, 0.8),
            provider(&["google", "gcp", "compute"], ProxyType::Cloud, 18, 0.8),
            provider(&["microsoft", "azure"], ProxyType::Cloud, 18, 0.8),
            provider(&["digitalocean", "linode", "vultr"], ProxyType::Datacenter, 22, 0.9),
            provider(&["vpn", "proxy", "anonymous"], ProxyType::Vpn, 25, 0.95),
            provider(&["hosting", "server", "datacenter"], ProxyType::Hosting, 15, 0.7),
            provider(&["ovh", "hetzner", "contabo"], ProxyType::Overseas, 20, 0.8),
        ];

        // Two distinct CDN-labelled rows with the same weight are kept apart.
        let asn_rules = vec![
            asn("Cloudflare", 13335, ProxyType::Cdn, 0.3),
            asn("DigitalOcean", 14061, ProxyType::Cdn, 0.3),
            asn("Amazon", 16509, ProxyType::Cloud, 0.7),
        ];

        let timezone_offsets: HashMap<String, f64> = [
            ("America/New_York", -5.0),
            ("America/Los_Angeles", -8.0),
            ("America/Chicago", -6.0),
            ("Europe/London", 0.0),
            ("Europe/Paris", 1.0),
            ("Europe/Moscow", 3.0),
            ("Asia/Tokyo", 9.0),
            ("Asia/Shanghai", 8.0),
            ("Asia/Mumbai", 5.5),
            ("Australia/Sydney", 10.0),
        ]
        .into_iter()
        .map(|(zone, hours)| (zone.to_string(), hours))
        .collect();

        let country_languages: HashMap<String, Vec<String>> = [
            ("US", &["en"][..]),
            ("CN", &["zh"][..]),
            ("JP", &["ja"][..]),
            ("KR", &["ko"][..]),
            ("DE", &["de"][..]),
            ("FR", &["fr"][..]),
            ("ES", &["es"][..]),
            ("IT", &["it"][..]),
            ("RU", &["ru"][..]),
            ("BR", &["pt"][..]),
            ("IN", &["en", "hi"][..]),
        ]
        .into_iter()
        .map(|(cc, langs)| (cc.to_string(), langs.iter().map(|l| l.to_string()).collect()))
        .collect();

        let country_latency_ms: HashMap<String, f64> = [
            ("US", 50.0),
            ("CN", 200.0),
            ("JP", 100.0),
            ("KR", 80.0),
            ("DE", 30.0),
            ("FR", 40.0),
            ("GB", 20.0),
            ("AU", 150.0),
        ]
        .into_iter()
        .map(|(cc, ms)| (cc.to_string(), ms))
        .collect();

        let risky_isp_keywords: Vec<String> = [
            "amazon", "aws", "google", "gcp", "microsoft", "azure", "digitalocean", "linode",
            "vultr", "ovh", "hetzner", "hosting", "server", "datacenter", "cloud",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();

        Self {
            proxy_providers,
            asn_rules,
            timezone_offsets,
            country_languages,
            country_latency_ms,
            default_latency_ms: 100.0,
            risky_isp_keywords,
        }
    }

    /// Load replacement tables from a JSON file
    pub fn from_file(path: &Path) -> IpScoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| IpScoreError::io(e, Some(path.to_path_buf())))?;
        let tables: ScoringTables = serde_json::from_str(&raw)?;
        log::info!(
            "Loaded scoring tables from {:?}: {} provider rules, {} ASN rules",
            path,
            tables.proxy_providers.len(),
            tables.asn_rules.len()
        );
        tables.normalized()
    }

    /// Validate weights and ranges, lower-case all keywords
    pub fn normalized(mut self) -> IpScoreResult<Self> {
        for rule in &mut self.proxy_providers {
            if !(0.0..=1.0).contains(&rule.weight) {
                return Err(IpScoreError::Tables(format!(
                    "provider weight {} outside [0, 1]",
                    rule.weight
                )));
            }
            rule.keywords.retain(|k| !k.trim().is_empty());
            if rule.keywords.is_empty() {
                return Err(IpScoreError::Tables(format!(
                    "{} provider rule has no keywords",
                    rule.proxy_type
                )));
            }
            for keyword in &mut rule.keywords {
                *keyword = keyword.trim().to_lowercase();
            }
        }

        for rule in &self.asn_rules {
            if rule.min > rule.max {
                return Err(IpScoreError::Tables(format!(
                    "ASN rule '{}' has min {} > max {}",
                    rule.owner, rule.min, rule.max
                )));
            }
            if !(0.0..=1.0).contains(&rule.weight) {
                return Err(IpScoreError::Tables(format!(
                    "ASN rule '{}' weight {} outside [0, 1]",
                    rule.owner, rule.weight
                )));
            }
        }

        for keyword in &mut self.risky_isp_keywords {
            *keyword = keyword.trim().to_lowercase();
        }
        self.risky_isp_keywords.retain(|k| !k.is_empty());

        Ok(self)
    }

    pub fn timezone_offset(&self, zone: &str) -> f64 {
        self.timezone_offsets.get(zone).copied().unwrap_or(0.0)
    }

    pub fn expected_languages(&self, country_code: &str) -> &[String] {
        self.country_languages
            .get(country_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn expected_latency_ms(&self, country_code: &str) -> f64 {
        self.country_latency_ms
            .get(country_code)
            .copied()
            .unwrap_or(self.default_latency_ms)
    }
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self::builtin()
    }
}
