//! Input records produced by the gatherers and consumed by the scoring engine.
//!
//! All fields are optional: geolocation providers disagree on what they return
//! and any of them may be down. Sentinel strings such as `"Unknown"` are read
//! back as absent through the accessor methods.

use serde::{Deserialize, Serialize};

/// Values the gatherers write in place of a missing field.
const SENTINELS: &[&str] = &["unknown", "detection failed", "error", "n/a"];

fn known(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !SENTINELS.contains(&v.to_lowercase().as_str()))
}

/// A numeric measurement that browsers sometimes report as text (`"Unknown"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Text(String),
}

impl Reading {
    /// Numeric value, if one was measured
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Reading::Text("Unknown".to_string())
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Text(t) => write!(f, "{}", t),
        }
    }
}

/// IP geolocation record as returned by third-party lookup services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpRecord {
    pub ip: Option<String>,
    pub country: Option<String>,
    #[serde(alias = "countryCode")]
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub postal: Option<String>,
    pub timezone: Option<String>,
    pub org: Option<String>,
    pub isp: Option<String>,
    pub asn: Option<String>,
}

impl IpRecord {
    /// Record for a bare address with no geolocation data
    pub fn for_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }

    /// Placeholder used when the IP lookup fails or times out
    pub fn detection_failed() -> Self {
        Self {
            ip: Some("Detection Failed".to_string()),
            country: Some("Unknown".to_string()),
            ..Self::default()
        }
    }

    pub fn ip(&self) -> Option<&str> {
        known(&self.ip)
    }

    pub fn country_code(&self) -> Option<&str> {
        known(&self.country_code)
    }

    pub fn timezone(&self) -> Option<&str> {
        known(&self.timezone)
    }

    pub fn org(&self) -> Option<&str> {
        known(&self.org)
    }

    pub fn isp(&self) -> Option<&str> {
        known(&self.isp)
    }

    pub fn asn(&self) -> Option<&str> {
        known(&self.asn)
    }

    /// Overlay the non-empty fields of `other` onto this record
    pub fn merge(&mut self, other: IpRecord) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.ip, other.ip);
        take(&mut self.country, other.country);
        take(&mut self.country_code, other.country_code);
        take(&mut self.region, other.region);
        take(&mut self.city, other.city);
        take(&mut self.postal, other.postal);
        take(&mut self.timezone, other.timezone);
        take(&mut self.org, other.org);
        take(&mut self.isp, other.isp);
        take(&mut self.asn, other.asn);
    }
}

/// Result of the WebRTC leak probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebRtcStatus {
    #[serde(rename = "Detected")]
    Detected,
    #[default]
    #[serde(rename = "Not detected")]
    NotDetected,
    #[serde(rename = "Not supported")]
    NotSupported,
}

impl std::fmt::Display for WebRtcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebRtcStatus::Detected => write!(f, "Detected"),
            WebRtcStatus::NotDetected => write!(f, "Not detected"),
            WebRtcStatus::NotSupported => write!(f, "Not supported"),
        }
    }
}

/// Browser-derived device fingerprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FingerprintRecord {
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub platform: Option<String>,
    pub hardware_concurrency: Reading,
    pub device_memory: Reading,
    pub color_depth: Option<u32>,
    pub screen_resolution: Option<String>,
    pub timezone_offset: Option<i32>,
    pub webdriver: bool,
    #[serde(rename = "webRTC")]
    pub web_rtc: WebRtcStatus,
}

impl FingerprintRecord {
    /// Primary language subtag (`"en"` for `"en-US"`)
    pub fn primary_language(&self) -> Option<&str> {
        known(&self.language).and_then(|lang| lang.split('-').next())
    }
}

/// One resolver measured by the DNS probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsServer {
    pub server: String,
    pub provider: String,
    pub location: String,
    pub latency: Reading,
}

/// Network measurements taken from the browser side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkRecord {
    pub latency: Reading,
    pub dns: Vec<DnsServer>,
    pub time_zone: Option<String>,
}

impl NetworkRecord {
    /// Browser-reported IANA zone
    pub fn time_zone(&self) -> Option<&str> {
        known(&self.time_zone)
    }

    /// Measured round-trip latency in milliseconds. Zero counts as unmeasured.
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency.value().filter(|ms| *ms > 0.0)
    }
}
