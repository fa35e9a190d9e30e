//! Input gatherers
//!
//! Each gatherer produces one of the engine's input records. Gatherers run as
//! independent tasks; any failure or timeout is logged and replaced with a safe
//! default so the run can always be scored.

use crate::errors::{IpScoreError, IpScoreResult};
use crate::models::{FingerprintRecord, IpRecord, NetworkRecord};
use crate::threat_intel::ThreatCheckResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// The four gatherers of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Gatherer {
    IpLookup,
    ThreatChecks,
    Fingerprint,
    Network,
}

impl Gatherer {
    pub const ALL: [Gatherer; 4] = [
        Gatherer::IpLookup,
        Gatherer::ThreatChecks,
        Gatherer::Fingerprint,
        Gatherer::Network,
    ];

    /// Loading-step label
    pub fn label(self) -> &'static str {
        match self {
            Gatherer::IpLookup => "Retrieving IP information",
            Gatherer::ThreatChecks => "Checking threat intelligence",
            Gatherer::Fingerprint => "Collecting device fingerprint",
            Gatherer::Network => "Probing network",
        }
    }
}

impl std::fmt::Display for Gatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gatherer::IpLookup => write!(f, "IP lookup"),
            Gatherer::ThreatChecks => write!(f, "threat checks"),
            Gatherer::Fingerprint => write!(f, "fingerprint"),
            Gatherer::Network => write!(f, "network probe"),
        }
    }
}

/// Where a gatherer reads its record from
#[derive(Debug, Clone)]
pub enum Source<T> {
    /// Nothing supplied
    Missing,
    /// Record already in memory
    Inline(T),
    /// JSON document on disk
    File(PathBuf),
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Source::Missing
    }
}

impl<T: DeserializeOwned> Source<T> {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Source::Missing, Source::File)
    }

    /// Resolve the source. `Ok(None)` means nothing was supplied.
    pub async fn load(self) -> IpScoreResult<Option<T>> {
        match self {
            Source::Missing => Ok(None),
            Source::Inline(record) => Ok(Some(record)),
            Source::File(path) => {
                let raw = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| IpScoreError::io(e, path.clone()))?;
                let record = serde_json::from_str(&raw)?;
                log::debug!("Loaded {}", path.display());
                Ok(Some(record))
            }
        }
    }
}

/// Output of one gatherer task
#[derive(Debug, Clone)]
pub enum GathererOutput {
    Ip(IpRecord),
    Threats(Vec<ThreatCheckResult>),
    Fingerprint(FingerprintRecord),
    Network(NetworkRecord),
}

impl GathererOutput {
    pub fn gatherer(&self) -> Gatherer {
        match self {
            GathererOutput::Ip(_) => Gatherer::IpLookup,
            GathererOutput::Threats(_) => Gatherer::ThreatChecks,
            GathererOutput::Fingerprint(_) => Gatherer::Fingerprint,
            GathererOutput::Network(_) => Gatherer::Network,
        }
    }
}

/// A gatherer output plus whether it had to fall back to a default
#[derive(Debug, Clone)]
pub struct Gathered {
    pub output: GathererOutput,
    pub degraded: bool,
}

/// Run `work` under `limit`. Errors and timeouts yield `fallback()` and the
/// degraded flag.
pub async fn guarded<T, F>(
    gatherer: Gatherer,
    limit: Duration,
    work: F,
    fallback: impl FnOnce() -> T,
) -> (T, bool)
where
    F: Future<Output = IpScoreResult<T>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(Ok(value)) => (value, false),
        Ok(Err(e)) => {
            log::warn!("{} failed: {}", gatherer, e);
            (fallback(), true)
        }
        Err(_) => {
            log::warn!("{} timed out after {}ms", gatherer, limit.as_millis());
            (fallback(), true)
        }
    }
}

/// IP record from the supplied source, with an explicit address taking
/// precedence over the record's own
pub async fn gather_ip_record(
    source: Source<IpRecord>,
    explicit_ip: Option<String>,
) -> IpScoreResult<IpRecord> {
    let loaded = source.load().await?;
    match (loaded, explicit_ip) {
        (Some(mut record), Some(ip)) => {
            record.merge(IpRecord::for_ip(ip));
            Ok(record)
        }
        (Some(record), None) => Ok(record),
        (None, Some(ip)) => Ok(IpRecord::for_ip(ip)),
        (None, None) => Err(IpScoreError::external(
            "IP lookup",
            "no address or IP record supplied",
        )),
    }
}

pub async fn gather_fingerprint(source: Source<FingerprintRecord>) -> IpScoreResult<FingerprintRecord> {
    Ok(source.load().await?.unwrap_or_default())
}

pub async fn gather_network(source: Source<NetworkRecord>) -> IpScoreResult<NetworkRecord> {
    Ok(source.load().await?.unwrap_or_default())
}
