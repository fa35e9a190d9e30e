//! Run configuration built from the command line

use crate::cli::Args;
use crate::errors::{IpScoreError, IpScoreResult};
use crate::gatherers::Source;
use crate::models::{FingerprintRecord, IpRecord, NetworkRecord};
use crate::tables::ScoringTables;
use crate::utils::is_valid_ipv4;
use std::time::Duration;

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_millis(10000);

/// Everything one analysis run needs. Owned by the run; never shared.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Explicit address; when absent the threat checks use the IP record's
    pub ip: Option<String>,
    pub ip_record: Source<IpRecord>,
    pub fingerprint: Source<FingerprintRecord>,
    pub network: Source<NetworkRecord>,
    pub tables: ScoringTables,
    pub task_timeout: Duration,
    pub run_timeout: Duration,
    pub pacing: Duration,
}

impl AnalysisConfig {
    pub fn from_args(args: &Args) -> IpScoreResult<Self> {
        let ip = match args.ip.as_deref().map(str::trim) {
            Some(ip) if !is_valid_ipv4(ip) => return Err(IpScoreError::InvalidIp(ip.to_string())),
            Some(ip) => Some(ip.to_string()),
            None => None,
        };

        let tables = match &args.tables {
            Some(path) => ScoringTables::from_file(path)?,
            None => ScoringTables::builtin(),
        };

        Ok(Self {
            ip,
            ip_record: Source::from_path(args.ip_record.clone()),
            fingerprint: Source::from_path(args.fingerprint.clone()),
            network: Source::from_path(args.network.clone()),
            tables,
            task_timeout: Duration::from_millis(args.task_timeout_ms),
            run_timeout: Duration::from_millis(args.run_timeout_ms),
            pacing: Duration::from_millis(args.pacing_ms),
        })
    }

    /// Config for a bare address with built-in tables
    pub fn for_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ip: None,
            ip_record: Source::Missing,
            fingerprint: Source::Missing,
            network: Source::Missing,
            tables: ScoringTables::builtin(),
            task_timeout: DEFAULT_TASK_TIMEOUT,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            pacing: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_from_args_defaults() {
        let args = Args::parse_from(["ipscore", "--ip", " 220.246.84.46 "]);
        let config = AnalysisConfig::from_args(&args).expect("valid config");
        assert_eq!(config.ip.as_deref(), Some("220.246.84.46"));
        assert_eq!(config.task_timeout, DEFAULT_TASK_TIMEOUT);
        assert_eq!(config.run_timeout, DEFAULT_RUN_TIMEOUT);
        assert_eq!(config.pacing, Duration::ZERO);
        assert!(matches!(config.fingerprint, Source::Missing));
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let args = Args::parse_from(["ipscore", "--ip", "300.1.1.1"]);
        let err = AnalysisConfig::from_args(&args).expect_err("invalid address");
        assert!(matches!(err, IpScoreError::InvalidIp(ip) if ip == "300.1.1.1"));
    }

    #[test]
    fn test_paths_become_file_sources() {
        let args = Args::parse_from(["ipscore", "--network", "net.json", "--pacing-ms", "250"]);
        let config = AnalysisConfig::from_args(&args).expect("valid config");
        assert!(matches!(config.network, Source::File(ref p) if p.ends_with("net.json")));
        assert!(matches!(config.ip_record, Source::Missing));
        assert_eq!(config.pacing, Duration::from_millis(250));
    }

    #[test]
    fn test_tables_file_loaded() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let tables = serde_json::to_string(&ScoringTables::builtin()).expect("serialize tables");
        file.write_all(tables.as_bytes()).expect("write tables");

        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from(["ipscore", "--tables", path.as_str()]);
        let config = AnalysisConfig::from_args(&args).expect("tables load");
        assert_eq!(config.tables.default_latency_ms, 100.0);
    }

    #[test]
    fn test_unreadable_tables_file_is_an_error() {
        let args = Args::parse_from(["ipscore", "--tables", "/nonexistent/tables.json"]);
        assert!(AnalysisConfig::from_args(&args).is_err());
    }
}
