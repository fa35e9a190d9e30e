//! Console summary and JSON export of an analysis outcome

use crate::analysis::AnalysisOutcome;
use crate::errors::{IpScoreError, IpScoreResult};
use crate::utils::format_latency;
use console::style;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// One-line state of each detector, as shown in the status panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStatus {
    pub threats_found: usize,
    pub threats_checked: usize,
    pub threat_errors: usize,
    pub proxy: String,
    pub geo: String,
    pub isp: String,
}

impl DetectionStatus {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        let proxy = if outcome.proxy.detected {
            format!(
                "{} ({:.0}% confidence, {} risk)",
                outcome.proxy.proxy_type.display_name(),
                outcome.proxy.confidence * 100.0,
                outcome.proxy.risk_level()
            )
        } else {
            "Not detected".to_string()
        };

        Self {
            threats_found: outcome.threats_found(),
            threats_checked: outcome.threats.len(),
            threat_errors: outcome.threats.iter().filter(|t| t.errored).count(),
            proxy,
            geo: outcome.geo.summary(),
            isp: outcome
                .isp
                .risk_label
                .clone()
                .unwrap_or_else(|| "No ISP risk".to_string()),
        }
    }
}

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print_summary(&self, outcome: &AnalysisOutcome) {
        println!("{}", self.render_summary(outcome));
    }

    pub fn render_summary(&self, outcome: &AnalysisOutcome) -> String {
        let mut out = String::new();
        let report = &outcome.report;
        let record = &outcome.ip_record;

        let (score_emoji, styled_score) = match report.final_score {
            90..=100 => ("🟢", style(report.final_score).green().bold()),
            75..=89 => ("🟡", style(report.final_score).yellow().bold()),
            60..=74 => ("🟠", style(report.final_score).yellow().bold()),
            _ => ("🔴", style(report.final_score).red().bold()),
        };

        let _ = writeln!(out, "\n🎯 IP SECURITY SCORE");
        let _ = writeln!(out, "═══════════════════════════════════════");
        let _ = writeln!(out, "{} Score: {}/100 ({})", score_emoji, styled_score, outcome.band);
        let _ = writeln!(out, "🌐 IP Address: {}", record.ip().unwrap_or("Unknown"));
        let _ = writeln!(
            out,
            "📍 Location: {}, {}",
            record.city.as_deref().unwrap_or("Unknown"),
            record.country.as_deref().unwrap_or("Unknown")
        );
        let _ = writeln!(out, "🏢 Organization: {}", record.org().unwrap_or("Unknown"));
        let _ = writeln!(out, "🕒 Timezone: {}", record.timezone().unwrap_or("Unknown"));
        let _ = writeln!(out, "📶 Latency: {}", format_latency(outcome.network.latency_ms()));
        let _ = writeln!(out, "⏱️  Duration: {:.2}s", outcome.run_info.duration_seconds);
        if outcome.timed_out {
            let _ = writeln!(out, "{}", style("⚠ Analysis timed out, partial results").yellow());
        }

        if !report.risk_factors.is_empty() {
            let _ = writeln!(out, "\n🚨 RISK FACTORS");
            let _ = writeln!(out, "═══════════════════════════════════════");
            for (i, factor) in report.risk_factors.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, factor);
            }

            let _ = writeln!(out, "\n🧮 DEDUCTIONS");
            let _ = writeln!(out, "═══════════════════════════════════════");
            for deduction in &report.deduction_ledger {
                let _ = writeln!(out, "   {}", deduction);
            }
            let _ = writeln!(out, "   Floor rule: {}", report.floor_rule);
        }

        let status = DetectionStatus::from_outcome(outcome);
        let _ = writeln!(out, "\n🔍 DETECTION STATUS");
        let _ = writeln!(out, "═══════════════════════════════════════");
        let _ = writeln!(
            out,
            "🛡  Threat Intelligence: {}/{} flagged",
            status.threats_found, status.threats_checked
        );
        if status.threat_errors > 0 {
            let _ = writeln!(out, "   {} source(s) failed", status.threat_errors);
        }
        let _ = writeln!(out, "🕵️  Proxy Detection: {}", status.proxy);
        let _ = writeln!(out, "🗺️  Geolocation: {}", status.geo);
        let _ = writeln!(out, "🏭 ISP: {}", status.isp);
        for gatherer in &outcome.degraded {
            let _ = writeln!(out, "⚠  {}: Detection Failed", gatherer.label());
        }

        let _ = writeln!(out, "\n💡 RECOMMENDATIONS");
        let _ = writeln!(out, "═══════════════════════════════════════");
        for tip in &outcome.tips {
            let _ = writeln!(out, "• {}", tip);
        }

        out
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn to_json(outcome: &AnalysisOutcome) -> IpScoreResult<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Write the full outcome as pretty JSON
pub fn write_json(outcome: &AnalysisOutcome, path: &Path) -> IpScoreResult<()> {
    log::info!("Writing JSON results to: {:?}", path);
    let json = to_json(outcome)?;
    std::fs::write(path, json).map_err(|e| IpScoreError::io(e, path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisRun;
    use crate::config::AnalysisConfig;
    use crate::gatherers::Source;
    use crate::models::IpRecord;

    async fn golden_outcome() -> AnalysisOutcome {
        let config = AnalysisConfig {
            ip_record: Source::Inline(IpRecord {
                city: Some("Hong Kong".to_string()),
                country: Some("Hong Kong".to_string()),
                org: Some("Hong Kong Broadband Network".to_string()),
                ..IpRecord::default()
            }),
            ..AnalysisConfig::for_ip("220.246.84.46")
        };
        AnalysisRun::new(config).execute().await
    }

    #[tokio::test]
    async fn test_detection_status() {
        let outcome = golden_outcome().await;
        let status = DetectionStatus::from_outcome(&outcome);
        assert_eq!(status.threats_found, 2);
        assert_eq!(status.threats_checked, 5);
        assert_eq!(status.threat_errors, 0);
        assert_eq!(status.proxy, "Not detected");
        assert_eq!(status.geo, "Location information consistent");
        assert_eq!(status.isp, "No ISP risk");
    }

    #[tokio::test]
    async fn test_summary_lists_factors_and_tips() {
        let outcome = golden_outcome().await;
        let text = ConsoleReporter::new().render_summary(&outcome);
        assert!(text.contains("IP Address: 220.246.84.46"));
        assert!(text.contains("1. Malware Database (critical)"));
        assert!(text.contains("2. Attack Source IP (critical)"));
        assert!(text.contains("Threat Intelligence-Malware Database: -30"));
        assert!(text.contains("Floor rule: critical threat"));
        assert!(text.contains("Threat Intelligence: 2/5 flagged"));
        assert!(text.contains("Consider using VPN services"));
    }

    #[tokio::test]
    async fn test_json_export() -> Result<(), Box<dyn std::error::Error>> {
        let outcome = golden_outcome().await;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("analysis.json");
        write_json(&outcome, &path)?;

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(value["report"]["finalScore"], 40);
        assert_eq!(value["report"]["riskFactors"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["threats"][0]["sourceName"], "Malware Database");
        assert_eq!(value["threats"][0]["severity"], "critical");
        assert_eq!(value["threats"][1]["severity"], serde_json::Value::Null);
        assert_eq!(value["proxy"]["type"], "direct");
        assert_eq!(value["timedOut"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_json_to_missing_dir_fails() {
        let outcome = golden_outcome().await;
        let result = write_json(&outcome, Path::new("/nonexistent/dir/out.json"));
        assert!(matches!(result, Err(IpScoreError::Io { .. })));
    }
}
