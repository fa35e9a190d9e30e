//! Analysis run
//!
//! One [`AnalysisRun`] per request. It owns its inputs, runs the four
//! gatherers concurrently, collects whatever arrives before the run deadline
//! and scores it. Runs share nothing with each other.

use crate::config::AnalysisConfig;
use crate::errors::{IpScoreError, IpScoreResult};
use crate::gatherers::{
    gather_fingerprint, gather_ip_record, gather_network, guarded, Gathered, Gatherer,
    GathererOutput,
};
use crate::geo::{GeoConsistencyChecker, GeoConsistencyResult};
use crate::isp::{IspAnalyzer, IspAssessment};
use crate::models::{FingerprintRecord, IpRecord, NetworkRecord};
use crate::proxy::{ProxyAssessment, ProxyDetector};
use crate::scoring::risk::{security_tips, ScoreBand};
use crate::scoring::{ScoreAggregator, ScoreReport};
use crate::tables::ScoringTables;
use crate::threat_intel::{ThreatCheckResult, ThreatFeed, ThreatIntelEngine};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Progress notifications for the loading display
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    GathererFinished { gatherer: Gatherer, degraded: bool },
    TimedOut { missing: Vec<Gatherer> },
    Complete { score: u8 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub started_at: String,
    pub duration_seconds: f64,
}

/// Everything a run produced, for display and export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub ip_record: IpRecord,
    pub threats: Vec<ThreatCheckResult>,
    pub fingerprint: FingerprintRecord,
    pub network: NetworkRecord,
    pub proxy: ProxyAssessment,
    pub geo: GeoConsistencyResult,
    pub isp: IspAssessment,
    pub report: ScoreReport,
    pub band: ScoreBand,
    pub tips: Vec<String>,
    /// Gatherers whose output was replaced by a default
    pub degraded: Vec<Gatherer>,
    /// The run deadline passed before every gatherer reported
    pub timed_out: bool,
    pub run_info: RunInfo,
}

impl AnalysisOutcome {
    pub fn score(&self) -> u8 {
        self.report.final_score
    }

    pub fn threats_found(&self) -> usize {
        self.threats.iter().filter(|t| t.is_threat).count()
    }
}

pub struct AnalysisRun {
    config: AnalysisConfig,
    engine: ThreatIntelEngine,
    events: Option<mpsc::Sender<RunEvent>>,
}

impl AnalysisRun {
    pub fn new(config: AnalysisConfig) -> Self {
        let engine = ThreatIntelEngine::new().with_pacing(config.pacing);
        Self {
            config,
            engine,
            events: None,
        }
    }

    /// Replace the simulated threat feed
    pub fn with_feed(mut self, feed: Arc<dyn ThreatFeed>) -> Self {
        self.engine = ThreatIntelEngine::with_feed(feed).with_pacing(self.config.pacing);
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Gather, then score. Always produces an outcome.
    pub async fn execute(self) -> AnalysisOutcome {
        let started_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let start = Instant::now();
        let AnalysisRun {
            config,
            engine,
            events,
        } = self;
        let AnalysisConfig {
            ip,
            ip_record,
            fingerprint,
            network,
            tables,
            task_timeout,
            run_timeout,
            ..
        } = config;

        log::info!(
            "Starting analysis for {}",
            ip.as_deref().unwrap_or("address from IP record")
        );

        let (tx, mut rx) = mpsc::channel::<Gathered>(Gatherer::ALL.len());
        let (ip_tx, ip_rx) = oneshot::channel::<Option<String>>();
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(Gatherer::ALL.len());

        {
            let tx = tx.clone();
            let explicit = ip.clone();
            handles.push(tokio::spawn(async move {
                let fallback = explicit.clone();
                let (record, degraded) = guarded(
                    Gatherer::IpLookup,
                    task_timeout,
                    gather_ip_record(ip_record, explicit),
                    move || ip_fallback(fallback),
                )
                .await;
                let _ = ip_tx.send(record.ip().map(str::to_string));
                let _ = tx
                    .send(Gathered {
                        output: GathererOutput::Ip(record),
                        degraded,
                    })
                    .await;
            }));
        }

        {
            let tx = tx.clone();
            let explicit = ip.clone();
            handles.push(tokio::spawn(async move {
                let address = match explicit {
                    Some(address) => Some(address),
                    None => ip_rx.await.ok().flatten(),
                };
                let (threats, degraded) = match address {
                    Some(address) => {
                        guarded(
                            Gatherer::ThreatChecks,
                            task_timeout,
                            async { Ok::<_, IpScoreError>(engine.check_all(&address).await) },
                            Vec::new,
                        )
                        .await
                    }
                    None => {
                        log::info!("No address resolved, skipping threat checks");
                        (Vec::new(), false)
                    }
                };
                let _ = tx
                    .send(Gathered {
                        output: GathererOutput::Threats(threats),
                        degraded,
                    })
                    .await;
            }));
        }

        {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let (record, degraded) = guarded(
                    Gatherer::Fingerprint,
                    task_timeout,
                    gather_fingerprint(fingerprint),
                    FingerprintRecord::default,
                )
                .await;
                let _ = tx
                    .send(Gathered {
                        output: GathererOutput::Fingerprint(record),
                        degraded,
                    })
                    .await;
            }));
        }

        {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let (record, degraded) = guarded(
                    Gatherer::Network,
                    task_timeout,
                    gather_network(network),
                    NetworkRecord::default,
                )
                .await;
                let _ = tx
                    .send(Gathered {
                        output: GathererOutput::Network(record),
                        degraded,
                    })
                    .await;
            }));
        }
        drop(tx);

        let deadline = start + run_timeout;
        let mut slots = Slots::default();
        let mut degraded = Vec::new();
        let mut timed_out = false;

        while !slots.complete() {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(gathered)) => {
                    let gatherer = gathered.output.gatherer();
                    log::debug!("{} finished (degraded: {})", gatherer, gathered.degraded);
                    if gathered.degraded {
                        degraded.push(gatherer);
                    }
                    slots.fill(gathered.output);
                    emit(
                        &events,
                        RunEvent::GathererFinished {
                            gatherer,
                            degraded: gathered.degraded,
                        },
                    )
                    .await;
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }

        let missing = slots.missing();
        if timed_out {
            log::error!(
                "Analysis timed out after {}ms, scoring with defaults for: {}",
                run_timeout.as_millis(),
                missing.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(", ")
            );
            for handle in &handles {
                handle.abort();
            }
            emit(
                &events,
                RunEvent::TimedOut {
                    missing: missing.clone(),
                },
            )
            .await;
        } else {
            for handle in handles {
                if let Err(e) = join(handle).await {
                    log::warn!("{}", e);
                }
            }
        }
        degraded.extend(missing);

        let ip_record = slots.ip.unwrap_or_else(|| ip_fallback(ip));
        let threats = slots.threats.unwrap_or_default();
        let fingerprint = slots.fingerprint.unwrap_or_default();
        let network = slots.network.unwrap_or_default();

        let assessed = assess(&tables, &ip_record, &threats, &fingerprint, &network);
        log::info!(
            "Score {} ({} risk factor(s))",
            assessed.report.final_score,
            assessed.report.risk_factors.len()
        );
        emit(
            &events,
            RunEvent::Complete {
                score: assessed.report.final_score,
            },
        )
        .await;

        let band = ScoreBand::from_score(assessed.report.final_score);
        let tips = security_tips(&assessed.report, &fingerprint)
            .into_iter()
            .map(str::to_string)
            .collect();

        AnalysisOutcome {
            ip_record,
            threats,
            fingerprint,
            network,
            proxy: assessed.proxy,
            geo: assessed.geo,
            isp: assessed.isp,
            report: assessed.report,
            band,
            tips,
            degraded,
            timed_out,
            run_info: RunInfo {
                started_at,
                duration_seconds: start.elapsed().as_secs_f64(),
            },
        }
    }
}

/// Heuristic outputs and the score for one set of inputs
pub struct Assessment {
    pub proxy: ProxyAssessment,
    pub geo: GeoConsistencyResult,
    pub isp: IspAssessment,
    pub report: ScoreReport,
}

/// Run the heuristics and the aggregator over already-gathered inputs
pub fn assess(
    tables: &ScoringTables,
    ip_record: &IpRecord,
    threats: &[ThreatCheckResult],
    fingerprint: &FingerprintRecord,
    network: &NetworkRecord,
) -> Assessment {
    let proxy = ProxyDetector::new(tables).assess(ip_record);
    let geo = GeoConsistencyChecker::new(tables).check(ip_record, network, fingerprint);
    let isp = IspAnalyzer::new(tables).analyze(ip_record);
    let report = ScoreAggregator::new().aggregate(threats, &proxy, &geo);
    Assessment {
        proxy,
        geo,
        isp,
        report,
    }
}

fn ip_fallback(explicit: Option<String>) -> IpRecord {
    explicit.map_or_else(IpRecord::detection_failed, IpRecord::for_ip)
}

async fn emit(events: &Option<mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(sender) = events {
        let _ = sender.send(event).await;
    }
}

async fn join(handle: JoinHandle<()>) -> IpScoreResult<()> {
    handle.await?;
    Ok(())
}

#[derive(Default)]
struct Slots {
    ip: Option<IpRecord>,
    threats: Option<Vec<ThreatCheckResult>>,
    fingerprint: Option<FingerprintRecord>,
    network: Option<NetworkRecord>,
}

impl Slots {
    fn fill(&mut self, output: GathererOutput) {
        match output {
            GathererOutput::Ip(record) => self.ip = Some(record),
            GathererOutput::Threats(threats) => self.threats = Some(threats),
            GathererOutput::Fingerprint(record) => self.fingerprint = Some(record),
            GathererOutput::Network(record) => self.network = Some(record),
        }
    }

    fn missing(&self) -> Vec<Gatherer> {
        Gatherer::ALL
            .into_iter()
            .filter(|g| match g {
                Gatherer::IpLookup => self.ip.is_none(),
                Gatherer::ThreatChecks => self.threats.is_none(),
                Gatherer::Fingerprint => self.fingerprint.is_none(),
                Gatherer::Network => self.network.is_none(),
            })
            .collect()
    }

    fn complete(&self) -> bool {
        self.missing().is_empty()
    }
}
