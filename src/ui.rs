use crate::analysis::RunEvent;
use crate::cli::Args;
use crate::gatherers::Gatherer;
use console::{style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

/// Loading display for one analysis run
pub struct LoadingDisplay {
    term: Term,
    steps: ProgressBar,
    status: ProgressBar,
    // Keeps both bars drawn as a group
    _multi_progress: MultiProgress,
}

impl LoadingDisplay {
    pub fn new(total_steps: u64, quiet: bool) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let term = Term::stdout();
        let multi_progress = MultiProgress::new();

        let steps_style = ProgressStyle::with_template(
            "{prefix} {spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["▰▱▱▱▱", "▰▰▱▱▱", "▰▰▰▱▱", "▰▰▰▰▱", "▰▰▰▰▰", "▱▰▰▰▰"]);

        let steps = if quiet {
            ProgressBar::hidden()
        } else {
            if term.is_term() {
                term.hide_cursor()?;
            }
            multi_progress.add(ProgressBar::new(total_steps))
        };
        steps.set_style(steps_style);
        steps.set_prefix(style("🛡  ANALYSIS").green().bold().to_string());
        steps.enable_steady_tick(Duration::from_millis(120));

        let status = if quiet {
            ProgressBar::hidden()
        } else {
            multi_progress.add(ProgressBar::new_spinner())
        };
        status.set_style(ProgressStyle::with_template("{prefix} {msg}")?);
        status.set_prefix(style("📡 STEP").cyan().bold().to_string());
        status.set_message(style("Gathering signals...").dim().to_string());

        Ok(Self {
            term,
            steps,
            status,
            _multi_progress: multi_progress,
        })
    }

    /// Display sized to the run's gatherers. Bars are hidden unless the run is interactive.
    pub fn for_args(args: &Args) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::new(Gatherer::ALL.len() as u64, !args.interactive())
    }

    pub async fn run(&self, mut event_receiver: mpsc::Receiver<RunEvent>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        while let Some(event) = event_receiver.recv().await {
            match event {
                RunEvent::GathererFinished { gatherer, degraded } => {
                    log::debug!("UI: {} finished", gatherer);
                    let mark = if degraded {
                        style("⚠ Detection Failed").yellow().to_string()
                    } else {
                        style("✓").green().to_string()
                    };
                    self.status.set_message(format!("{} {}", style(gatherer.label()).white().bold(), mark));
                    self.steps.inc(1);
                }

                RunEvent::TimedOut { missing } => {
                    let names: Vec<String> = missing.iter().map(|g| g.to_string()).collect();
                    self.status.set_message(format!(
                        "{} {}",
                        style("⏱ Timed out waiting for").red().bold(),
                        style(names.join(", ")).dim()
                    ));
                }

                RunEvent::Complete { score } => {
                    log::debug!("UI: analysis complete");
                    self.steps.finish_with_message(
                        style(format!("✅ Analysis complete! Score {}", score)).green().bold().to_string(),
                    );
                    self.status.finish_and_clear();
                    break;
                }
            }
        }

        if !self.steps.is_finished() {
            self.steps.finish_and_clear();
            self.status.finish_and_clear();
        }
        if self.term.is_term() {
            self.term.show_cursor()?;
        }

        Ok(())
    }
}

impl Drop for LoadingDisplay {
    fn drop(&mut self) {
        let _ = self.term.show_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_display_consumes_events_until_complete() {
        let display = LoadingDisplay::new(4, true).expect("hidden display");
        let (tx, rx) = mpsc::channel(8);
        for gatherer in Gatherer::ALL {
            tx.send(RunEvent::GathererFinished { gatherer, degraded: false })
                .await
                .expect("send");
        }
        tx.send(RunEvent::Complete { score: 100 }).await.expect("send");

        display.run(rx).await.expect("display runs");
        assert_eq!(display.steps.position(), 4);
    }

    #[tokio::test]
    async fn test_display_stops_when_sender_dropped() {
        let display = LoadingDisplay::new(4, true).expect("hidden display");
        let (tx, rx) = mpsc::channel(8);
        tx.send(RunEvent::TimedOut { missing: vec![Gatherer::Network] })
            .await
            .expect("send");
        drop(tx);
        display.run(rx).await.expect("display runs");
    }

    #[tokio::test]
    async fn test_non_interactive_runs_get_hidden_bars() {
        for argv in [vec!["ipscore", "-q"], vec!["ipscore", "--format", "json"]] {
            let display = LoadingDisplay::for_args(&Args::parse_from(argv)).expect("display");
            assert!(display.steps.is_hidden());
            assert!(display.status.is_hidden());
            assert_eq!(display.steps.length(), Some(4));
        }
    }
}
