use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ipscore",
    about = "ipscore - IP reputation scoring from geolocation, threat and browser signals",
    version
)]
pub struct Args {
    /// IPv4 address to analyze (overrides the address in --ip-record)
    #[arg(short, long)]
    pub ip: Option<String>,

    /// IP geolocation record (JSON file)
    #[arg(long)]
    pub ip_record: Option<PathBuf>,

    /// Browser fingerprint record (JSON file)
    #[arg(short, long)]
    pub fingerprint: Option<PathBuf>,

    /// Network/DNS measurement record (JSON file)
    #[arg(short, long)]
    pub network: Option<PathBuf>,

    /// Replacement scoring tables (JSON file, same shape as the built-in tables)
    #[arg(long)]
    pub tables: Option<PathBuf>,

    /// Per-gatherer timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub task_timeout_ms: u64,

    /// Timeout for the whole analysis run in milliseconds
    #[arg(long, default_value = "10000")]
    pub run_timeout_ms: u64,

    /// Delay between threat source lookups in milliseconds
    #[arg(long, default_value = "0")]
    pub pacing_ms: u64,

    /// Console output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write the full analysis to a JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging of all operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Hide progress display and only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Banner and visible progress bars are only drawn for text output without `--quiet`
    pub fn interactive(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full analysis as JSON on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "Text"),
            OutputFormat::Json => write!(f, "Json"),
        }
    }
}
