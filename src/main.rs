use clap::Parser;
use env_logger::Env;
use ipscore::cli::{Args, OutputFormat};
use ipscore::reporter::{self, ConsoleReporter};
use ipscore::ui::LoadingDisplay;
use ipscore::{AnalysisConfig, AnalysisRun};
use tokio::sync::mpsc;

fn display_banner() {
    let user = whoami::username();
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string());
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    println!();
    println!("       \x1b[38;5;196m██╗\x1b[38;5;208m██████╗ \x1b[38;5;226m███████╗\x1b[38;5;46m ██████╗\x1b[38;5;51m ██████╗ \x1b[38;5;45m██████╗ \x1b[38;5;39m███████╗\x1b[0m");
    println!("       \x1b[38;5;196m██║\x1b[38;5;208m██╔══██╗\x1b[38;5;226m██╔════╝\x1b[38;5;46m██╔════╝\x1b[38;5;51m██╔═══██╗\x1b[38;5;45m██╔══██╗\x1b[38;5;39m██╔════╝\x1b[0m");
    println!("       \x1b[38;5;196m██║\x1b[38;5;208m██████╔╝\x1b[38;5;226m███████╗\x1b[38;5;46m██║     \x1b[38;5;51m██║   ██║\x1b[38;5;45m██████╔╝\x1b[38;5;39m█████╗  \x1b[0m");
    println!("       \x1b[38;5;196m██║\x1b[38;5;208m██╔═══╝ \x1b[38;5;226m╚════██║\x1b[38;5;46m██║     \x1b[38;5;51m██║   ██║\x1b[38;5;45m██╔══██╗\x1b[38;5;39m██╔══╝  \x1b[0m");
    println!("       \x1b[38;5;196m██║\x1b[38;5;208m██║     \x1b[38;5;226m███████║\x1b[38;5;46m╚██████╗\x1b[38;5;51m╚██████╔╝\x1b[38;5;45m██║  ██║\x1b[38;5;39m███████╗\x1b[0m");
    println!("       \x1b[38;5;196m╚═╝\x1b[38;5;208m╚═╝     \x1b[38;5;226m╚══════╝\x1b[38;5;46m ╚═════╝\x1b[38;5;51m ╚═════╝ \x1b[38;5;45m╚═╝  ╚═╝\x1b[38;5;39m╚══════╝\x1b[0m");
    println!();
    println!("              \x1b[3;38;5;147m\"Know what your address says about you\"\x1b[0m");
    println!();

    println!("    \x1b[38;5;240m┌─ SYSTEM INFO ─────────────────────────────────────┐\x1b[0m");
    let format_line = |label: &str, value: &str| {
        format!(
            "    \x1b[38;5;240m│\x1b[0m \x1b[38;5;240m◉ {:<10}\x1b[0m \x1b[38;5;145m{:<36}\x1b[0m",
            label, value
        )
    };
    println!("{}", format_line("User", &user));
    println!("{}", format_line("Host", &host));
    println!("{}", format_line("Platform", &format!("{}/{}", os, arch)));
    println!("{}", format_line("Version", env!("CARGO_PKG_VERSION")));
    println!("    \x1b[38;5;240m└───────────────────────────────────────────────────┘\x1b[0m");
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let interactive = args.interactive();
    if interactive {
        display_banner();
    }

    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    log::debug!("ipscore starting with args: {:?}", args);

    let config = AnalysisConfig::from_args(&args)?;
    let mut run = AnalysisRun::new(config);

    let display = LoadingDisplay::for_args(&args)?;
    let (ui_sender, ui_receiver) = mpsc::channel(32);
    run = run.with_events(ui_sender);
    let ui_task = tokio::spawn(async move {
        if let Err(e) = display.run(ui_receiver).await {
            log::error!("UI task error: {}", e);
        }
    });

    let outcome = run.execute().await;
    ui_task.await?;

    match args.format {
        OutputFormat::Text => ConsoleReporter::new().print_summary(&outcome),
        OutputFormat::Json => println!("{}", reporter::to_json(&outcome)?),
    }

    if let Some(path) = &args.output {
        reporter::write_json(&outcome, path)?;
        if interactive {
            println!("    \x1b[38;5;46m▶\x1b[0m \x1b[1;37mAnalysis written to\x1b[0m {}", path.display());
        }
    }

    Ok(())
}
