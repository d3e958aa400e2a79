//! depreport - dependency health report
//!
//! CLI entry point: loads configuration and runs the report.

use clap::Parser;
use console::style;
use depreport::cli::Cli;
use depreport::config::ConfigManager;
use depreport::error::ReportResult;
use depreport::report::{ReportOptions, Reporter};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> ReportResult<()> {
    let cli = Cli::parse();

    // DEPREPORT_LOG wins; otherwise 0 = warn, 1 = info, 2+ = debug
    let filter = EnvFilter::try_from_env("DEPREPORT_LOG").unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("depreport=warn"),
        1 => EnvFilter::new("depreport=info"),
        _ => EnvFilter::new("depreport=debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    debug!("Loading config from {}", config_manager.path().display());
    let config = config_manager.load().await?;

    let options = ReportOptions::resolve(&cli, &config)?;
    if !options.color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    debug!("Report options: {:?}", options);

    let mut out = std::io::stdout();
    Reporter::new(options).run(&mut out).await
}
