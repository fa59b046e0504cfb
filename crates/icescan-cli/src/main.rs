//! icescan — internal compiler error regression scanner.
//!
//! Walks the recent commit history of each configured repository,
//! rebuilds every revision with cargo, and reports commits whose build
//! output signals an internal compiler error.

use anyhow::{Context, Result};
use clap::Parser;
use icescan_core::{init_tracing, ScanConfig, ScanOutcome, ScanSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "icescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan commit history for internal compiler errors", long_about = None)]
struct Cli {
    /// Path to the scan configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // Single exit-code decision point: every fatal path below arrives
    // here as an error value.
    match run(&cli).await {
        Ok(0) => {
            info!("no internal compiler error found");
            ExitCode::SUCCESS
        }
        Ok(ice_repo_count) => {
            warn!("found internal compiler error(s) in {ice_repo_count} repository(ies)");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one scan session per configured repository, sequentially.
///
/// Returns the number of repositories with at least one detected ICE.
/// An unexpected build failure aborts the whole multi-repository run
/// after its raw output is logged verbatim.
async fn run(cli: &Cli) -> Result<usize> {
    let config = ScanConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let sources = config.sources()?;

    let mut ice_repo_count = 0;

    for source in sources {
        let slug = source.slug();
        let session = ScanSession::new(source, &config);

        match session.run().await? {
            ScanOutcome::Completed(report) => {
                if report.ice_found() {
                    ice_repo_count += 1;
                }
            }
            ScanOutcome::Aborted {
                commit, output, ..
            } => {
                error!(
                    repo = %slug,
                    commit = %commit.sha,
                    "unexpected build failure, aborting scan"
                );
                error!("{output}");
                anyhow::bail!(
                    "scan aborted by unexpected build failure at commit {}",
                    commit.sha
                );
            }
        }
    }

    Ok(ice_repo_count)
}
