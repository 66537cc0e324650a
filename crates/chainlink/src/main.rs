//! Chainlink CLI binary.

use anyhow::Result;
use chainlink::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the chainlink CLI.
///
/// Runs on tokio's current_thread runtime: the CLI does a handful of
/// sequential file reads and writes around synchronous graph work.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=chainlink=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chainlink=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting chainlink CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Chainlink CLI completed successfully");
    Ok(())
}
