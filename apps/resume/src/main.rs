mod cli;
mod config;
mod crop;
mod errors;
mod export;
mod layout;
mod models;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on invalid env values)
    let config = Config::from_env()?;

    // Logs go to stderr so stdout stays clean for JSON output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        theme = %config.theme,
        section_order = %config.section_order,
        "Resume builder v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = cli::handlers::run(cli.command, &config).await {
        error!(code = e.code(), retryable = e.is_retryable(), "{e}");
        return Err(e.into());
    }

    Ok(())
}
