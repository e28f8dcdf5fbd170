use anyhow::Context;
use dbwait::cli::Cli;
use dbwait::{wait_for_ready, WaitConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// Allow eprintln in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    tracing::debug!("dbwait CLI initialized");

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // One attempt at a time; no need for worker threads.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(wait_for_ready(config)).into()
}

/// Defaults, then config file, then environment, then flags
fn load_config(cli: &Cli) -> anyhow::Result<WaitConfig> {
    let mut config = match &cli.config {
        Some(path) => WaitConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => WaitConfig::default(),
    };

    config
        .apply_process_env()
        .context("invalid environment")?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    Ok(config)
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Errors only by default; progress goes through the reporter. RUST_LOG overrides
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbwait=error"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
