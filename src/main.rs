//! Scancache - A persistent content-addressed cache store
//!
//! Command-line driver: create, sample-read, ref-count update, delete,
//! search and TTL purge against a store file.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scancache::cli::{self, Cli};
use scancache::Config;

/// Main entry point for the scancache driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse command-line arguments
/// 3. Load configuration from environment variables, then apply CLI overrides
/// 4. Run the selected action
fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scancache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();

    let config = args.apply(Config::from_env());
    info!(
        "Configuration loaded: db_path={}, compression={}, level={}",
        config.db_path.display(),
        config.compression,
        config.compression_level
    );

    if let Err(e) = cli::run(&args, &config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
