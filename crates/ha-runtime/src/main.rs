//! # Epidose Health Authority Server
//!
//! ## Startup Sequence
//!
//! 1. Parse flags, load configuration (defaults, env, flags)
//! 2. Initialize logging (`--verbose` → debug, `RUST_LOG` wins)
//! 3. Validate the HMAC secret is not the default
//! 4. Wire subsystems (`HealthAuthority::build`)
//! 5. Serve until Ctrl+C or, in debug mode, `GET /shutdown`

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ha_03_ingestion::HmacTokenAuthorizer;
use ha_runtime::{Cli, Command, HealthAuthority, ServerConfig};

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")
}

fn issue_token(config: &ServerConfig, ttl_hours: i64) -> Result<()> {
    config
        .validate_for_production()
        .context("Refusing to sign tokens")?;
    let authorizer = HmacTokenAuthorizer::new(config.security.hmac_secret.to_vec());
    println!("{}", authorizer.issue(chrono::Duration::hours(ttl_hours)));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env().context("Invalid environment configuration")?;
    cli.apply(&mut config);

    if let Some(Command::IssueToken { ttl_hours }) = cli.command {
        return issue_token(&config, ttl_hours);
    }

    init_logging(config.verbose)?;

    info!("===========================================");
    info!("  Epidose Health Authority v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let authority = HealthAuthority::build(&config).context("Failed to start")?;
    info!(
        addr = %config.gateway().http_addr(),
        debug = config.debug,
        "Server is running. Press Ctrl+C to stop."
    );

    let stopper = authority.shutdown_sender();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C, shutting down");
        stopper.shutdown.send_replace(true);
    });

    authority.run().await.context("Server failed")?;
    Ok(())
}
