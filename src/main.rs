//! Lunar Lens
//!
//! HTTP service running LLM-backed analyses of lunar surface imagery.

use anyhow::Result;
use clap::Parser;
use lunar_lens::{
    config::{Environment, Settings},
    logging::init_tracing,
    server::App,
};
use std::path::PathBuf;

/// Lunar Lens
///
/// Hazard detection, temporal change comparison, shadow/slope classification
/// and geological reasoning over lunar imagery.
#[derive(Parser, Debug)]
#[command(name = "lunar-lens")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT env var)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides HOST env var)
    #[arg(long)]
    host: Option<String>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
    #[arg(short, long)]
    env: Option<Environment>,

    /// Directory for daily-rolling JSON log files
    /// Example: --log-dir /var/log/lunar-lens
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Gemini model id (overrides GEMINI_MODEL env var)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level);
    // validated once overrides are applied and logging is up
    let mut settings = Settings::load()?;

    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(env) = args.env {
        settings.environment = env;
    }
    if let Some(model) = args.model {
        settings.gemini_model = model;
    }

    let _log_guard = init_tracing(&settings.log_level, args.log_dir.as_deref())?;
    if let Some(dir) = &args.log_dir {
        eprintln!("Logging to directory: {} (daily rotation)", dir.display());
    }

    settings.validate()?;

    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        environment = %settings.environment,
        host = %settings.host,
        port = %settings.port,
        model = %settings.gemini_model,
        "Starting application"
    );

    let app = App::new(settings)?;

    app.run_with_graceful_shutdown().await?;

    tracing::info!("Application shutdown complete");

    Ok(())
}
