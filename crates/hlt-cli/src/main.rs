//! hl-testnet - Entry Point

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use hlt_cli::{select_mode, AppConfig, Application, Mode, DEFAULT_CONFIG_PATH, USAGE};
use hlt_core::EnvSource;
use tracing::{error, info};

/// Hyperliquid testnet demo client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Mode: info, order, subs or serve (falls back to the CMD env var)
    mode: Option<String>,

    /// Configuration file path (can also be set via HLT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize TLS crypto provider (must be before any WS connections)
    hlt_ws::init_crypto();

    let args = Args::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    hlt_telemetry::init_logging()?;

    let mode_name = select_mode(args.mode, std::env::var("CMD").ok());
    let Some(mode) = Mode::parse(&mode_name) else {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    };

    // Config path: CLI arg > HLT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HLT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_or_default(&config_path)?;

    info!("Starting hl-testnet v{} ({mode_name})", env!("CARGO_PKG_VERSION"));

    let app = match Application::new(config, EnvSource::from_process()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    match app.run(mode).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!(error = %e, "hl-testnet failed");
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
