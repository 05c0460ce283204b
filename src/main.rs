//! odindex - OneDrive file index gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use odindex::{config::Args, logging, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  odindex - OneDrive file index");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Drive API: {}", args.drive_api());
    info!("Base directory: {}", args.base_directory);
    info!("Token store: {:?}", args.store.token_store);
    info!("Protected routes: {}", args.protected_route_list().len());
    info!("======================================");

    let state = Arc::new(AppState::new(args)?);

    server::run(state).await?;

    Ok(())
}
