//! EAT Server — application entry point.

mod bootstrap;
mod config;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eat_db::repository::SurrealUserProfileRepository;
use eat_db::{DbManager, run_migrations};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("eat=info".parse().unwrap()))
        .json()
        .init();

    info!("Starting EAT server...");

    if let Err(e) = run().await {
        error!(error = %e, "EAT server failed");
        std::process::exit(1);
    }

    info!("EAT server stopped.");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    let manager = DbManager::connect(&config.db).await?;
    let db = manager.client().clone();

    run_migrations(&db).await?;

    let users = match config.pepper.clone() {
        Some(pepper) => SurrealUserProfileRepository::with_pepper(db.clone(), pepper),
        None => SurrealUserProfileRepository::new(db.clone()),
    };
    bootstrap::ensure_admin(&users, &config).await?;

    // TODO: mount the HTTP API once the transport layer lands.
    info!("EAT backend ready; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    Ok(())
}
