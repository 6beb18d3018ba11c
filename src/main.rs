use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod config;
mod server;
mod store;

use config::{Backend, Config};
use store::{snapshot::read_league, InMemoryStore, League, SnapshotStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Connection settings may come from a local .env file
    dotenvy::dotenv().ok();

    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let app = build_app(&config).await?;

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("League server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the configured backend, import the seed league if any, and wrap it
/// in the matching router.
async fn build_app(config: &Config) -> Result<Router> {
    let seed = match &config.seed_path {
        Some(path) => Some(load_seed(path)?),
        None => None,
    };

    let app = match config.backend {
        Backend::Memory => {
            let store = match seed {
                Some(league) => InMemoryStore::from_league(league),
                None => InMemoryStore::new(),
            };
            info!("Using in-memory store");
            server::router(Arc::new(store))
        }
        Backend::Snapshot => {
            let path = config.snapshot_path.as_deref().unwrap_or_default();
            let store = SnapshotStore::open(path)
                .with_context(|| format!("failed to open snapshot {}", path))?;
            info!("Serving read-only snapshot: {}", path);
            server::read_only_router(Arc::new(store))
        }
        Backend::Sqlite => {
            let path = config.database_path.as_deref().unwrap_or_default();
            let store = SqliteStore::open(path)
                .with_context(|| format!("failed to open database {}", path))?;
            info!("Database opened: {}", path);
            if let Some(league) = seed {
                store.seed(league).await?;
            }
            server::router(Arc::new(store))
        }
    };

    Ok(app)
}

fn load_seed(path: &str) -> Result<League> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("failed to open seed {}", path))?;
    let league = read_league(&mut file).with_context(|| format!("failed to read seed {}", path))?;
    info!("Seeding {} player(s) from {}", league.len(), path);
    Ok(league)
}
