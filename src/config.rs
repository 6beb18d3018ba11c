use clap::{Parser, ValueEnum};
use thiserror::Error;

/// Player league HTTP server
#[derive(Parser, Debug, Clone)]
#[command(name = "league-server", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Storage backend
    #[arg(long = "store", env = "STORE_BACKEND", value_enum, default_value = "memory")]
    pub backend: Backend,

    /// SQLite database path (sqlite backend)
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<String>,

    /// JSON league snapshot served read-only (snapshot backend)
    #[arg(long, env = "SNAPSHOT_PATH")]
    pub snapshot_path: Option<String>,

    /// JSON league imported into the store at startup
    #[arg(long, env = "SEED_PATH")]
    pub seed_path: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Process-local map, lost on exit
    Memory,
    /// Read-only JSON file, re-read on every request
    Snapshot,
    /// SQLite database file
    Sqlite,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required for the {backend:?} backend")]
    Missing { key: &'static str, backend: Backend },

    #[error("the snapshot backend is read-only and cannot be seeded")]
    SeedReadOnly,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            Backend::Memory => {}
            Backend::Snapshot => {
                if self.snapshot_path.is_none() {
                    return Err(ConfigError::Missing {
                        key: "SNAPSHOT_PATH",
                        backend: self.backend,
                    });
                }
                if self.seed_path.is_some() {
                    return Err(ConfigError::SeedReadOnly);
                }
            }
            Backend::Sqlite => {
                if self.database_path.is_none() {
                    return Err(ConfigError::Missing {
                        key: "DATABASE_PATH",
                        backend: self.backend,
                    });
                }
            }
        }
        Ok(())
    }
}
