//! Score storage.
//!
//! Every backend implements [`LeagueStore`]; the ones that can also record
//! wins implement [`PlayerStore`]. The HTTP layer only ever talks to these
//! traits, never to the underlying medium.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod snapshot;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use snapshot::SnapshotStore;
pub use sqlite::SqliteStore;

/// A tracked player and their current number of wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Score")]
    pub score: u64,
}

impl Player {
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Player {
            name: name.into(),
            score,
        }
    }
}

/// The full set of tracked players. Order is not significant.
pub type League = Vec<Player>;

/// Look up a player in a league by name.
pub fn find_player<'a>(league: &'a [Player], name: &str) -> Option<&'a Player> {
    league.iter().find(|p| p.name == name)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to rewind league source")]
    Seek(#[source] std::io::Error),

    #[error("failed to decode league")]
    Decode(#[source] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage worker failed")]
    Join(#[source] tokio::task::JoinError),
}

/// Read access to a league.
#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// Current score for `name`, or `None` if the player is unknown.
    ///
    /// A known player may legitimately have a score of zero, so callers must
    /// not collapse `None` into `Some(0)`.
    async fn get_player_score(&self, name: &str) -> Result<Option<u64>, StoreError>;

    /// Snapshot of every tracked player.
    async fn get_league(&self) -> Result<League, StoreError>;
}

/// A league that can also record wins.
#[async_trait]
pub trait PlayerStore: LeagueStore {
    /// Add one win for `name`, creating the player with a score of 1 if unknown.
    ///
    /// Safe to call concurrently; no increments are lost.
    async fn record_win(&self, name: &str) -> Result<(), StoreError>;
}
