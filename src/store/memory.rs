use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{League, LeagueStore, Player, PlayerStore, StoreError};

/// Map-backed store. Everything is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStore {
    scores: Mutex<HashMap<String, u64>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing league, e.g. an imported snapshot.
    pub fn from_league(league: League) -> Self {
        let scores = league.into_iter().map(|p| (p.name, p.score)).collect();
        InMemoryStore {
            scores: Mutex::new(scores),
        }
    }

    // Each critical section is a single map operation, so a poisoned map is
    // still consistent.
    fn scores(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.scores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LeagueStore for InMemoryStore {
    async fn get_player_score(&self, name: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.scores().get(name).copied())
    }

    async fn get_league(&self) -> Result<League, StoreError> {
        let league = self
            .scores()
            .iter()
            .map(|(name, score)| Player::new(name.clone(), *score))
            .collect();
        Ok(league)
    }
}

#[async_trait]
impl PlayerStore for InMemoryStore {
    async fn record_win(&self, name: &str) -> Result<(), StoreError> {
        *self.scores().entry(name.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
