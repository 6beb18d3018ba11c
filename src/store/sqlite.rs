use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::{League, LeagueStore, Player, PlayerStore, StoreError};

/// Thread-safe SQLite store (single connection with mutex)
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Private database that lives as long as the store
    #[allow(dead_code)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// The mutex is held for exactly one call of `f`.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let res = tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(StoreError::Join)?;
        Ok(res?)
    }

    /// Set absolute scores for the given players, creating any that are missing.
    ///
    /// Administrative import path; the HTTP surface only ever increments.
    pub async fn seed(&self, league: League) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            {
                let mut insert_player = tx.prepare(INSERT_PLAYER_SQL)?;
                let mut set_score = tx.prepare(
                    "INSERT INTO scores (player_id, score)
                     SELECT id, ?2 FROM players WHERE name = ?1
                     ON CONFLICT(player_id) DO UPDATE SET score = excluded.score",
                )?;
                for player in &league {
                    let score = i64::try_from(player.score)
                        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                    insert_player.execute(params![player.name])?;
                    set_score.execute(params![player.name, score])?;
                }
            }
            tx.commit()
        })
        .await
    }
}

#[async_trait]
impl LeagueStore for SqliteStore {
    async fn get_player_score(&self, name: &str) -> Result<Option<u64>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT s.score FROM players p
                 JOIN scores s ON p.id = s.player_id
                 WHERE p.name = ?1
                 LIMIT 1",
                params![name],
                |row| read_score(row, 0),
            )
            .optional()
        })
        .await
    }

    async fn get_league(&self) -> Result<League, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.name, s.score FROM players p
                 JOIN scores s ON p.id = s.player_id",
            )?;
            let league = stmt
                .query_map([], map_player)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(league)
        })
        .await
    }
}

#[async_trait]
impl PlayerStore for SqliteStore {
    async fn record_win(&self, name: &str) -> Result<(), StoreError> {
        let name = name.to_string();
        debug!("Recording win for {}", name);
        self.with_conn(move |conn| {
            // IMMEDIATE takes the write lock up front so a second connection
            // on the same file cannot interleave between the two statements.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(INSERT_PLAYER_SQL, params![name])?;
            tx.execute(
                "INSERT INTO scores (player_id, score)
                 SELECT id, 1 FROM players WHERE name = ?1
                 ON CONFLICT(player_id) DO UPDATE SET score = score + 1",
                params![name],
            )?;
            tx.commit()
        })
        .await
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

const INSERT_PLAYER_SQL: &str =
    "INSERT INTO players (name) VALUES (?1) ON CONFLICT(name) DO NOTHING";

fn read_score(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<u64> {
    let score: i64 = row.get(idx)?;
    u64::try_from(score).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, score))
}

fn map_player(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        name: row.get(0)?,
        score: read_score(row, 1)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS scores (
    player_id INTEGER NOT NULL UNIQUE,
    score     INTEGER NOT NULL CHECK (score >= 0),
    FOREIGN KEY (player_id) REFERENCES players(id)
);
"#;
