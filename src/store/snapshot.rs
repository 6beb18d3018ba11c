//! Read-only league backed by a serialized JSON snapshot.
//!
//! The source is re-read from the start on every call, so edits made to the
//! underlying file between requests are picked up without a restart. There is
//! no way to record a win here; only [`LeagueStore`] is implemented.

use async_trait::async_trait;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::{find_player, League, LeagueStore, StoreError};

/// League decoded from a seekable byte source holding `[{"Name":..,"Score":..}]`.
pub struct SnapshotStore<R> {
    source: Arc<Mutex<R>>,
}

impl<R> SnapshotStore<R>
where
    R: Read + Seek + Send + 'static,
{
    pub fn new(source: R) -> Self {
        SnapshotStore {
            source: Arc::new(Mutex::new(source)),
        }
    }
}

impl SnapshotStore<File> {
    /// Open a snapshot file for reading.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

/// Rewind `source` and decode the whole league from it.
pub fn read_league<R: Read + Seek>(source: &mut R) -> Result<League, StoreError> {
    source.seek(SeekFrom::Start(0)).map_err(StoreError::Seek)?;
    serde_json::from_reader(source).map_err(StoreError::Decode)
}

#[async_trait]
impl<R> LeagueStore for SnapshotStore<R>
where
    R: Read + Seek + Send + 'static,
{
    async fn get_player_score(&self, name: &str) -> Result<Option<u64>, StoreError> {
        let league = self.get_league().await?;
        Ok(find_player(&league, name).map(|p| p.score))
    }

    async fn get_league(&self) -> Result<League, StoreError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let mut source = source.lock().unwrap_or_else(PoisonError::into_inner);
            read_league(&mut *source)
        })
        .await
        .map_err(StoreError::Join)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Player;
    use std::io::{self, Cursor, Write};

    const LEAGUE_JSON: &str = r#"[
        {"Name": "Albert", "Score": 40},
        {"Name": "Sergey", "Score": 57}]"#;

    fn albert_and_sergey() -> League {
        vec![Player::new("Albert", 40), Player::new("Sergey", 57)]
    }

    /// Source that can be read but never rewound.
    struct Unseekable;

    impl Read for Unseekable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Seek for Unseekable {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "not seekable"))
        }
    }

    #[tokio::test]
    async fn test_league_from_reader() {
        let store = SnapshotStore::new(Cursor::new(LEAGUE_JSON));
        assert_eq!(store.get_league().await.unwrap(), albert_and_sergey());
    }

    #[tokio::test]
    async fn test_league_reread_is_identical() {
        let store = SnapshotStore::new(Cursor::new(LEAGUE_JSON));
        let first = store.get_league().await.unwrap();
        let second = store.get_league().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second, albert_and_sergey());
    }

    #[tokio::test]
    async fn test_player_score() {
        let store = SnapshotStore::new(Cursor::new(LEAGUE_JSON));
        assert_eq!(store.get_player_score("Sergey").await.unwrap(), Some(57));
        assert_eq!(store.get_player_score("Chris").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_array() {
        let store = SnapshotStore::new(Cursor::new("[]"));
        assert!(store.get_league().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let store = SnapshotStore::new(Cursor::new(r#"[{"Name": "Albert", "Score": "#));
        let err = store.get_league().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_broken_source_is_seek_error() {
        let store = SnapshotStore::new(Unseekable);
        let err = store.get_player_score("Albert").await.unwrap_err();
        assert!(matches!(err, StoreError::Seek(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LEAGUE_JSON.as_bytes()).unwrap();

        let store = SnapshotStore::open(file.path()).unwrap();
        assert_eq!(store.get_league().await.unwrap(), albert_and_sergey());
    }
}
