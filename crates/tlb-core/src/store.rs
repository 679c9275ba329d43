//! File-backed stores for the two persisted documents.
//!
//! Both documents are materialized fresh from disk on every access and fully
//! rewritten on every mutation; there is no in-memory cache and no locking.
//! Concurrent writers race and the later save wins.

use std::{collections::BTreeMap, fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{board::Board, Result};

/// Store for the leaderboard document.
#[derive(Clone, Debug)]
pub struct BoardStore {
    path: PathBuf,
}

impl BoardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse the persisted board. A missing or malformed file is an
    /// error here; callers that want the empty-board fallback use
    /// [`BoardStore::load_or_default`].
    pub fn load(&self) -> Result<Board> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn load_or_default(&self) -> Board {
        match self.load() {
            Ok(board) => board,
            Err(e) => {
                if self.path.exists() {
                    tracing::warn!(
                        "unreadable board file {}: {e}; treating as empty",
                        self.path.display()
                    );
                }
                Board::default()
            }
        }
    }

    /// Fully overwrite the persisted document. I/O failures propagate.
    pub fn save(&self, board: &Board) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(board)?)?;
        Ok(())
    }
}

/// Which chat channel and which message ids display each category, recorded
/// by the setup command so the refresh loop can edit messages in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub channel_id: Option<i64>,
    #[serde(default)]
    pub message_ids: BTreeMap<String, i32>,
}

/// Store for the setup document. Same policy as [`BoardStore`].
#[derive(Clone, Debug)]
pub struct SetupStore {
    path: PathBuf,
}

impl SetupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Setup> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn load_or_default(&self) -> Setup {
        match self.load() {
            Ok(setup) => setup,
            Err(e) => {
                if self.path.exists() {
                    tracing::warn!(
                        "unreadable setup file {}: {e}; treating as empty",
                        self.path.display()
                    );
                }
                Setup::default()
            }
        }
    }

    pub fn save(&self, setup: &Setup) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(setup)?)?;
        Ok(())
    }

    /// Replace the whole setup document. Categories not present in the new
    /// map lose their tracked message.
    pub fn record_setup(
        &self,
        channel_id: i64,
        message_ids: BTreeMap<String, i32>,
    ) -> Result<()> {
        self.save(&Setup {
            channel_id: Some(channel_id),
            message_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{upsert_entry, Board};
    use serde_json::json;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tlb-store-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_defaults_to_empty_board() {
        let dir = scratch_dir("missing");
        let store = BoardStore::new(dir.join("leaderboard.json"));

        assert!(store.load().is_err());
        assert!(store.load_or_default().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_defaults_to_empty_board() {
        let dir = scratch_dir("corrupt");
        let path = dir.join("leaderboard.json");
        fs::write(&path, "{ not json").unwrap();

        let store = BoardStore::new(&path);
        assert!(store.load().is_err());
        assert!(store.load_or_default().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load_is_a_fixed_point() {
        let dir = scratch_dir("roundtrip");
        let store = BoardStore::new(dir.join("leaderboard.json"));

        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(100));
        upsert_entry(&mut board, "Money", "bob", json!(null));
        upsert_entry(&mut board, "Speed", "carol", json!("12.3s"));

        store.save(&board).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, board);

        // Saving what we loaded changes nothing on disk.
        let before = fs::read_to_string(dir.join("leaderboard.json")).unwrap();
        store.save(&loaded).unwrap();
        let after = fs::read_to_string(dir.join("leaderboard.json")).unwrap();
        assert_eq!(before, after);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn record_setup_replaces_prior_document() {
        let dir = scratch_dir("setup");
        let store = SetupStore::new(dir.join("leaderboard_setup.json"));

        let mut first = BTreeMap::new();
        first.insert("Money".to_string(), 11);
        first.insert("Speed".to_string(), 12);
        store.record_setup(100, first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("Money".to_string(), 21);
        store.record_setup(200, second.clone()).unwrap();

        let setup = store.load().unwrap();
        assert_eq!(setup.channel_id, Some(200));
        assert_eq!(setup.message_ids, second);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_setup_document_fills_defaults() {
        let dir = scratch_dir("partial");
        let path = dir.join("leaderboard_setup.json");
        fs::write(&path, r#"{"channel_id": 42}"#).unwrap();

        let setup = SetupStore::new(&path).load().unwrap();
        assert_eq!(setup.channel_id, Some(42));
        assert!(setup.message_ids.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
