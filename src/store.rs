//! Flat JSON documents loaded once per run and written back once at the end.
//!
//! A missing or malformed document is never fatal: it is logged and the
//! default value is used instead.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consts::files;

/// Channel name -> feed URL
pub type ChannelRegistry = BTreeMap<String, String>;

/// Feed URL -> last notified video id
pub type FeedState = BTreeMap<String, String>;

/// Ticker -> held position
pub type Portfolio = BTreeMap<String, Position>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("writing {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("encoding {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotState {
    #[serde(default)]
    pub last_update_id: i64,
    #[serde(default)]
    pub subscribers: BTreeSet<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub qty: f64,
    #[serde(default)]
    pub avg: f64,
}

pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} not found, starting empty", path.display());
            return T::default();
        }
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Malformed {}, using default: {e}", path.display());
        T::default()
    })
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Saved {}", path.display());
    Ok(())
}

/// Locations of the persisted documents inside the data directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn load_channels(&self) -> ChannelRegistry {
        load_json(&self.path(files::CHANNELS))
    }

    pub fn save_channels(&self, channels: &ChannelRegistry) -> Result<(), StoreError> {
        save_json(&self.path(files::CHANNELS), channels)
    }

    pub fn load_feed_state(&self) -> FeedState {
        load_json(&self.path(files::FEED_STATE))
    }

    pub fn save_feed_state(&self, state: &FeedState) -> Result<(), StoreError> {
        save_json(&self.path(files::FEED_STATE), state)
    }

    pub fn load_bot_state(&self) -> BotState {
        load_json(&self.path(files::BOT_STATE))
    }

    pub fn save_bot_state(&self, state: &BotState) -> Result<(), StoreError> {
        save_json(&self.path(files::BOT_STATE), state)
    }

    pub fn load_portfolio(&self) -> Portfolio {
        load_json(&self.path(files::PORTFOLIO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_documents_load_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_channels().is_empty());
        assert!(store.load_feed_state().is_empty());
        assert!(store.load_portfolio().is_empty());
        assert_eq!(store.load_bot_state(), BotState::default());
    }

    #[test]
    fn malformed_document_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(files::CHANNELS), "{ not json").unwrap();
        fs::write(dir.path().join(files::BOT_STATE), "null").unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_channels().is_empty());
        assert_eq!(store.load_bot_state(), BotState::default());
    }

    #[test]
    fn bot_state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let state = BotState {
            last_update_id: 812,
            subscribers: [5, -100123].into_iter().collect(),
        };
        store.save_bot_state(&state).unwrap();
        assert_eq!(store.load_bot_state(), state);

        let raw = fs::read_to_string(dir.path().join(files::BOT_STATE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["last_update_id"].as_i64(), Some(812));
        assert!(value["subscribers"].is_array());
        // pretty-printed
        assert!(raw.contains('\n'));
    }

    #[test]
    fn bot_state_tolerates_missing_fields_and_duplicates() {
        let state: BotState = serde_json::from_str(r#"{"subscribers": [3, 3, 1]}"#).unwrap();
        assert_eq!(state.last_update_id, 0);
        assert_eq!(state.subscribers.len(), 2);
    }

    #[test]
    fn portfolio_defaults() {
        let portfolio: Portfolio = serde_json::from_str(
            r#"{"VOO": {"name": "Vanguard S&P 500", "qty": 3, "avg": 410.5}, "AAPL": {}}"#,
        )
        .unwrap();
        assert_eq!(portfolio["VOO"].qty, 3.0);
        assert_eq!(portfolio["VOO"].name.as_deref(), Some("Vanguard S&P 500"));
        assert_eq!(portfolio["AAPL"], Position::default());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nope"));
        let err = store.save_channels(&ChannelRegistry::new()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
