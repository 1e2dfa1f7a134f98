//! Following-list store
//!
//! The curated set of creators lives in one JSON file mapping creator
//! mid to subscription details. This is an explicit object with a
//! load/save contract, passed to collaborators by reference; the sync
//! engine only reads `name` and writes back `last_updated`.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::now_timestamp;
use crate::error::StoreError;

/// One followed creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub added_at: String,
    pub last_updated: Option<String>,
}

/// The following list, keyed by creator mid.
#[derive(Debug)]
pub struct FollowingStore {
    path: PathBuf,
    entries: BTreeMap<String, Subscription>,
}

impl FollowingStore {
    /// Load the store, starting empty when the file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, mid: &str) -> Option<&Subscription> {
        self.entries.get(mid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Subscription)> {
        self.entries.iter()
    }

    /// Add a creator. An existing entry keeps its original `added_at`
    /// and sync state.
    pub fn follow(&mut self, mid: impl Into<String>, name: impl Into<String>) {
        self.entries.entry(mid.into()).or_insert_with(|| Subscription {
            name: name.into(),
            added_at: now_timestamp(),
            last_updated: None,
        });
    }

    /// Record a completed sync. No-op for creators not in the list.
    pub fn mark_synced(&mut self, mid: &str, timestamp: String) {
        if let Some(subscription) = self.entries.get_mut(mid) {
            subscription.last_updated = Some(timestamp);
        }
    }
}
