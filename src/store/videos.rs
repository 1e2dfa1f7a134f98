//! Per-creator video stores
//!
//! One CSV file per creator id, newest fetches first. A merge never
//! rewrites an existing row: whichever fetch first saw a bvid owns its
//! fields for good.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;

/// One scraped video, exactly as the listing page showed it.
///
/// `play_count`, `pub_date`, and `duration` are free text and stored
/// verbatim; see [`crate::normalize`] for read-time parsing. Field
/// order here is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub url: String,
    pub bvid: String,
    pub user_name: String,
    pub title: String,
    pub play_count: String,
    pub pub_date: String,
    pub duration: String,
    pub fetched_at: String,
}

/// Directory of per-creator CSV files, keyed by creator mid.
///
/// One file per creator keeps concurrent syncs of different creators
/// from contending on a shared store.
#[derive(Debug, Clone)]
pub struct VideoStore {
    data_dir: PathBuf,
}

impl VideoStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Store file for one creator.
    #[must_use]
    pub fn path_for(&self, mid: &str) -> PathBuf {
        self.data_dir.join(format!("{mid}.csv"))
    }

    /// All records for a creator, newest fetch first. A creator that
    /// has never been synced yields an empty list.
    pub fn load(&self, mid: &str) -> Result<Vec<VideoRecord>, StoreError> {
        let path = self.path_for(mid);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    /// The set of bvids already persisted for a creator.
    pub fn known_bvids(&self, mid: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self.load(mid)?.into_iter().map(|r| r.bvid).collect())
    }

    /// Merge freshly scraped records ahead of the stored ones.
    ///
    /// Records whose bvid already exists are discarded (first-seen
    /// wins), as are repeats within `new_records` itself; the survivors
    /// are prepended in scrape order. Returns how many records were
    /// actually added; zero leaves the file untouched.
    pub fn merge_new(
        &self,
        mid: &str,
        new_records: Vec<VideoRecord>,
    ) -> Result<usize, StoreError> {
        if new_records.is_empty() {
            return Ok(0);
        }

        let existing = self.load(mid)?;
        let mut seen: HashSet<String> = existing.iter().map(|r| r.bvid.clone()).collect();

        let mut combined: Vec<VideoRecord> = new_records
            .into_iter()
            .filter(|record| seen.insert(record.bvid.clone()))
            .collect();
        let added = combined.len();
        if added == 0 {
            return Ok(0);
        }
        combined.extend(existing);

        self.write_all(mid, &combined)?;
        info!(mid, added, total = combined.len(), "persisted video store");
        Ok(added)
    }

    fn write_all(&self, mid: &str, records: &[VideoRecord]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.path_for(mid);
        let tmp = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
