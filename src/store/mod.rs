//! On-disk stores
//!
//! One CSV file per creator for scraped records, one JSON file for the
//! following list. Both write through a sibling temp file and rename,
//! so a failed write never corrupts an existing store.

mod following;
mod videos;

pub use following::{FollowingStore, Subscription};
pub use videos::{VideoRecord, VideoStore};

use chrono::Local;

/// Wall-clock timestamp in the `YYYY-MM-DD HH:MM:SS` format both
/// stores use.
#[must_use]
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
