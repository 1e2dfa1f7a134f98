//! Sync Engine
//!
//! Consumes a crawl's record stream, stops early once it runs into a
//! stretch of already-known videos, and merges whatever is new into
//! the per-creator store. Batch syncs run creators sequentially, each
//! in its own browser session, and keep going past individual
//! failures.

use std::collections::HashSet;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::browser::{BrowserSession, SessionConfig};
use crate::crawl::{CrawlOptions, ProgressCallback, start_crawl};
use crate::error::SyncError;
use crate::store::{FollowingStore, VideoRecord, VideoStore, now_timestamp};

/// How many already-known records in a row end a crawl. This far into
/// unchanged history the remaining pages are assumed synced already,
/// which bounds crawl cost on large, mostly unchanged creators.
pub const CONSECUTIVE_DUPLICATE_STOP: usize = 10;

/// Outcome of draining a crawl stream against the known set.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Accumulation {
    /// Records whose bvid was not yet persisted, in crawl order.
    pub fresh: Vec<VideoRecord>,
    /// Already-known records observed before stopping.
    pub duplicates: usize,
    /// Whether the consecutive-duplicate heuristic ended the crawl.
    pub stopped_early: bool,
}

/// Drain a record stream, keeping unknown records and stopping after
/// [`CONSECUTIVE_DUPLICATE_STOP`] known ones in a row.
///
/// The stream is dropped at the stop point, which cancels an
/// underlying crawl; nothing past the stop is consumed.
pub async fn accumulate_new<S>(mut feed: S, known: &HashSet<String>) -> Accumulation
where
    S: Stream<Item = VideoRecord> + Unpin,
{
    let mut outcome = Accumulation::default();
    let mut consecutive = 0usize;

    while let Some(record) = feed.next().await {
        if known.contains(&record.bvid) {
            outcome.duplicates += 1;
            consecutive += 1;
            if consecutive >= CONSECUTIVE_DUPLICATE_STOP {
                info!("{CONSECUTIVE_DUPLICATE_STOP} consecutive known videos, stopping early");
                outcome.stopped_early = true;
                break;
            }
        } else {
            consecutive = 0;
            outcome.fresh.push(record);
        }
    }
    outcome
}

/// Per-creator report from a batch sync.
#[derive(Debug)]
pub struct CreatorSyncReport {
    pub mid: String,
    pub name: String,
    pub result: Result<usize, SyncError>,
}

/// Orchestrates sessions, crawls, and stores for creator syncs.
pub struct SyncEngine {
    session_config: SessionConfig,
    crawl_options: CrawlOptions,
    videos: VideoStore,
}

impl SyncEngine {
    #[must_use]
    pub fn new(session_config: SessionConfig, videos: VideoStore) -> Self {
        Self {
            session_config,
            crawl_options: CrawlOptions::default(),
            videos,
        }
    }

    /// Override the crawl timing options used by every sync this
    /// engine runs. The page cap is ignored: syncs always crawl until
    /// the early-stop heuristic or the listing ends.
    #[must_use]
    pub fn with_crawl_options(mut self, options: CrawlOptions) -> Self {
        self.crawl_options = options;
        self
    }

    /// Sync one creator: crawl their listing and persist what is new.
    ///
    /// Returns the number of newly persisted records. Partial crawls
    /// (dead pagination, early stop) still persist everything gathered
    /// up to that point and count as a successful sync.
    pub async fn sync_creator(
        &self,
        mid: &str,
        name: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<usize, SyncError> {
        let known = self
            .videos
            .known_bvids(mid)
            .map_err(|source| SyncError::Persistence {
                mid: mid.to_string(),
                source,
            })?;
        info!(mid, name, known = known.len(), "syncing creator");

        let session = BrowserSession::launch(&self.session_config).await?;

        let mut options = self.crawl_options.clone();
        options.max_pages = None;
        options.progress = progress;

        let outcome = match start_crawl(&session, mid, options).await {
            Ok(feed) => accumulate_new(feed, &known).await,
            Err(reason) => {
                session.shutdown().await;
                return Err(SyncError::Crawl {
                    mid: mid.to_string(),
                    reason,
                });
            }
        };
        session.shutdown().await;

        if outcome.stopped_early {
            debug!(mid, duplicates = outcome.duplicates, "crawl ended on known history");
        }

        let added = self
            .videos
            .merge_new(mid, outcome.fresh)
            .map_err(|source| SyncError::Persistence {
                mid: mid.to_string(),
                source,
            })?;
        info!(mid, name, added, duplicates = outcome.duplicates, "sync complete");
        Ok(added)
    }

    /// Sync every followed creator sequentially, each in its own
    /// session. Failures are reported per creator, never fatal to the
    /// batch; each success stamps `last_updated` and saves the
    /// following store before the next creator starts.
    pub async fn sync_all(
        &self,
        following: &mut FollowingStore,
        progress: Option<ProgressCallback>,
    ) -> Vec<CreatorSyncReport> {
        let subscriptions: Vec<(String, String)> = following
            .iter()
            .map(|(mid, subscription)| (mid.clone(), subscription.name.clone()))
            .collect();

        let mut reports = Vec::with_capacity(subscriptions.len());
        for (mid, name) in subscriptions {
            let result = self.sync_creator(&mid, &name, progress.clone()).await;
            match &result {
                Ok(added) => {
                    following.mark_synced(&mid, now_timestamp());
                    if let Err(e) = following.save() {
                        warn!(mid, "failed to save following store: {e}");
                    }
                    info!(mid, name = %name, added, "creator synced");
                }
                Err(e) => warn!(mid, name = %name, "creator sync failed: {e}"),
            }
            reports.push(CreatorSyncReport { mid, name, result });
        }
        reports
    }
}
