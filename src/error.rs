//! Failure taxonomy for sync operations
//!
//! Only conditions that abort a creator's sync surface here. Everything
//! the pipeline can recover from in place (page-ready timeouts,
//! unreadable cards, a dead next-page control) is handled where it
//! happens and at most logged.

use thiserror::Error;

/// Errors from the on-disk stores (per-creator CSV, following JSON).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-creator sync failures. A failed creator never aborts a batch;
/// callers report the failure and move on to the next creator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The browser binary could not be launched. Fatal for this
    /// creator's sync and not retried.
    #[error("browser session failed to start: {0:#}")]
    SessionStart(anyhow::Error),

    /// The listing page never became usable (navigation failed or the
    /// browser died before the first page was read).
    #[error("crawl failed for creator {mid}: {reason:#}")]
    Crawl { mid: String, reason: anyhow::Error },

    /// Reading or writing this creator's store failed.
    #[error("persistence failed for creator {mid}: {source}")]
    Persistence {
        mid: String,
        #[source]
        source: StoreError,
    },
}
