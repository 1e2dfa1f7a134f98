//! Progress reporting for crawls

use std::sync::Arc;

use tracing::info;

/// Synchronous per-page progress callback: `(current_page, total_pages,
/// message)`. Runs on the crawl task between page reads, so it must
/// not block for long.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Report one page of progress through the callback, or the log when
/// none is installed.
pub(crate) fn report(
    progress: Option<&ProgressCallback>,
    current: usize,
    total: usize,
    message: &str,
) {
    match progress {
        Some(callback) => callback(current, total, message),
        None => info!(current, total, "{message}"),
    }
}
