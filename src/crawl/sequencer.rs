//! Crawl Sequencer
//!
//! Drives one creator's listing pages into a lazy stream of records.
//! The page loop runs on its own task and feeds a bounded channel;
//! the consumer cancels the crawl by dropping the feed. A crawl is
//! restartable only by starting over with a new session.

use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use futures::Stream;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::extractor::extract_video_cards;
use super::pagination;
use super::progress::{self, ProgressCallback};
use super::selectors::{
    NICKNAME_SELECTORS, PROFILE_TITLE_MARKER, TITLE_POSSESSIVE_MARKER, TITLE_UPLOADS_MARKER,
    VIDEO_CARD, listing_url, profile_url,
};
use crate::browser::BrowserSession;
use crate::store::VideoRecord;

/// How often the readiness wait re-checks for the card container.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound of the random jitter added to the inter-page pause.
const PAGE_PAUSE_JITTER_MS: u64 = 1000;

/// Capacity of the record channel. Small on purpose: it keeps the
/// page loop roughly in step with the consumer, so an early stop does
/// not waste pages nobody will read.
const FEED_CAPACITY: usize = 64;

/// Options for one crawl run.
#[derive(Clone)]
pub struct CrawlOptions {
    /// Cap on pages to visit; `None` crawls the whole listing.
    pub max_pages: Option<usize>,
    /// How long to wait for the first video card before degrading.
    pub ready_timeout: Duration,
    /// Fixed delay used instead when the readiness wait times out.
    pub degraded_delay: Duration,
    /// Base pause between page loads; jitter is added on top.
    pub page_pause: Duration,
    /// Per-page progress callback; progress goes to the log when unset.
    pub progress: Option<ProgressCallback>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            ready_timeout: Duration::from_secs(10),
            degraded_delay: Duration::from_secs(5),
            page_pause: Duration::from_secs(2),
            progress: None,
        }
    }
}

/// Lazy stream of records from one crawl run.
///
/// Records arrive in listing order, already deduplicated within the
/// run. Dropping the feed aborts the underlying page loop.
pub struct VideoFeed {
    user_name: String,
    total_pages: usize,
    rx: ReceiverStream<VideoRecord>,
    worker: JoinHandle<()>,
}

impl VideoFeed {
    /// Creator display name resolved from the listing page.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Page count this crawl will visit.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }
}

impl Stream for VideoFeed {
    type Item = VideoRecord;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
    ) -> Poll<Option<VideoRecord>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl Drop for VideoFeed {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

/// Start a crawl of one creator's published-video listing.
///
/// Resolves the creator's display name and the page count, then hands
/// back a [`VideoFeed`] fed by a background page loop. Failing to load
/// the listing at all is an error; after that, problems degrade
/// per-page instead of failing the crawl.
pub async fn start_crawl(
    session: &BrowserSession,
    mid: &str,
    options: CrawlOptions,
) -> Result<VideoFeed> {
    let page = session.new_page().await?;
    let url = listing_url(mid);
    page.goto(url.as_str())
        .await
        .with_context(|| format!("failed to load listing {url}"))?;
    page.wait_for_navigation()
        .await
        .context("failed waiting for listing navigation")?;

    wait_for_cards(&page, options.ready_timeout, options.degraded_delay).await;

    let user_name = resolve_user_name(&page, mid).await;
    let mut total_pages = pagination::total_pages(&page).await;
    if let Some(cap) = options.max_pages {
        total_pages = total_pages.min(cap.max(1));
    }
    info!(mid, user_name = %user_name, total_pages, "starting crawl");

    let (tx, rx) = mpsc::channel(FEED_CAPACITY);
    let worker = tokio::spawn(page_loop(page, user_name.clone(), total_pages, options, tx));

    Ok(VideoFeed {
        user_name,
        total_pages,
        rx: ReceiverStream::new(rx),
        worker,
    })
}

/// Resolve a creator's display name from their profile page.
///
/// Tries the nickname selectors in order, then the profile page
/// title, before synthesizing a name from the mid. Never fails: a
/// creator with an unreadable profile still gets a usable name.
pub async fn fetch_profile_name(session: &BrowserSession, mid: &str) -> String {
    match profile_name_inner(session, mid).await {
        Ok(Some(name)) => name,
        Ok(None) => format!("User_{mid}"),
        Err(e) => {
            warn!(mid, "failed to resolve profile name: {e:#}");
            format!("User_{mid}")
        }
    }
}

async fn profile_name_inner(session: &BrowserSession, mid: &str) -> Result<Option<String>> {
    let page = session.new_page().await?;
    let url = profile_url(mid);
    page.goto(url.as_str())
        .await
        .with_context(|| format!("failed to load profile {url}"))?;
    page.wait_for_navigation()
        .await
        .context("failed waiting for profile navigation")?;

    wait_for_any(&page, NICKNAME_SELECTORS, Duration::from_secs(10)).await;

    for selector in NICKNAME_SELECTORS {
        if let Ok(element) = page.find_element(*selector).await {
            if let Ok(Some(text)) = element.inner_text().await {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    return Ok(Some(text));
                }
            }
        }
    }

    let title = page_title(&page).await;
    Ok(title
        .split_once(PROFILE_TITLE_MARKER)
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty()))
}

async fn page_loop(
    page: Page,
    user_name: String,
    total_pages: usize,
    options: CrawlOptions,
    tx: mpsc::Sender<VideoRecord>,
) {
    let mut yielded: HashSet<String> = HashSet::new();

    for current in 1..=total_pages {
        progress::report(
            options.progress.as_ref(),
            current,
            total_pages,
            &format!("正在读取第 {current}/{total_pages} 页"),
        );

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!(current, "failed to read page content, stopping crawl: {e}");
                return;
            }
        };

        for record in extract_video_cards(&html, &user_name) {
            // Adjacent pages can re-show an item when the listing
            // shifts under the pager mid-crawl.
            if !yielded.insert(record.bvid.clone()) {
                continue;
            }
            if tx.send(record).await.is_err() {
                debug!("feed dropped, stopping crawl");
                return;
            }
        }

        if current < total_pages {
            if !pagination::advance(&page).await {
                warn!(current, total_pages, "pagination stopped early");
                return;
            }
            let jitter = rand::rng().random_range(0..=PAGE_PAUSE_JITTER_MS);
            tokio::time::sleep(options.page_pause + Duration::from_millis(jitter)).await;
        }
    }
    debug!(total_pages, "crawl exhausted the listing");
}

/// Poll until the card container renders, degrading to a fixed delay
/// on timeout rather than failing the crawl.
async fn wait_for_cards(page: &Page, timeout: Duration, degraded_delay: Duration) {
    let start = Instant::now();
    loop {
        if page.find_element(VIDEO_CARD).await.is_ok() {
            debug!(elapsed = ?start.elapsed(), "listing rendered");
            return;
        }
        if start.elapsed() >= timeout {
            warn!("timed out waiting for the listing to render, continuing after a fixed delay");
            tokio::time::sleep(degraded_delay).await;
            return;
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

async fn wait_for_any(page: &Page, selectors: &[&str], timeout: Duration) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        for selector in selectors {
            if page.find_element(*selector).await.is_ok() {
                return;
            }
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

async fn resolve_user_name(page: &Page, mid: &str) -> String {
    let title = page_title(page).await;
    creator_name_from_title(&title).unwrap_or_else(|| format!("User_{mid}"))
}

async fn page_title(page: &Page) -> String {
    match page.evaluate("document.title").await {
        Ok(result) => result.into_value::<String>().unwrap_or_default(),
        Err(e) => {
            debug!("failed to read page title: {e}");
            String::new()
        }
    }
}

/// Creator name from a listing page title: the text before the uploads
/// marker, else before the possessive particle.
pub(crate) fn creator_name_from_title(title: &str) -> Option<String> {
    for marker in [TITLE_UPLOADS_MARKER, TITLE_POSSESSIVE_MARKER] {
        if let Some((name, _)) = title.split_once(marker) {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}
