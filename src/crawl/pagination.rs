//! Pagination Controller
//!
//! Total-page detection and next-page navigation for the listing grid.
//! Detection is best-effort: a layout mismatch degrades to a
//! single-page crawl instead of failing the sync, and a dead next
//! control just ends the crawl where it stands.

use std::time::Duration;

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::selectors::{
    NEXT_CLICK_SCRIPT, NEXT_PAGE_LABEL, OVERLAY_CLOSE_CONTROLS, PAGE_NUMBER_BUTTONS,
    PAGER_SIDE_BUTTONS, PAGINATION_REGIONS,
};

/// Pause after poking at the DOM (overlay close, scroll) before the
/// next interaction.
const INTERACTION_SETTLE: Duration = Duration::from_millis(500);

/// Phrasings of "total N pages" seen across pager widget versions,
/// tried in order.
static TOTAL_PAGES_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"共\s*(\d+)\s*页", r"(\d+)\s*页", r"/\s*(\d+)"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid pattern"))
        .collect()
});

/// Find a page count in pagination-region text.
pub(crate) fn parse_total_pages_text(text: &str) -> Option<usize> {
    for pattern in TOTAL_PAGES_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(pages) = captures[1].parse::<usize>() {
                return Some(pages);
            }
        }
    }
    None
}

/// Number of listing pages, read from the pager text when possible and
/// the numbered buttons otherwise. Returns 1 when neither can be read:
/// a single-page crawl beats a failed one.
pub async fn total_pages(page: &Page) -> usize {
    for selector in PAGINATION_REGIONS {
        let Ok(regions) = page.find_elements(*selector).await else {
            continue;
        };
        for region in regions {
            if let Ok(Some(text)) = region.inner_text().await {
                if let Some(pages) = parse_total_pages_text(&text) {
                    debug!(pages, selector, "total pages from pager text");
                    return pages;
                }
            }
        }
    }

    if let Ok(buttons) = page.find_elements(PAGE_NUMBER_BUTTONS).await {
        let mut highest = None;
        for button in buttons {
            if let Ok(Some(text)) = button.inner_text().await {
                if let Ok(number) = text.trim().parse::<usize>() {
                    highest = Some(highest.map_or(number, |h: usize| h.max(number)));
                }
            }
        }
        if let Some(pages) = highest {
            debug!(pages, "total pages from numbered buttons");
            return pages;
        }
    }

    warn!("could not determine total pages, assuming a single page");
    1
}

/// Advance the listing to the next page.
///
/// Returns `false` when no enabled next control exists (end of
/// pagination, or the layout moved) or every way of activating it
/// failed; either way the caller stops crawling. After `true` the
/// caller must pause before reading the new page so it can render.
pub async fn advance(page: &Page) -> bool {
    dismiss_overlays(page).await;

    let Some(next) = find_next_button(page).await else {
        debug!("no enabled next-page control");
        return false;
    };

    if next.scroll_into_view().await.is_err() {
        debug!("next-page control would not scroll into view");
    }
    tokio::time::sleep(INTERACTION_SETTLE).await;

    if next.click().await.is_ok() {
        return true;
    }

    // A sticky element can win the hit test over the pager; a
    // script-dispatched click bypasses hit testing entirely.
    match page.evaluate(NEXT_CLICK_SCRIPT).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            debug!("script click failed: {e}");
            false
        }
    }
}

/// Click anything that looks like a close control so overlays stop
/// swallowing pager clicks. Best effort only.
async fn dismiss_overlays(page: &Page) {
    let Ok(controls) = page.find_elements(OVERLAY_CLOSE_CONTROLS).await else {
        return;
    };
    for control in controls {
        if control.click().await.is_ok() {
            tokio::time::sleep(INTERACTION_SETTLE).await;
        }
    }
}

async fn find_next_button(page: &Page) -> Option<Element> {
    let buttons = page.find_elements(PAGER_SIDE_BUTTONS).await.ok()?;
    for button in buttons {
        let label = button.inner_text().await.ok().flatten().unwrap_or_default();
        if !label.contains(NEXT_PAGE_LABEL) {
            continue;
        }
        let class = button
            .attribute("class")
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        if class.contains("disabled") {
            continue;
        }
        return Some(button);
    }
    None
}
