//! Page Extractor
//!
//! Turns one rendered listing page into [`VideoRecord`] candidates.
//! The markup is unstable and partially rendered cards are common: a
//! card that cannot be read is skipped and logged, never fatal to the
//! page. Only a missing link disqualifies a card; every other field
//! has a fallback.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::selectors::{CARD_COVER, CARD_SUBTITLE, CARD_TITLE_LINK, VIDEO_CARD};
use crate::normalize::normalize_video_url;
use crate::store::{VideoRecord, now_timestamp};

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(VIDEO_CARD).expect("valid selector"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CARD_TITLE_LINK).expect("valid selector"));
static COVER: Lazy<Selector> = Lazy::new(|| Selector::parse(CARD_COVER).expect("valid selector"));
static SUBTITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CARD_SUBTITLE).expect("valid selector"));
static ANY_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));
static ANY_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").expect("valid selector"));

/// Extract every readable video card from a rendered listing page.
pub fn extract_video_cards(html: &str, user_name: &str) -> Vec<VideoRecord> {
    let document = Html::parse_document(html);
    let fetched_at = now_timestamp();

    let mut records = Vec::new();
    for card in document.select(&CARD) {
        match extract_card(card, user_name, &fetched_at) {
            Some(record) => records.push(record),
            None => debug!("skipping video card without a resolvable link"),
        }
    }
    records
}

fn extract_card(card: ElementRef<'_>, user_name: &str, fetched_at: &str) -> Option<VideoRecord> {
    let link = card.select(&ANY_LINK).next()?;
    let href = link.value().attr("href")?;
    let (url, bvid) = normalize_video_url(href)?;

    let mut title = card
        .select(&TITLE_LINK)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if title.is_empty() {
        title = text_of(link);
    }
    if title.is_empty() {
        title = "Unknown".to_string();
    }

    let mut play_count = "0".to_string();
    let mut duration = "00:00".to_string();
    if let Some(cover) = card.select(&COVER).next() {
        let spans: Vec<String> = cover.select(&ANY_SPAN).map(text_of).collect();
        if let Some(first) = spans.first() {
            if !first.is_empty() {
                play_count = first.clone();
            }
        }
        if let Some(with_colon) = spans.iter().find(|s| s.contains(':')) {
            duration = with_colon.clone();
        }
    }

    let pub_date = card
        .select(&SUBTITLE)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Some(VideoRecord {
        url,
        bvid,
        user_name: user_name.to_string(),
        title,
        play_count,
        pub_date,
        duration,
        fetched_at: fetched_at.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
