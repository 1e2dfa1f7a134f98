//! Pure parsers for the free-text fields the platform serves
//!
//! Scraped fields are persisted verbatim; these run at read time, so a
//! heuristic can change without invalidating stored data.

use chrono::{Datelike, NaiveDate};
use url::Url;

/// Canonicalize a video-card link and derive its bvid.
///
/// Protocol-relative links (`//www...`) become https, the query string
/// and fragment are dropped, and the bvid is the last non-empty path
/// segment. Returns `None` for links that cannot be parsed as a URL or
/// that carry no path to take an id from.
pub fn normalize_video_url(href: &str) -> Option<(String, String)> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    // The platform serves protocol-relative hrefs on video cards.
    let absolute = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("https:{href}")
    };

    let mut url = Url::parse(&absolute).ok()?;
    url.set_query(None);
    url.set_fragment(None);

    let bvid = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?
        .to_string();

    Some((url.to_string(), bvid))
}

/// Parse a free-text play count into a number of plays.
///
/// Counts arrive as bare numbers, as `3.5万` (万 = 10,000), or as `-`
/// when the platform has no figure yet. Exclusive-content markers
/// (`充电专属`) carry no count at all and report as unparseable, as
/// does anything else that is not a number.
pub fn parse_play_count(raw: &str) -> Option<u64> {
    let text = raw.trim();
    if text.is_empty() || text.contains("专属") {
        return None;
    }

    let (figure, scale) = match text.strip_suffix('万') {
        Some(head) => (head, 10_000.0),
        None => (text, 1.0),
    };

    let figure = figure.replace('-', "0");
    let value: f64 = figure.trim().parse().ok()?;
    Some((value * scale).round() as u64)
}

/// Resolve a free-text publish date against `today`.
///
/// Full `YYYY-MM-DD` values parse directly. Values whose first
/// `-`-separated segment is at most two characters are read as `MM-DD`
/// in `today`'s year, rolling the year back by one when that lands in
/// the future. Around a year boundary an `MM-DD` value is genuinely
/// ambiguous and this resolution can be a year off; the heuristic is
/// kept as-is rather than guessing further.
pub fn resolve_pub_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim();
    let (first, _) = text.split_once('-')?;

    if first.chars().count() <= 2 {
        let candidate = format!("{}-{}", today.year(), text);
        let date = NaiveDate::parse_from_str(&candidate, "%Y-%m-%d").ok()?;
        if date > today {
            return date.with_year(today.year() - 1);
        }
        return Some(date);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn protocol_relative_url_is_canonicalized() {
        let (url, bvid) = normalize_video_url("//x.com/av123?foo=bar").unwrap();
        assert_eq!(url, "https://x.com/av123");
        assert_eq!(bvid, "av123");
    }

    #[test]
    fn absolute_url_keeps_scheme_and_drops_fragment() {
        let (url, bvid) =
            normalize_video_url("https://www.bilibili.com/video/BV1xx411c7mD/?spm=333#t=1")
                .unwrap();
        assert_eq!(url, "https://www.bilibili.com/video/BV1xx411c7mD/");
        assert_eq!(bvid, "BV1xx411c7mD");
    }

    #[test]
    fn unusable_hrefs_are_rejected() {
        assert!(normalize_video_url("").is_none());
        assert!(normalize_video_url("   ").is_none());
        assert!(normalize_video_url("//x.com").is_none());
    }

    #[test]
    fn play_counts_parse_with_unit_suffix() {
        assert_eq!(parse_play_count("3.5万"), Some(35_000));
        assert_eq!(parse_play_count("12万"), Some(120_000));
        assert_eq!(parse_play_count("1200"), Some(1200));
        assert_eq!(parse_play_count(" 98 "), Some(98));
    }

    #[test]
    fn dash_placeholder_reads_as_zero() {
        assert_eq!(parse_play_count("-"), Some(0));
        assert_eq!(parse_play_count("-万"), Some(0));
    }

    #[test]
    fn exclusive_markers_and_garbage_are_unparseable() {
        assert_eq!(parse_play_count("充电专属"), None);
        assert_eq!(parse_play_count("专属"), None);
        assert_eq!(parse_play_count("many"), None);
        assert_eq!(parse_play_count(""), None);
    }

    #[test]
    fn month_day_dates_take_the_current_year() {
        let today = day(2026, 8, 8);
        assert_eq!(resolve_pub_date("07-15", today), Some(day(2026, 7, 15)));
        assert_eq!(resolve_pub_date("8-1", today), Some(day(2026, 8, 1)));
    }

    #[test]
    fn future_month_day_dates_roll_back_a_year() {
        let today = day(2026, 1, 5);
        assert_eq!(resolve_pub_date("12-31", today), Some(day(2025, 12, 31)));
        // One day ahead is enough to roll back.
        assert_eq!(
            resolve_pub_date("8-9", day(2026, 8, 8)),
            Some(day(2025, 8, 9))
        );
    }

    #[test]
    fn full_dates_parse_directly() {
        let today = day(2026, 8, 8);
        assert_eq!(resolve_pub_date("2024-03-02", today), Some(day(2024, 3, 2)));
    }

    #[test]
    fn non_dates_resolve_to_none() {
        let today = day(2026, 8, 8);
        assert_eq!(resolve_pub_date("昨天", today), None);
        assert_eq!(resolve_pub_date("13-40", today), None);
        assert_eq!(resolve_pub_date("", today), None);
    }
}
