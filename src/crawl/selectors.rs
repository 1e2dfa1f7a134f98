//! DOM coupling surface
//!
//! Every selector, marker string, script, and URL template the scraper
//! depends on. The platform ships markup changes without notice;
//! keeping the coupling here keeps the blast radius to one file.

/// Base of a creator's space.
pub const SPACE_URL: &str = "https://space.bilibili.com";

/// Listing page of a creator's published videos.
#[must_use]
pub fn listing_url(mid: &str) -> String {
    format!("{SPACE_URL}/{mid}/video")
}

/// A creator's profile page.
#[must_use]
pub fn profile_url(mid: &str) -> String {
    format!("{SPACE_URL}/{mid}")
}

/// One video card in the listing grid.
pub const VIDEO_CARD: &str = "div.bili-video-card";

/// Title element inside a card; its link text is the preferred title.
pub const CARD_TITLE_LINK: &str = "div.bili-video-card__title a";

/// Cover overlay of a card; its spans carry play count and duration.
pub const CARD_COVER: &str = "div.bili-video-card__cover";

/// Subtitle element of a card, carrying the publish date.
pub const CARD_SUBTITLE: &str = "div.bili-video-card__subtitle";

/// Pagination containers, most specific widget first.
pub const PAGINATION_REGIONS: &[&str] = &[
    "div.vui_pagenation",
    "div[class*='page']",
    ".be-pager",
    ".pagination-btn",
];

/// Numbered page buttons, used when no container text matches.
pub const PAGE_NUMBER_BUTTONS: &str =
    "button.be-pager-item, button[class*='page-item'], a.be-pager-item";

/// Side buttons of the pager; the enabled one labeled 下一页 advances.
pub const PAGER_SIDE_BUTTONS: &str = "button.vui_pagenation--btn-side";

/// Label on the next-page control.
pub const NEXT_PAGE_LABEL: &str = "下一页";

/// Transient overlays that swallow clicks until dismissed.
pub const OVERLAY_CLOSE_CONTROLS: &str = "[class*='close'], [class*='Close'], .lt-icon-close";

/// Listing page title marker: the creator name precedes it.
pub const TITLE_UPLOADS_MARKER: &str = "投稿视频";

/// Possessive particle fallback for the listing page title.
pub const TITLE_POSSESSIVE_MARKER: &str = "的";

/// Profile page title marker: the creator name precedes it.
pub const PROFILE_TITLE_MARKER: &str = "的个人空间";

/// Nickname candidates on the profile page, most specific first.
pub const NICKNAME_SELECTORS: &[&str] = &[
    ".nickname",
    ".h-name",
    "#h-name",
    "[class*='nickname']",
    "[class*='name']",
];

/// Script fallback for the next-page click, for when a sticky element
/// wins the hit test over the pager. Evaluates to whether an enabled
/// control was found and clicked.
pub const NEXT_CLICK_SCRIPT: &str = r#"
(() => {
  const buttons = document.querySelectorAll('button');
  for (const button of buttons) {
    if (button.textContent.includes('下一页') && !button.disabled) {
      button.click();
      return true;
    }
  }
  return false;
})()
"#;
