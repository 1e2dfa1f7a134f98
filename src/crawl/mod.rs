//! The browser-driven crawling pipeline
//!
//! `sequencer` orchestrates `pagination` and `extractor` over a
//! [`crate::browser::BrowserSession`] into a lazy stream of records.
//! All coupling to the platform's DOM is quarantined in `selectors`,
//! so selector and pattern churn never touches the orchestration.

pub mod extractor;
pub mod pagination;
pub mod progress;
pub mod selectors;
pub mod sequencer;

pub use progress::ProgressCallback;
pub use sequencer::{CrawlOptions, VideoFeed, fetch_profile_name, start_crawl};
