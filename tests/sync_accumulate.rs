//! Early-stop behavior of the sync engine's stream accumulator, and
//! the end-to-end merge scenarios it feeds.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;

use bilitrack::sync::CONSECUTIVE_DUPLICATE_STOP;
use bilitrack::{VideoRecord, VideoStore, accumulate_new};

fn record(bvid: &str) -> VideoRecord {
    VideoRecord {
        url: format!("https://www.bilibili.com/video/{bvid}"),
        bvid: bvid.to_string(),
        user_name: "up".to_string(),
        title: format!("video {bvid}"),
        play_count: "0".to_string(),
        pub_date: "Unknown".to_string(),
        duration: "00:00".to_string(),
        fetched_at: "2026-08-08 12:00:00".to_string(),
    }
}

/// Stream over `records` that counts how many items the consumer
/// actually pulled.
fn counted_feed(
    records: Vec<VideoRecord>,
) -> (
    impl futures::Stream<Item = VideoRecord> + Unpin,
    Arc<AtomicUsize>,
) {
    let consumed = Arc::new(AtomicUsize::new(0));
    let counter = consumed.clone();
    let feed = futures::stream::iter(records).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (feed, consumed)
}

#[tokio::test]
async fn stops_after_ten_consecutive_known_records() {
    let records: Vec<VideoRecord> = (0..30).map(|i| record(&format!("BV{i}"))).collect();
    let known: HashSet<String> = records.iter().map(|r| r.bvid.clone()).collect();
    let (feed, consumed) = counted_feed(records);

    let outcome = accumulate_new(feed, &known).await;

    assert!(outcome.stopped_early);
    assert!(outcome.fresh.is_empty());
    assert_eq!(outcome.duplicates, CONSECUTIVE_DUPLICATE_STOP);
    // Nothing past the stop point was pulled from the feed.
    assert_eq!(consumed.load(Ordering::SeqCst), CONSECUTIVE_DUPLICATE_STOP);
}

#[tokio::test]
async fn a_new_record_resets_the_streak() {
    let mut records = Vec::new();
    for i in 0..9 {
        records.push(record(&format!("known{i}")));
    }
    records.push(record("fresh"));
    for i in 9..19 {
        records.push(record(&format!("known{i}")));
    }
    let known: HashSet<String> = records
        .iter()
        .filter(|r| r.bvid != "fresh")
        .map(|r| r.bvid.clone())
        .collect();
    let (feed, consumed) = counted_feed(records);

    let outcome = accumulate_new(feed, &known).await;

    assert!(outcome.stopped_early);
    assert_eq!(outcome.fresh.len(), 1);
    assert_eq!(outcome.fresh[0].bvid, "fresh");
    assert_eq!(outcome.duplicates, 19);
    assert_eq!(consumed.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn short_duplicate_runs_do_not_stop_the_crawl() {
    let mut records = Vec::new();
    for i in 0..9 {
        records.push(record(&format!("known{i}")));
    }
    records.push(record("fresh"));
    let known: HashSet<String> = records
        .iter()
        .filter(|r| r.bvid != "fresh")
        .map(|r| r.bvid.clone())
        .collect();
    let (feed, consumed) = counted_feed(records);

    let outcome = accumulate_new(feed, &known).await;

    assert!(!outcome.stopped_early);
    assert_eq!(outcome.fresh.len(), 1);
    assert_eq!(consumed.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn two_pages_of_five_unique_videos_all_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());
    let mid = "42";

    // Two listing pages of five unique videos each.
    let crawl: Vec<VideoRecord> = (0..10).map(|i| record(&format!("BV{i}"))).collect();

    let known = store.known_bvids(mid).unwrap();
    let outcome = accumulate_new(futures::stream::iter(crawl.clone()), &known).await;
    assert_eq!(outcome.fresh.len(), 10);
    assert!(!outcome.stopped_early);

    let added = store.merge_new(mid, outcome.fresh).unwrap();
    assert_eq!(added, 10);

    let rows = store.load(mid).unwrap();
    assert_eq!(rows.len(), 10);
    let bvids: HashSet<String> = rows.iter().map(|r| r.bvid.clone()).collect();
    assert_eq!(bvids.len(), 10);
}

#[tokio::test]
async fn rerunning_an_unchanged_listing_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());
    let mid = "42";

    let crawl: Vec<VideoRecord> = (0..20).map(|i| record(&format!("BV{i}"))).collect();

    let first = accumulate_new(
        futures::stream::iter(crawl.clone()),
        &store.known_bvids(mid).unwrap(),
    )
    .await;
    assert_eq!(store.merge_new(mid, first.fresh).unwrap(), 20);
    let before = store.load(mid).unwrap();

    // Second sync sees the same 20 in the same order: ten consecutive
    // duplicates end the crawl at record ten, nothing new is added,
    // and the store is untouched.
    let known = store.known_bvids(mid).unwrap();
    let (feed, consumed) = counted_feed(crawl);
    let second = accumulate_new(feed, &known).await;

    assert!(second.stopped_early);
    assert!(second.fresh.is_empty());
    assert_eq!(consumed.load(Ordering::SeqCst), CONSECUTIVE_DUPLICATE_STOP);

    assert_eq!(store.merge_new(mid, second.fresh).unwrap(), 0);
    assert_eq!(store.load(mid).unwrap(), before);
}
