//! Merge semantics of the per-creator video store.

use std::collections::HashSet;

use bilitrack::{VideoRecord, VideoStore};

fn record(bvid: &str, title: &str) -> VideoRecord {
    VideoRecord {
        url: format!("https://www.bilibili.com/video/{bvid}"),
        bvid: bvid.to_string(),
        user_name: "up".to_string(),
        title: title.to_string(),
        play_count: "3.5万".to_string(),
        pub_date: "07-15".to_string(),
        duration: "12:34".to_string(),
        fetched_at: "2026-08-08 12:00:00".to_string(),
    }
}

#[test]
fn first_sync_creates_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    let added = store
        .merge_new("42", vec![record("BV1", "a"), record("BV2", "b")])
        .unwrap();

    assert_eq!(added, 2);
    assert!(store.path_for("42").exists());
    assert_eq!(store.load("42").unwrap().len(), 2);
}

#[test]
fn unsynced_creator_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());
    assert!(store.load("404").unwrap().is_empty());
    assert!(store.known_bvids("404").unwrap().is_empty());
}

#[test]
fn resync_with_nothing_new_leaves_the_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    store
        .merge_new("42", vec![record("BV1", "a"), record("BV2", "b")])
        .unwrap();
    let before = store.load("42").unwrap();

    let added = store
        .merge_new("42", vec![record("BV1", "a"), record("BV2", "b")])
        .unwrap();

    assert_eq!(added, 0);
    assert_eq!(store.load("42").unwrap(), before);
}

#[test]
fn new_records_are_prepended() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    store
        .merge_new("42", vec![record("BV_old1", "old"), record("BV_old2", "older")])
        .unwrap();
    store.merge_new("42", vec![record("BV_new", "new")]).unwrap();

    let bvids: Vec<String> = store
        .load("42")
        .unwrap()
        .into_iter()
        .map(|r| r.bvid)
        .collect();
    assert_eq!(bvids, ["BV_new", "BV_old1", "BV_old2"]);
}

#[test]
fn existing_rows_win_over_rescraped_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    store.merge_new("42", vec![record("BV1", "original title")]).unwrap();

    let mut rescrape = record("BV1", "retitled");
    rescrape.play_count = "99万".to_string();
    let added = store
        .merge_new("42", vec![rescrape, record("BV2", "fresh")])
        .unwrap();

    assert_eq!(added, 1);
    let records = store.load("42").unwrap();
    let original = records.iter().find(|r| r.bvid == "BV1").unwrap();
    assert_eq!(original.title, "original title");
    assert_eq!(original.play_count, "3.5万");
}

#[test]
fn repeats_within_one_batch_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    let added = store
        .merge_new(
            "42",
            vec![record("BV1", "first"), record("BV1", "second"), record("BV2", "b")],
        )
        .unwrap();

    assert_eq!(added, 2);
    let records = store.load("42").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "first");
}

#[test]
fn no_two_rows_ever_share_a_bvid() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    store
        .merge_new("42", vec![record("BV1", "a"), record("BV2", "b")])
        .unwrap();
    store
        .merge_new("42", vec![record("BV2", "b again"), record("BV3", "c")])
        .unwrap();
    store
        .merge_new("42", vec![record("BV3", "c again"), record("BV1", "a again")])
        .unwrap();

    let records = store.load("42").unwrap();
    let bvids: HashSet<String> = records.iter().map(|r| r.bvid.clone()).collect();
    assert_eq!(bvids.len(), records.len());
    assert_eq!(records.len(), 3);
}

#[test]
fn stores_are_separate_per_creator() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path());

    store.merge_new("1", vec![record("BV1", "a")]).unwrap();
    store.merge_new("2", vec![record("BV1", "a")]).unwrap();

    assert_eq!(store.load("1").unwrap().len(), 1);
    assert_eq!(store.load("2").unwrap().len(), 1);
    assert_ne!(store.path_for("1"), store.path_for("2"));
}
