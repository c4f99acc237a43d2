//! Database integration tests.

use super::*;
use crate::models::image::StoredImage;
use crate::test_support::setup_temp_db;
use std::thread;

#[test]
fn create_then_fetch_by_token() {
    let (db, _dir) = setup_temp_db();
    let (doc, reused) = db
        .documents
        .create_or_reuse("Notes".to_string(), "# Notes".to_string())
        .expect("create");
    assert!(!reused);

    let fetched = db
        .documents
        .get_by_token(&doc.share_token)
        .expect("get")
        .expect("present");
    assert_eq!(fetched, doc);
    assert!(db.documents.get_by_token("Unknown12345").expect("get").is_none());
}

#[test]
fn identical_content_is_reused() {
    let (db, _dir) = setup_temp_db();
    let (first, _) = db
        .documents
        .create_or_reuse("A".to_string(), "same body".to_string())
        .expect("create");
    let (second, reused) = db
        .documents
        .create_or_reuse("B".to_string(), "same body".to_string())
        .expect("create");
    assert!(reused);
    assert_eq!(second.id, first.id);
    assert_eq!(second.title, "A");

    let (third, reused) = db
        .documents
        .create_or_reuse("A".to_string(), "same body ".to_string())
        .expect("create");
    assert!(!reused);
    assert_ne!(third.share_token, first.share_token);
    assert_eq!(db.documents.count().expect("count"), 2);
}

#[test]
fn concurrent_identical_shares_store_one_row() {
    let (db, _dir) = setup_temp_db();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = db.share().expect("share");
            thread::spawn(move || {
                shared
                    .documents
                    .create_or_reuse("T".to_string(), "racing".to_string())
                    .expect("create")
                    .0
                    .id
            })
        })
        .collect();
    let ids: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().expect("join"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(db.documents.count().expect("count"), 1);
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("db");
    let path = path.to_str().expect("path");
    let token = {
        let db = Database::new(path).expect("db");
        db.documents
            .create_or_reuse("T".to_string(), "persisted".to_string())
            .expect("create")
            .0
            .share_token
    };
    let db = Database::new(path).expect("reopen");
    assert!(db.documents.get_by_token(&token).expect("get").is_some());
}

#[test]
fn second_open_reports_already_open() {
    let (db, dir) = setup_temp_db();
    let path = dir.path().join("db");
    let err = match Database::new(path.to_str().expect("path")) {
        Ok(_) => panic!("second open should fail"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("already open"));
    drop(db);
}

#[test]
fn images_round_trip() {
    let (db, _dir) = setup_temp_db();
    let image = StoredImage::new("image/png".to_string(), vec![0x89, b'P', b'N', b'G']);
    db.images.put(&image).expect("put");
    assert_eq!(db.images.get(&image.id).expect("get"), Some(image));
    assert_eq!(db.images.get("missing").expect("get"), None);
}
