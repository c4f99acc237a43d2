//! Integration tests for the Markpad HTTP API.

mod support;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::body::Bytes;
use markpad_core::ai::{decode_frame, FrameDecoder, StreamFrame};
use serde_json::{json, Value};
use std::sync::Arc;
use support::{server_with, setup_test_server, test_config, ScriptedGenerator};
use tempfile::TempDir;

fn forwarded_for(ip: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_str(ip).expect("header"),
    )
}

#[tokio::test]
async fn share_then_fetch_document() {
    let (server, _temp) = setup_test_server();

    let create = server
        .post("/api/documents")
        .json(&json!({ "title": "Plan", "content": "# Plan\n- ship" }))
        .await;
    assert_eq!(create.status_code(), StatusCode::CREATED);
    let created: Value = create.json();
    assert_eq!(created["title"], "Plan");
    assert_eq!(created["_meta"]["isReused"], false);
    let token = created["share_token"].as_str().expect("token").to_string();

    let fetched = server.get(&format!("/api/documents/{}", token)).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    let body: Value = fetched.json();
    assert_eq!(body["content"], "# Plan\n- ship");
    assert!(body.get("share_token").is_none());
    assert!(body.get("is_public").is_none());
}

#[tokio::test]
async fn identical_content_reuses_existing_share() {
    let (server, _temp) = setup_test_server();
    let first: Value = server
        .post("/api/documents")
        .json(&json!({ "content": "## Same" }))
        .await
        .json();
    assert_eq!(first["title"], "Same");

    let second = server
        .post("/api/documents")
        .json(&json!({ "title": "Other", "content": "## Same" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::OK);
    let second: Value = second.json();
    assert_eq!(second["share_token"], first["share_token"]);
    assert_eq!(second["_meta"]["isReused"], true);
}

#[tokio::test]
async fn invalid_documents_are_rejected() {
    let temp = TempDir::new().expect("temp dir");
    let config = test_config(&temp, &[("MAX_DOCUMENT_SIZE", "32")]);
    let server = server_with(config, Arc::new(markpad_server::DisabledGenerator));

    for content in [
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "[x](javascript:alert(1))",
        "   ",
        "this document is far longer than thirty-two bytes",
    ] {
        let response = server
            .post("/api/documents")
            .json(&json!({ "content": content }))
            .await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "content {:?}",
            content
        );
        let body: Value = response.json();
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn fetch_checks_token_shape_and_existence() {
    let (server, _temp) = setup_test_server();
    let malformed = server.get("/api/documents/bad-token!").await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    let missing = server.get("/api/documents/Missing12345").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutation_routes_are_rate_limited_per_client() {
    let temp = TempDir::new().expect("temp dir");
    let config = test_config(&temp, &[("RATE_LIMIT_MAX_REQUESTS", "2")]);
    let server = server_with(config, Arc::new(markpad_server::DisabledGenerator));

    for i in 0..2 {
        let (name, value) = forwarded_for("203.0.113.1");
        let response = server
            .post("/api/documents")
            .add_header(name, value)
            .json(&json!({ "content": format!("doc {}", i) }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let (name, value) = forwarded_for("203.0.113.1");
    let limited = server
        .post("/api/documents")
        .add_header(name, value)
        .json(&json!({ "content": "doc 3" }))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = limited
        .header(header::RETRY_AFTER)
        .to_str()
        .expect("retry-after")
        .parse()
        .expect("seconds");
    assert!((1..=60).contains(&retry_after));

    let (name, value) = forwarded_for("203.0.113.2");
    let other = server
        .post("/api/documents")
        .add_header(name, value)
        .json(&json!({ "content": "doc 4" }))
        .await;
    assert_eq!(other.status_code(), StatusCode::CREATED);

    let (name, value) = forwarded_for("203.0.113.1");
    let reads = server
        .get("/api/documents/Missing12345")
        .add_header(name, value)
        .await;
    assert_eq!(reads.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_streams_frames_from_provider() {
    let temp = TempDir::new().expect("temp dir");
    let generator = Arc::new(ScriptedGenerator::new(vec![
        StreamFrame::content("Hello"),
        StreamFrame::content(", world"),
        StreamFrame::done(),
    ]));
    let server = server_with(test_config(&temp, &[]), generator.clone());

    let response = server
        .post("/api/ai/generate")
        .json(&json!({
            "currentMarkdown": "# Doc",
            "replaceMode": true,
            "userPrompt": "greet"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .header(header::CONTENT_TYPE)
        .to_str()
        .expect("content type")
        .starts_with("text/event-stream"));

    let mut decoder = FrameDecoder::new();
    let frames: Vec<StreamFrame> = decoder
        .push(response.as_bytes())
        .iter()
        .map(|data| decode_frame(data).expect("frame"))
        .collect();
    assert_eq!(
        frames,
        vec![
            StreamFrame::content("Hello"),
            StreamFrame::content(", world"),
            StreamFrame::done(),
        ]
    );

    let requests = generator.requests.lock().expect("requests");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].replace_mode);
    assert_eq!(requests[0].current_markdown, "# Doc");
}

#[tokio::test]
async fn generate_validates_and_reports_unconfigured_provider() {
    let (server, _temp) = setup_test_server();
    let blank = server
        .post("/api/ai/generate")
        .json(&json!({ "userPrompt": "  " }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);

    let disabled = server
        .post("/api/ai/generate")
        .json(&json!({ "userPrompt": "write" }))
        .await;
    assert_eq!(disabled.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn image_upload_round_trip() {
    let (server, _temp) = setup_test_server();
    let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]);

    let upload = server
        .post("/api/images")
        .content_type("image/png")
        .bytes(png.clone())
        .await;
    assert_eq!(upload.status_code(), StatusCode::CREATED);
    let body: Value = upload.json();
    let id = body["id"].as_str().expect("id").to_string();
    assert_eq!(body["url"], format!("http://md.test/api/images/{}", id));

    let fetched = server.get(&format!("/api/images/{}", id)).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.header(header::CONTENT_TYPE), "image/png");
    assert_eq!(fetched.as_bytes(), &png);

    let missing = server.get("/api/images/does-not-exist").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_upload_rejects_non_images_and_oversize() {
    let temp = TempDir::new().expect("temp dir");
    let config = test_config(&temp, &[("MAX_IMAGE_SIZE", "4")]);
    let server = server_with(config, Arc::new(markpad_server::DisabledGenerator));

    let svg = server
        .post("/api/images")
        .content_type("image/svg+xml")
        .bytes(Bytes::from_static(b"<svg/>"))
        .await;
    assert_eq!(svg.status_code(), StatusCode::BAD_REQUEST);

    let big = server
        .post("/api/images")
        .content_type("image/gif")
        .bytes(Bytes::from_static(b"GIF89a"))
        .await;
    assert_eq!(big.status_code(), StatusCode::BAD_REQUEST);

    let empty = server
        .post("/api/images")
        .content_type("image/gif")
        .bytes(Bytes::new())
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let (server, _temp) = setup_test_server();
    let response = server.get("/api/documents/Missing12345").await;
    assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
    assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
}
