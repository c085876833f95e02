//! Health, config and metrics endpoints.

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::TestFixture;

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_reports_storage_and_strategy() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "strategy", json!("mock"));
    assert_eq!(
        response.body["storage"]["playlist_filename"],
        json!("index.m3u8")
    );
    assert_eq!(
        response.body["storage"]["output_root"],
        json!(fixture.output_root().to_string_lossy())
    );
    assert_eq!(response.body["capabilities"]["h264_nvenc"], json!(false));
}

#[tokio::test]
async fn test_metrics_after_upload() {
    let fixture = TestFixture::new();

    let upload = fixture.upload("clip.mp4", b"abc").await;
    assert_status!(upload, StatusCode::OK);

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = String::from_utf8(response.bytes.to_vec()).unwrap();
    assert!(text.contains("segmenta_http_requests_total"));
    assert!(text.contains("segmenta_jobs_total"));
    assert!(text.contains("segmenta_active_jobs"));
    assert!(text.contains(r#"path="/videos""#));
}
