//! HLS file delivery under /streams.

mod common;

use axum::http::{header, StatusCode};
use segmenta_core::testing::MOCK_PLAYLIST;

use common::TestFixture;

async fn uploaded_id(fixture: &TestFixture) -> String {
    let response = fixture.upload("clip.mp4", b"abc").await;
    assert_status!(response, StatusCode::OK);
    response.body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_playlist_served_with_hls_content_type() {
    let fixture = TestFixture::new();
    let id = uploaded_id(&fixture).await;

    let response = fixture.get(&format!("/streams/{}/index.m3u8", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(&response.bytes[..], MOCK_PLAYLIST.as_bytes());
}

#[tokio::test]
async fn test_playlist_url_from_record_resolves() {
    let fixture = TestFixture::new();
    let upload = fixture.upload("clip.mp4", b"abc").await;
    let playlist_url = upload.body["playlistUrl"].as_str().unwrap();

    let response = fixture.get(playlist_url).await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_segment_served_as_transport_stream() {
    let fixture = TestFixture::new();
    let id = uploaded_id(&fixture).await;

    let response = fixture.get(&format!("/streams/{}/index0.ts", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "video/MP2T"
    );
}

#[tokio::test]
async fn test_uppercase_playlist_extension() {
    let fixture = TestFixture::new();
    let dir = fixture.output_root().join("1000-upper");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("MASTER.M3U8"), "#EXTM3U\n").unwrap();

    let response = fixture.get("/streams/1000-upper/MASTER.M3U8").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.headers.get(header::CONTENT_LENGTH).unwrap(), "8");
}

#[tokio::test]
async fn test_missing_files_are_404() {
    let fixture = TestFixture::new();
    let id = uploaded_id(&fixture).await;

    let response = fixture.get(&format!("/streams/{}/index99.ts", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.get("/streams/123-unknown/index.m3u8").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_is_refused() {
    let fixture = TestFixture::new();
    std::fs::write(fixture.temp_dir.path().join("secret.txt"), "secret").unwrap();
    let _id = uploaded_id(&fixture).await;

    for path in [
        "/streams/%2E%2E/secret.txt",
        "/streams/..%2F..%2Fsecret.txt/index.m3u8",
        "/streams/videos/%2E%2E%2Fsecret.txt",
        "/streams/.hidden/index.m3u8",
    ] {
        let response = fixture.get(path).await;
        assert_status!(response, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_directory_is_not_served() {
    let fixture = TestFixture::new();
    let nested = fixture.output_root().join("1000-dir").join("nested");
    std::fs::create_dir_all(&nested).unwrap();

    let response = fixture.get("/streams/1000-dir/nested").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}
