//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock transcoder and prober injected, backed by temporary storage.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use segmenta_core::{
    testing::{MockProber, MockTranscoder},
    Config, ConversionPipeline, EncoderCapabilities, StorageConfig,
};
use segmenta_server::state::AppState;

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "segmenta-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new();
///     let response = fixture.upload("clip.mp4", b"data").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared application state
    pub state: Arc<AppState>,
    /// Mock transcoder - script progress, failures and blocking
    pub transcoder: MockTranscoder,
    /// Mock prober - control reported durations
    pub prober: MockProber,
    /// Temporary directory holding the output and staging roots
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_transcoder(MockTranscoder::new())
    }

    /// Create a test fixture around a preconfigured transcoder.
    pub fn with_transcoder(transcoder: MockTranscoder) -> Self {
        Self::build(transcoder, |_| {})
    }

    /// Create a test fixture that accepts upload bodies up to `limit` bytes.
    pub fn with_max_upload_bytes(limit: u64) -> Self {
        Self::build(MockTranscoder::new(), |config| {
            config.server.max_upload_bytes = limit;
        })
    }

    fn build(transcoder: MockTranscoder, configure: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let prober = MockProber::new();

        let mut config = Config {
            storage: StorageConfig::under(temp_dir.path()),
            ..Default::default()
        };
        configure(&mut config);

        let pipeline = ConversionPipeline::new(
            &config,
            Arc::new(transcoder.clone()),
            Arc::new(prober.clone()),
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::new(pipeline),
            EncoderCapabilities::default(),
        ));
        let router = segmenta_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            transcoder,
            prober,
            temp_dir,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.state.config().storage.output_root
    }

    pub fn staging_root(&self) -> &Path {
        &self.state.config().storage.staging_root
    }

    /// Files left in the staging area.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.staging_root()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Write a catalog entry directly, bypassing the pipeline.
    pub fn seed_video(&self, id: &str, original_name: &str, uploaded_at: &str) {
        let dir = self.output_root().join(id);
        std::fs::create_dir_all(&dir).unwrap();
        let metadata = serde_json::json!({
            "id": id,
            "originalName": original_name,
            "uploadedAt": uploaded_at,
        });
        std::fs::write(dir.join("metadata.json"), metadata.to_string()).unwrap();
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, Body::empty(), None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, Body::empty(), None).await
    }

    /// Upload a file under the `file` field.
    pub async fn upload(&self, filename: &str, contents: &[u8]) -> TestResponse {
        self.post_multipart(&[("file", Some(filename), contents)]).await
    }

    /// POST /videos with arbitrary multipart parts.
    pub async fn post_multipart(&self, parts: &[(&str, Option<&str>, &[u8])]) -> TestResponse {
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request("POST", "/videos", Body::from(multipart_body(parts)), Some(&content_type))
            .await
    }

    /// Send a request to the test server.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            request_builder = request_builder.header(header::CONTENT_TYPE, content_type);
        }

        let request = request_builder.body(body).unwrap();
        send(&self.router, request).await
    }
}

/// Send a request through a router and collect the response.
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();

    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        bytes,
        body,
    }
}

/// Build a multipart/form-data body from `(field, filename, contents)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, contents) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    field, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
            ),
        }
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
