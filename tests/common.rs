//! Shared helpers for HTTP integration tests.
//!
//! [`TestApp`] wraps the router around a temporary storage directory and
//! drives it in-process with `tower::ServiceExt::oneshot`, so no socket is
//! bound.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use tempdrop::http::{AccessKey, AppState, router};
use tempdrop::store::{ObjectStore, StoreConfig};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

const BOUNDARY: &str = "tempdrop-test-boundary";

pub struct TestApp {
    pub store: ObjectStore,
    router: Router,
    _tmp: TempDir,
}

pub struct TestAppBuilder {
    max_file_size_bytes: u64,
    max_total_files: u64,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            max_file_size_bytes: 1024 * 1024,
            max_total_files: 24,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Uploads `content` with the given TTL and the right access key.
    pub async fn upload(&self, content: &[u8], deadline: &str) -> Response<Body> {
        self.send(upload_request(Some(TEST_KEY), Some(content), Some(deadline)))
            .await
    }
}

impl TestAppBuilder {
    pub fn max_file_size_bytes(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn max_total_files(mut self, count: u64) -> Self {
        self.max_total_files = count;
        self
    }

    pub fn build(self) -> TestApp {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::new(tmp.path())
            .with_max_file_size_bytes(self.max_file_size_bytes)
            .with_max_total_files(self.max_total_files);
        let store = ObjectStore::open(config).expect("Failed to open store");

        let state = Arc::new(AppState {
            store: store.clone(),
            access_key: AccessKey::new(TEST_KEY),
        });

        TestApp {
            store,
            router: router(state),
            _tmp: tmp,
        }
    }
}

/// Builds a multipart upload request. `None` leaves the field or header out.
pub fn upload_request(
    key: Option<&str>,
    file: Option<&[u8]>,
    deadline: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(deadline) = deadline {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"deadline\"\r\n\r\n{deadline}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post("/api/v1/parts").header(
        "content-type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(key) = key {
        builder = builder.header("x-tempdrop-key", key);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
