//! HTTP client for integration testing.
//!
//! Sends requests straight into the router with `oneshot`, no socket involved.

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// Client bound to one caller (or none, for anonymous requests).
#[derive(Clone)]
pub struct ApiClient {
    app: Router,
    token: Option<String>,
}

/// Status and decoded body of a response.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// The `error` field of an error body, or "" if there is none.
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// Gets a value at the given dotted JSON path.
    ///
    /// # Example
    /// ```ignore
    /// let status = response.get("status").as_str();
    /// ```
    pub fn get(&self, path: &str) -> Value {
        let mut current = &self.body;
        for key in path.split('.') {
            current = &current[key];
        }
        current.clone()
    }

    /// Panics with the body if the status is not `expected`.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {}",
            self.body
        );
        self
    }
}

impl ApiClient {
    pub fn new(app: Router, token: Option<String>) -> Self {
        Self { app, token }
    }

    pub async fn get(&self, uri: &str) -> ApiResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> ApiResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// POST with no body, as the membership endpoints expect.
    pub async fn post_empty(&self, uri: &str) -> ApiResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> ApiResponse {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        // Extractor rejections from axum come back as plain text
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        ApiResponse { status, body }
    }
}
