//! HTTP client for forwarding requests to internal services.
//!
//! Connections are pooled and kept alive across requests; the response is
//! streamed back to the caller as-is, so downstream services own their
//! response contracts.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::Request,
    http::header::{CONTENT_LENGTH, HOST},
    response::Response,
};

// Forwarded bodies are small JSON documents
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct ServiceClient {
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    pub async fn forward(&self, base_url: &str, request: Request<Body>) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", base_url.trim_end_matches('/'), path_and_query);

        let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .context("Failed to buffer request body")?;

        let mut headers = parts.headers;
        // The target service derives these itself
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body_bytes)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = upstream.status();
        let response_headers = upstream.headers().clone();
        let response_body = upstream
            .bytes()
            .await
            .context("Failed to read upstream response body")?;

        let mut response = Response::builder().status(status);
        if let Some(headers) = response.headers_mut() {
            *headers = response_headers;
        }
        response
            .body(Body::from(response_body))
            .context("Failed to build proxied response")
    }
}
