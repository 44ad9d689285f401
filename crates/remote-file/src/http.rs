//! HTTP/HTTPS capability used by remote file handles

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// A fully buffered HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the `Content-Length` header, if the server sent one
    pub content_length: Option<u64>,
    /// Response body (empty for HEAD)
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, for log messages
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP operations a remote file handle or uploader needs.
///
/// Non-success statuses are returned as responses; only transport failures
/// (connection refused, TLS, timeouts) are errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// `GET url`, buffering the whole body
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    /// `HEAD url`
    async fn head(&self, url: &str) -> Result<HttpResponse>;

    /// `POST url` with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Client with reqwest's defaults (no request timeout)
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that aborts requests after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn buffer(response: reqwest::Response, url: &str) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let content_length = header_content_length(response.headers());
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))?;
        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let response = Self::buffer(response, url).await?;
        tracing::debug!(
            "GET {} -> {} ({} bytes)",
            url,
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    async fn head(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .with_context(|| format!("Failed to send HEAD request: {url}"))?;

        // Read the header directly: for HEAD the body size hint is always zero.
        let status = response.status().as_u16();
        let content_length = header_content_length(response.headers());
        tracing::debug!("HEAD {} -> {} (length {:?})", url, status, content_length);
        Ok(HttpResponse {
            status,
            content_length,
            body: Bytes::new(),
        })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to post to URL: {url}"))?;

        let response = Self::buffer(response, url).await?;
        tracing::debug!("POST {} -> {}", url, response.status);
        Ok(response)
    }
}

fn header_content_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
