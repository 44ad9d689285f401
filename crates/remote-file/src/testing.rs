//! Recording [`HttpClient`] for tests
//!
//! Routes are registered per method and URL. Unrouted requests answer
//! `404` with an empty body. Every request is recorded so tests can assert on
//! the exact number of network calls.

use crate::{HttpClient, HttpResponse};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// HTTP method of a recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
}

/// A request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    TransportError(String),
}

#[derive(Debug, Default)]
pub struct MockHttpClient {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET url` with `status` and `body`
    pub fn with_get(self, url: &str, status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let response = HttpResponse {
            status,
            content_length: Some(body.len() as u64),
            body,
        };
        self.route(Method::Get, url, Reply::Response(response))
    }

    /// Answer `HEAD url` with `status` and an optional `Content-Length`
    pub fn with_head(self, url: &str, status: u16, content_length: Option<u64>) -> Self {
        let response = HttpResponse {
            status,
            content_length,
            body: Bytes::new(),
        };
        self.route(Method::Head, url, Reply::Response(response))
    }

    /// Answer `POST url` with `status` and `body`
    pub fn with_post(self, url: &str, status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let response = HttpResponse {
            status,
            content_length: Some(body.len() as u64),
            body,
        };
        self.route(Method::Post, url, Reply::Response(response))
    }

    /// Fail `method url` at the transport level
    pub fn with_transport_error(self, method: Method, url: &str) -> Self {
        self.route(
            method,
            url,
            Reply::TransportError(format!("connection refused: {url}")),
        )
    }

    fn route(self, method: Method, url: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .expect("mock routes poisoned")
            .insert((method, url.to_string()), reply);
        self
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock calls poisoned").clone()
    }

    /// Number of recorded calls with `method`
    pub fn count(&self, method: Method) -> usize {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("mock calls poisoned").len()
    }

    fn respond(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .push(RecordedCall {
                method,
                url: url.to_string(),
                body,
            });

        let reply = self
            .routes
            .lock()
            .expect("mock routes poisoned")
            .get(&(method, url.to_string()))
            .cloned();

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::TransportError(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(HttpResponse {
                status: 404,
                content_length: Some(0),
                body: Bytes::new(),
            }),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond(Method::Get, url, None)
    }

    async fn head(&self, url: &str) -> Result<HttpResponse> {
        self.respond(Method::Head, url, None)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        self.respond(Method::Post, url, Some(body.clone()))
    }
}
