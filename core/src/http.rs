//! HTTP transport types and the seam the executor talks through.
//!
//! # Design
//! Requests and responses are plain data, so the executor's retry and
//! classification logic can be driven by any `Transport`. The executor owns
//! the per-attempt timeout; a transport only has to perform one GET and
//! report what came back. `HttpTransport` is the production implementation
//! over a single pooled `reqwest::Client`.

use async_trait::async_trait;

use crate::error::BoxError;

/// A GET request described as plain data. Device requests carry no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First `content-type` header, compared case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

/// Performs a single HTTP GET.
///
/// Any `Err` is treated as a transport failure and is eligible for retry.
/// Non-200 statuses must come back as `Ok`, even when their body cannot be
/// read, so the executor can classify them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// `Transport` backed by one long-lived `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        let response = self.client.get(&request.url).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // A failed body read only matters when the status says there is a
        // payload to decode; other statuses are classified without it.
        let body = if status == 200 {
            response.bytes().await?.to_vec()
        } else {
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .unwrap_or_default()
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
