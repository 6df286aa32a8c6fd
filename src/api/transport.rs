//! HTTP transport for the registration API.

use async_trait::async_trait;
use reqwest::header;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::Result;

/// Response surfaced by a transport: HTTP status plus raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Whether the status code counts as success, i.e. lies in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for transport implementations.
///
/// The dispatch loop works against this seam so tests can substitute a
/// recording transport for the real HTTP client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the rendered envelope bytes, returning status and body.
    async fn send(&self, body: Vec<u8>) -> Result<ApiResponse>;
}

/// reqwest-backed transport for the document-creation endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    product_group: String,
}

impl HttpTransport {
    /// Build a transport from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            product_group: config.product_group.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Vec<u8>) -> Result<ApiResponse> {
        debug!(endpoint = %self.endpoint, bytes = body.len(), "Posting document envelope");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("pg", self.product_group.as_str())])
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
