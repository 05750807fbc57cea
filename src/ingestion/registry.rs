//! HTTP client for the MCP registry listing endpoint.

use crate::error::FetchError;
use crate::ingestion::fetcher::PageSource;
use crate::ingestion::listing::parse_listing;
use crate::ingestion::types::CatalogPage;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Public MCP registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.modelcontextprotocol.io";

/// Pages through `GET {base_url}/v0/servers[?cursor=...]`.
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mcp-scout/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn listing_url(&self) -> String {
        format!("{}/v0/servers", self.base_url)
    }
}

#[async_trait]
impl PageSource for RegistryClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError> {
        let mut request = self.client.get(self.listing_url());
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: Value = response.json().await?;
        parse_listing(&body)
    }
}
