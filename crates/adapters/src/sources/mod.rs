//! Item source adapters

mod feed;
mod listing;
mod snapshot;
mod static_links;

pub use feed::FeedSource;
pub use listing::{ListingSelectors, ListingSource};
pub use snapshot::{Quote, SnapshotSource};
pub use static_links::StaticSource;

pub use reqwest::Client as HttpClient;

use async_trait::async_trait;
use briefing_domain::{Item, ItemSource, SourceError};
use reqwest::Client;
use std::time::Duration;

/// Build the HTTP client shared by all network-backed sources
pub fn http_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("briefing/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// GET `url` and return the body, mapping non-success statuses to errors
pub(crate) async fn get_body(client: &Client, url: &str) -> Result<Vec<u8>, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| SourceError::Network(e.to_string()))?;

    Ok(body.to_vec())
}

/// Collapse runs of whitespace into single spaces
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stub source for testing and offline runs
pub struct StubSource {
    result: Result<Vec<Item>, SourceError>,
}

impl StubSource {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self { result: Ok(vec![]) }
    }

    /// Create a stub with predefined items
    pub fn with_items(items: Vec<Item>) -> Self {
        Self { result: Ok(items) }
    }

    /// Create a stub that always fails
    pub fn with_error(error: SourceError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ItemSource for StubSource {
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        self.result.clone()
    }

    fn describe(&self) -> String {
        "stub".to_string()
    }
}
