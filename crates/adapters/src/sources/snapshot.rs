//! Financial snapshot source: a JSON quote endpoint rendered as one item per quote

use async_trait::async_trait;
use briefing_domain::{Item, ItemSource, SourceError};
use reqwest::Client;
use serde_json::Value;

use super::get_body;

/// One value extracted from the snapshot document
#[derive(Debug, Clone)]
pub struct Quote {
    /// Display label, e.g. "USD/CNY"
    pub label: String,
    /// JSON pointer into the response, e.g. "/rates/CNY"
    pub pointer: String,
    /// Decimal places for numeric values
    pub decimals: Option<usize>,
}

/// Fetches a JSON document and renders configured quotes as items
pub struct SnapshotSource {
    client: Client,
    url: String,
    link: String,
    quotes: Vec<Quote>,
}

impl SnapshotSource {
    /// `link` is attached to every item (usually a human-readable page)
    pub fn new(
        client: Client,
        url: impl Into<String>,
        link: impl Into<String>,
        quotes: Vec<Quote>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            link: link.into(),
            quotes,
        }
    }

    /// Render quotes from a parsed document. Fails only if no quote resolves.
    pub fn extract(&self, document: &Value) -> Result<Vec<Item>, SourceError> {
        let mut resolved = 0;
        let items: Vec<Item> = self
            .quotes
            .iter()
            .map(|quote| {
                let value = document
                    .pointer(&quote.pointer)
                    .and_then(|v| render(v, quote.decimals));
                if value.is_some() {
                    resolved += 1;
                } else {
                    tracing::debug!(
                        label = %quote.label,
                        pointer = %quote.pointer,
                        "Quote missing from snapshot"
                    );
                }
                let value = value.unwrap_or_else(|| "n/a".to_string());
                Item::new(format!("{}: {}", quote.label, value), self.link.clone())
            })
            .collect();

        if resolved == 0 && !self.quotes.is_empty() {
            return Err(SourceError::Parse(
                "none of the configured quotes were present".to_string(),
            ));
        }

        Ok(items)
    }
}

fn render(value: &Value, decimals: Option<usize>) -> Option<String> {
    match value {
        Value::Number(n) => match (decimals, n.as_f64()) {
            (Some(places), Some(f)) => Some(format!("{:.*}", places, f)),
            _ => Some(n.to_string()),
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[async_trait]
impl ItemSource for SnapshotSource {
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        tracing::debug!(url = %self.url, quotes = self.quotes.len(), "Fetching snapshot");

        let body = get_body(&self.client, &self.url).await?;
        let document: Value =
            serde_json::from_slice(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        self.extract(&document)
    }

    fn describe(&self) -> String {
        format!("snapshot {}", self.url)
    }
}
