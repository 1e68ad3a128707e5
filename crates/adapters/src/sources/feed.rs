//! Syndication feed source (RSS, Atom, JSON Feed)

use async_trait::async_trait;
use briefing_domain::{Item, ItemSource, SourceError};
use feed_rs::parser;
use html_escape::decode_html_entities;
use reqwest::Client;
use scraper::Html;

use super::{get_body, squash_whitespace};

/// Fetches a feed URL and turns its entries into items, in feed order
pub struct FeedSource {
    client: Client,
    url: String,
}

impl FeedSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Parse a feed document into items
    pub fn parse(body: &[u8]) -> Result<Vec<Item>, SourceError> {
        let feed = parser::parse(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let title = entry
                    .title
                    .map(|t| squash_whitespace(&decode_html_entities(&t.content)));
                let link = entry.links.first().map(|l| l.href.clone());
                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .map(|html| html_to_text(&html));

                Item::from_parts(title, link, summary)
            })
            .collect();

        Ok(items)
    }
}

/// Strip markup from an HTML fragment, keeping its text
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    // text() yields already-decoded character data
    let text: String = fragment.root_element().text().collect();
    squash_whitespace(&text)
}

#[async_trait]
impl ItemSource for FeedSource {
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        tracing::debug!(url = %self.url, "Fetching feed");

        let body = get_body(&self.client, &self.url).await?;
        let items = Self::parse(&body)?;

        tracing::debug!(url = %self.url, count = items.len(), "Parsed feed");

        Ok(items)
    }

    fn describe(&self) -> String {
        format!("feed {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>China News</title>
    <item>
      <title>China eases tariffs</title>
      <link>https://example.com/tariffs</link>
      <description>&lt;p&gt;Beijing &lt;b&gt;cuts&lt;/b&gt; duties&lt;/p&gt;</description>
    </item>
    <item>
      <title>Taiwan policy shift</title>
      <link>https://example.com/taiwan</link>
    </item>
    <item>
      <description>Entry without title or link</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_preserves_order_and_strips_markup() {
        let items = FeedSource::parse(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "China eases tariffs");
        assert_eq!(items[0].link, "https://example.com/tariffs");
        assert_eq!(items[0].summary.as_deref(), Some("Beijing cuts duties"));
        assert_eq!(items[1].title, "Taiwan policy shift");
        assert_eq!(items[1].summary, None);
        assert_eq!(items[2].title, "");
        assert_eq!(items[2].link, "");
    }

    #[test]
    fn test_summary_entities_are_decoded_once() {
        assert_eq!(
            html_to_text("<p>AT&amp;T &amp;lt;b&amp;gt; 5 &lt; 6</p>"),
            "AT&T &lt;b&gt; 5 < 6"
        );
    }

    #[test]
    fn test_parse_atom() {
        let items = FeedSource::parse(ATOM_SAMPLE.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://example.com/atom1");
        assert_eq!(items[0].summary.as_deref(), Some("This is Atom entry 1"));
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        let result = FeedSource::parse(b"not a feed");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rss.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS_SAMPLE))
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(5)).unwrap();
        let source = FeedSource::new(client, format!("{}/rss.xml", mock_server.uri()));

        let items = source.fetch().await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(source.describe().contains("/rss.xml"));
    }

    #[tokio::test]
    async fn test_fetch_feed_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rss.xml"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(5)).unwrap();
        let source = FeedSource::new(client, format!("{}/rss.xml", mock_server.uri()));

        let result = source.fetch().await;
        assert!(matches!(result, Err(SourceError::Status(503))));
    }
}
