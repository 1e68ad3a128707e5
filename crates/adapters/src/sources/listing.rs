//! Scraped HTML listing source

use async_trait::async_trait;
use briefing_domain::{Item, ItemSource, SourceError};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{get_body, squash_whitespace};

/// CSS selectors describing where items live on a listing page
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// Selects one element per item
    pub item: String,
    /// Title element within the item (default: the item element itself)
    pub title: Option<String>,
    /// Link element within the item (default: the item itself if it has the
    /// link attribute, otherwise its first `a[href]`)
    pub link: Option<String>,
    /// Summary element within the item
    pub summary: Option<String>,
    /// Attribute holding the link target
    pub link_attr: String,
}

impl ListingSelectors {
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            title: None,
            link: None,
            summary: None,
            link_attr: "href".to_string(),
        }
    }
}

/// Fetches an HTML page and extracts items with CSS selectors
pub struct ListingSource {
    client: Client,
    url: String,
    base: Url,
    selectors: ListingSelectors,
    link_pattern: Option<Regex>,
}

impl ListingSource {
    /// Create a listing source. Selectors and the link pattern are validated
    /// here so a bad configuration fails at startup.
    pub fn new(
        client: Client,
        url: impl Into<String>,
        selectors: ListingSelectors,
        link_pattern: Option<&str>,
    ) -> Result<Self, SourceError> {
        let url = url.into();
        let base = Url::parse(&url)
            .map_err(|e| SourceError::Config(format!("Invalid listing URL '{}': {}", url, e)))?;

        let configured = [
            Some(&selectors.item),
            selectors.title.as_ref(),
            selectors.link.as_ref(),
            selectors.summary.as_ref(),
        ];
        for selector in configured.into_iter().flatten() {
            compile(selector)?;
        }

        let link_pattern = link_pattern
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SourceError::Config(format!("Invalid link pattern '{}': {}", p, e))
                })
            })
            .transpose()?;

        Ok(Self {
            client,
            url,
            base,
            selectors,
            link_pattern,
        })
    }

    /// Extract items from a page body, in document order
    pub fn parse(&self, body: &str) -> Result<Vec<Item>, SourceError> {
        let document = Html::parse_document(body);
        let item_selector = compile(&self.selectors.item)?;
        let title_selector = self.selectors.title.as_deref().map(compile).transpose()?;
        let link_selector = self.selectors.link.as_deref().map(compile).transpose()?;
        let summary_selector = self.selectors.summary.as_deref().map(compile).transpose()?;
        let fallback_link = compile("a[href]")?;

        let mut items = Vec::new();
        for element in document.select(&item_selector) {
            let title = match &title_selector {
                Some(selector) => element.select(selector).next().map(element_text),
                None => Some(element_text(element)),
            };

            let link_element = match &link_selector {
                Some(selector) => element.select(selector).next(),
                None if element.value().attr(&self.selectors.link_attr).is_some() => {
                    Some(element)
                }
                None => element.select(&fallback_link).next(),
            };
            let link = link_element
                .and_then(|e| e.value().attr(&self.selectors.link_attr))
                .map(|href| self.resolve(href));

            if let (Some(pattern), Some(link)) = (&self.link_pattern, &link) {
                if !pattern.is_match(link) {
                    continue;
                }
            }

            let summary = summary_selector
                .as_ref()
                .and_then(|selector| element.select(selector).next())
                .map(element_text);

            let item = Item::from_parts(title, link, summary);
            if item.title.is_empty() {
                continue;
            }
            items.push(item);
        }

        Ok(items)
    }

    fn resolve(&self, href: &str) -> String {
        self.base
            .join(href.trim())
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.trim().to_string())
    }
}

fn compile(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector)
        .map_err(|e| SourceError::Config(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

#[async_trait]
impl ItemSource for ListingSource {
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        tracing::debug!(url = %self.url, "Fetching listing page");

        let body = get_body(&self.client, &self.url).await?;
        let body = String::from_utf8_lossy(&body);
        let items = self.parse(&body)?;

        if items.is_empty() {
            tracing::warn!(
                url = %self.url,
                selector = %self.selectors.item,
                "Listing selector matched no items"
            );
        }

        Ok(items)
    }

    fn describe(&self) -> String {
        format!("listing {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
<ul class="news">
  <li><a href="/2024/05/china-trade">China   trade talks</a><p class="teaser">Exports up</p></li>
  <li><a href="https://other.example.com/2024/05/taiwan">Taiwan election</a></li>
  <li><a href="/about">About us</a></li>
  <li><span>No link here</span></li>
</ul>
</body></html>"#;

    fn client() -> Client {
        http_client(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_resolves_relative_links() {
        let mut selectors = ListingSelectors::new("ul.news li");
        selectors.title = Some("a".to_string());
        selectors.summary = Some("p.teaser".to_string());
        let source =
            ListingSource::new(client(), "https://example.com/news/", selectors, None).unwrap();

        let items = source.parse(PAGE).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "China trade talks");
        assert_eq!(items[0].link, "https://example.com/2024/05/china-trade");
        assert_eq!(items[0].summary.as_deref(), Some("Exports up"));
        assert_eq!(items[1].link, "https://other.example.com/2024/05/taiwan");
    }

    #[test]
    fn test_item_element_can_be_the_link() {
        let source = ListingSource::new(
            client(),
            "https://example.com/",
            ListingSelectors::new("ul.news li a"),
            None,
        )
        .unwrap();

        let items = source.parse(PAGE).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].title, "About us");
        assert_eq!(items[2].link, "https://example.com/about");
    }

    #[test]
    fn test_link_pattern_filters_items() {
        let source = ListingSource::new(
            client(),
            "https://example.com/",
            ListingSelectors::new("ul.news li a"),
            Some(r"/\d{4}/\d{2}/"),
        )
        .unwrap();

        let items = source.parse(PAGE).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["China trade talks", "Taiwan election"]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let result = ListingSource::new(
            client(),
            "https://example.com/",
            ListingSelectors::new("ul[[["),
            None,
        );
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&mock_server)
            .await;

        let source = ListingSource::new(
            client(),
            format!("{}/news", mock_server.uri()),
            ListingSelectors::new("ul.news li a"),
            None,
        )
        .unwrap();

        let items = source.fetch().await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].link.starts_with(&mock_server.uri()));
    }
}
