//! Domain models and value objects

use serde::{Deserialize, Serialize};

/// Body line used when a section produced no items at all
pub const NO_ITEMS_PLACEHOLDER: &str = "No items found.";

/// Body line used when no candidate survived filtering or ranking
pub const NO_RELEVANT_ITEMS_PLACEHOLDER: &str = "No relevant items found.";

/// A candidate piece of content produced by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Headline; empty when the upstream entry had none
    pub title: String,
    /// Link to the full content; empty when the upstream entry had none
    pub link: String,
    /// Optional teaser or description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.summary = if summary.trim().is_empty() {
            None
        } else {
            Some(summary)
        };
        self
    }

    /// Normalize optional upstream fields. Missing title/link become empty
    /// text, a blank summary becomes `None`.
    pub fn from_parts(
        title: Option<String>,
        link: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            title: title.map(|t| t.trim().to_string()).unwrap_or_default(),
            link: link.map(|l| l.trim().to_string()).unwrap_or_default(),
            summary: summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Render the item as a single digest line, e.g. `• Title (https://...)`
    pub fn display_line(&self) -> String {
        if self.link.is_empty() {
            format!("• {}", self.title)
        } else {
            format!("• {} ({})", self.title, self.link)
        }
    }
}

/// Terminal state of a section for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// At least one item line was produced
    Items,
    /// Fetch succeeded but nothing survived; body is a placeholder
    Empty,
    /// Fetch failed; body is the failure placeholder
    Failed,
}

/// Short description of why a section could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFailure {
    pub message: String,
}

impl SectionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The inline placeholder line shown in place of the section body
    pub fn placeholder(&self) -> String {
        format!("⚠️ Could not load this section: {}", self.message)
    }
}

impl std::fmt::Display for SectionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of running one section: a header and either body lines or a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    /// Section identifier from configuration
    pub id: String,
    /// Header line printed above the body
    pub header: String,
    /// Formatted body lines (never empty on success) or the failure
    pub body: Result<Vec<String>, SectionFailure>,
}

impl SectionReport {
    pub fn success(id: impl Into<String>, header: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            body: Ok(lines),
        }
    }

    pub fn failure(
        id: impl Into<String>,
        header: impl Into<String>,
        failure: SectionFailure,
    ) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            body: Err(failure),
        }
    }

    /// Body lines as they appear in the digest
    pub fn lines(&self) -> Vec<String> {
        match &self.body {
            Ok(lines) => lines.clone(),
            Err(failure) => vec![failure.placeholder()],
        }
    }

    pub fn status(&self) -> SectionStatus {
        match &self.body {
            Err(_) => SectionStatus::Failed,
            Ok(lines) if lines.iter().all(|l| is_placeholder(l)) => SectionStatus::Empty,
            Ok(_) => SectionStatus::Items,
        }
    }
}

fn is_placeholder(line: &str) -> bool {
    line == NO_ITEMS_PLACEHOLDER || line == NO_RELEVANT_ITEMS_PLACEHOLDER
}

/// The assembled document for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// Mail subject
    pub subject: String,
    /// Full plain-text body
    pub body: String,
    /// Per-section terminal states, in digest order
    pub sections: Vec<SectionStatus>,
}

impl Digest {
    pub fn failed_sections(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| **s == SectionStatus::Failed)
            .count()
    }
}

/// A message handed to the mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_coerces_missing_fields() {
        let item = Item::from_parts(None, None, Some("   ".to_string()));
        assert_eq!(item.title, "");
        assert_eq!(item.link, "");
        assert_eq!(item.summary, None);
    }

    #[test]
    fn display_line_includes_link() {
        let item = Item::new("China eases tariffs", "https://example.com/a");
        assert_eq!(item.display_line(), "• China eases tariffs (https://example.com/a)");
    }

    #[test]
    fn display_line_without_link() {
        let item = Item::new("USD/CNY: 7.12", "");
        assert_eq!(item.display_line(), "• USD/CNY: 7.12");
    }

    #[test]
    fn report_status_reflects_body() {
        let items = SectionReport::success("a", "A", vec!["• x".to_string()]);
        let empty = SectionReport::success("b", "B", vec![NO_ITEMS_PLACEHOLDER.to_string()]);
        let failed = SectionReport::failure("c", "C", SectionFailure::new("timeout"));

        assert_eq!(items.status(), SectionStatus::Items);
        assert_eq!(empty.status(), SectionStatus::Empty);
        assert_eq!(failed.status(), SectionStatus::Failed);
        assert_eq!(
            failed.lines(),
            vec!["⚠️ Could not load this section: timeout".to_string()]
        );
    }
}
