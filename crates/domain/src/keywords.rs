//! Keyword sets and the text surface they are matched against
//!
//! Matching is plain case-insensitive substring containment. There is no
//! tokenization, so short patterns can match inside unrelated words
//! (`"ai"` matches `"said"`).

use crate::model::Item;

/// A named, immutable set of lowercase substring patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    name: String,
    patterns: Vec<String>,
}

impl KeywordSet {
    /// Build a set; patterns are trimmed and lowercased, blank ones dropped
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if !pattern.is_empty() && !normalized.contains(&pattern) {
                normalized.push(pattern);
            }
        }

        Self {
            name: name.into(),
            patterns: normalized,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty::<&str>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any pattern occurs in `surface`, which must already be lowercase
    pub fn matches(&self, surface: &str) -> bool {
        self.first_match(surface).is_some()
    }

    /// The first pattern found in `surface`, if any
    pub fn first_match(&self, surface: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| surface.contains(p.as_str()))
            .map(String::as_str)
    }
}

/// A keyword group that adds a fixed weight to an item's score when matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedCategory {
    pub weight: i32,
    pub keywords: KeywordSet,
}

impl WeightedCategory {
    pub fn new(weight: i32, keywords: KeywordSet) -> Self {
        Self { weight, keywords }
    }

    pub fn name(&self) -> &str {
        self.keywords.name()
    }

    /// The category weight if any member matches, otherwise 0. A category
    /// contributes at most once no matter how many members match.
    pub fn contribution(&self, surface: &str) -> i32 {
        if self.keywords.matches(surface) {
            self.weight
        } else {
            0
        }
    }
}

/// Lowercased concatenation of an item's text fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSurface(String);

impl TextSurface {
    /// Title and summary
    pub fn of(item: &Item) -> Self {
        Self::build(item, false)
    }

    /// Title, summary and link
    pub fn with_link(item: &Item) -> Self {
        Self::build(item, true)
    }

    pub fn build(item: &Item, include_link: bool) -> Self {
        let mut parts: Vec<&str> = vec![item.title.as_str()];
        if let Some(summary) = item.summary.as_deref() {
            parts.push(summary);
        }
        if include_link {
            parts.push(item.link.as_str());
        }

        let joined = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self(joined.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
