//! Topical relevance classification

use crate::keywords::{KeywordSet, TextSurface};
use crate::model::Item;

/// Inclusion/exclusion keyword filter for a single item
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    /// Any match makes the item eligible
    pub inclusion: KeywordSet,
    /// Any match disqualifies the item, regardless of inclusion matches
    pub exclusion: KeywordSet,
    /// Whether the link is part of the matched text
    pub include_link: bool,
}

impl RelevanceFilter {
    pub fn new(inclusion: KeywordSet, exclusion: KeywordSet) -> Self {
        Self {
            inclusion,
            exclusion,
            include_link: false,
        }
    }

    pub fn with_link(mut self, include_link: bool) -> Self {
        self.include_link = include_link;
        self
    }

    pub fn is_relevant(&self, item: &Item) -> bool {
        let surface = TextSurface::build(item, self.include_link);
        classify_surface(surface.as_str(), &self.inclusion, &self.exclusion)
    }

    /// Keep relevant items, preserving their order
    pub fn retain<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a Item> {
        items.into_iter().filter(|i| self.is_relevant(i)).collect()
    }
}

/// Relevance of an item judged on its title and summary
pub fn is_relevant(item: &Item, inclusion: &KeywordSet, exclusion: &KeywordSet) -> bool {
    classify_surface(TextSurface::of(item).as_str(), inclusion, exclusion)
}

fn classify_surface(surface: &str, inclusion: &KeywordSet, exclusion: &KeywordSet) -> bool {
    if !inclusion.matches(surface) {
        return false;
    }

    if let Some(noise) = exclusion.first_match(surface) {
        tracing::debug!(
            keyword = %noise,
            set = %exclusion.name(),
            "Rejected item matching exclusion keyword"
        );
        return false;
    }

    true
}
