//! Weighted keyword scoring and top-N selection

use crate::keywords::{KeywordSet, TextSurface, WeightedCategory};
use crate::model::{Item, NO_RELEVANT_ITEMS_PLACEHOLDER};

/// Default score delta applied when an exclusion keyword matches
pub const DEFAULT_EXCLUSION_PENALTY: i32 = -5;

/// Parameters for ranking one candidate list
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Only the first `max_considered` items of the source are candidates
    pub max_considered: usize,
    /// Maximum number of lines kept
    pub top_n: usize,
    /// Relevance gate; when empty, any weighted-category match passes the gate
    pub inclusion: KeywordSet,
    /// Weighted categories summed into the score
    pub categories: Vec<WeightedCategory>,
    /// Keywords that apply `exclusion_penalty`
    pub exclusion: KeywordSet,
    /// Added to the score when an exclusion keyword matches (normally negative)
    pub exclusion_penalty: i32,
    /// Whether the link is part of the matched text
    pub include_link: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            max_considered: 20,
            top_n: 5,
            inclusion: KeywordSet::default(),
            categories: Vec::new(),
            exclusion: KeywordSet::default(),
            exclusion_penalty: DEFAULT_EXCLUSION_PENALTY,
            include_link: false,
        }
    }
}

/// A candidate that passed the relevance gate, with its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredItem {
    pub item: Item,
    pub score: i32,
}

/// Scores and orders candidates according to a [`RankConfig`]
pub struct Ranker<'a> {
    config: &'a RankConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(config: &'a RankConfig) -> Self {
        Self { config }
    }

    /// Whether the item passes the topical gate that precedes scoring
    pub fn passes_gate(&self, item: &Item) -> bool {
        let surface = TextSurface::build(item, self.config.include_link);
        self.gate(surface.as_str())
    }

    /// Sum of matched category weights plus the exclusion penalty, if any
    pub fn score(&self, item: &Item) -> i32 {
        let surface = TextSurface::build(item, self.config.include_link);
        self.score_surface(surface.as_str())
    }

    /// Candidates with a strictly positive score, best first, at most `top_n`
    pub fn select(&self, items: &[Item]) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = items
            .iter()
            .take(self.config.max_considered)
            .filter_map(|item| {
                let surface = TextSurface::build(item, self.config.include_link);
                if !self.gate(surface.as_str()) {
                    return None;
                }
                Some(ScoredItem {
                    item: item.clone(),
                    score: self.score_surface(surface.as_str()),
                })
            })
            .collect();

        // sort_by is stable: equal scores keep their source order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.retain(|s| s.score > 0);
        scored.truncate(self.config.top_n);

        tracing::debug!(
            considered = items.len().min(self.config.max_considered),
            kept = scored.len(),
            scores = ?scored.iter().map(|s| s.score).collect::<Vec<_>>(),
            "Ranked candidates"
        );

        scored
    }

    /// Display lines for the selected items, or a single placeholder line
    pub fn rank(&self, items: &[Item]) -> Vec<String> {
        let selected = self.select(items);
        if selected.is_empty() {
            return vec![NO_RELEVANT_ITEMS_PLACEHOLDER.to_string()];
        }
        selected.iter().map(|s| s.item.display_line()).collect()
    }

    fn gate(&self, surface: &str) -> bool {
        if self.config.inclusion.is_empty() {
            self.config
                .categories
                .iter()
                .any(|c| c.keywords.matches(surface))
        } else {
            self.config.inclusion.matches(surface)
        }
    }

    fn score_surface(&self, surface: &str) -> i32 {
        // Weights come from configuration; clamp instead of overflowing
        let score = self
            .config
            .categories
            .iter()
            .fold(0i32, |acc, c| acc.saturating_add(c.contribution(surface)));

        if self.config.exclusion.matches(surface) {
            score.saturating_add(self.config.exclusion_penalty)
        } else {
            score
        }
    }
}

/// Rank `items` and render the result as digest lines. Never returns an
/// empty list.
pub fn rank(items: &[Item], config: &RankConfig) -> Vec<String> {
    Ranker::new(config).rank(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> Item {
        Item::new(title, format!("https://example.com/{}", title.len()))
    }

    fn config(categories: Vec<WeightedCategory>, top_n: usize) -> RankConfig {
        RankConfig {
            max_considered: 10,
            top_n,
            categories,
            ..Default::default()
        }
    }

    fn high() -> WeightedCategory {
        WeightedCategory::new(3, KeywordSet::new("high", ["taiwan", "tariff", "xi jinping"]))
    }

    fn quality() -> WeightedCategory {
        WeightedCategory::new(1, KeywordSet::new("quality", ["analysis", "exclusive"]))
    }

    #[test]
    fn test_example_taiwan_policy_shift() {
        let config = RankConfig {
            max_considered: 2,
            top_n: 1,
            categories: vec![WeightedCategory::new(2, KeywordSet::new("high", ["taiwan"]))],
            ..Default::default()
        };
        let items = vec![
            Item::new("A: Taiwan policy shift", "https://example.com/a"),
            Item::new("B: random note", "https://example.com/b"),
        ];

        let lines = rank(&items, &config);
        assert_eq!(lines, vec!["• A: Taiwan policy shift (https://example.com/a)"]);
    }

    #[test]
    fn test_orders_by_score_descending() {
        let items = vec![
            item("Taiwan trade"),
            item("Exclusive analysis of Taiwan tariff"),
        ];
        let config = config(vec![high(), quality()], 5);
        let selected = Ranker::new(&config).select(&items);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].item.title, "Exclusive analysis of Taiwan tariff");
        assert_eq!(selected[0].score, 4);
        assert_eq!(selected[1].score, 3);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items = vec![
            Item::new("Taiwan first", "1"),
            Item::new("Tariff second", "2"),
            Item::new("Xi Jinping third", "3"),
        ];
        let config = config(vec![high()], 5);
        let selected = Ranker::new(&config).select(&items);
        let links: Vec<_> = selected.iter().map(|s| s.item.link.as_str()).collect();
        assert_eq!(links, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_respects_top_n() {
        let items = vec![item("Taiwan a"), item("Taiwan bb"), item("Taiwan ccc")];
        let lines = rank(&items, &config(vec![high()], 2));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_output_shorter_than_top_n_when_few_positive() {
        let items = vec![item("Taiwan a"), item("Football")];
        let selected = Ranker::new(&config(vec![high()], 5)).select(&items);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_never_returns_empty() {
        let items = vec![item("Football"), item("Weather")];
        let lines = rank(&items, &config(vec![high()], 3));
        assert_eq!(lines, vec![NO_RELEVANT_ITEMS_PLACEHOLDER.to_string()]);

        let lines = rank(&[], &config(vec![high()], 3));
        assert_eq!(lines, vec![NO_RELEVANT_ITEMS_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_pool_is_limited_to_max_considered() {
        let items = vec![item("Football"), item("Taiwan late")];
        let config = RankConfig {
            max_considered: 1,
            top_n: 5,
            categories: vec![high()],
            ..Default::default()
        };
        let selected = Ranker::new(&config).select(&items);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_exclusion_penalty_drops_item_after_gate() {
        let config = RankConfig {
            max_considered: 5,
            top_n: 5,
            inclusion: KeywordSet::new("topic", ["taiwan"]),
            categories: vec![high()],
            exclusion: KeywordSet::new("noise", ["casino"]),
            exclusion_penalty: -5,
            include_link: false,
        };
        let items = vec![item("Taiwan casino opens"), item("Taiwan election")];

        let ranker = Ranker::new(&config);
        assert!(ranker.passes_gate(&items[0]));
        assert_eq!(ranker.score(&items[0]), -2);

        let selected = ranker.select(&items);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].item.title, "Taiwan election");
    }

    #[test]
    fn test_extreme_weights_saturate() {
        let config = RankConfig {
            categories: vec![
                WeightedCategory::new(i32::MAX, KeywordSet::new("a", ["taiwan"])),
                WeightedCategory::new(i32::MAX, KeywordSet::new("b", ["tariff"])),
            ],
            exclusion: KeywordSet::new("noise", ["casino"]),
            exclusion_penalty: i32::MIN,
            ..Default::default()
        };
        let ranker = Ranker::new(&config);

        assert_eq!(ranker.score(&item("Taiwan tariff talks")), i32::MAX);
        assert_eq!(ranker.score(&item("Taiwan tariff casino")), -1);
        assert_eq!(ranker.score(&item("Casino night")), i32::MIN);
    }

    #[test]
    fn test_inclusion_gate_rejects_before_scoring() {
        let config = RankConfig {
            inclusion: KeywordSet::new("topic", ["china"]),
            categories: vec![quality()],
            ..Default::default()
        };
        let items = vec![item("Exclusive analysis of football")];
        assert!(Ranker::new(&config).select(&items).is_empty());
    }

    #[test]
    fn test_gate_passed_but_zero_score_is_dropped() {
        let config = RankConfig {
            inclusion: KeywordSet::new("topic", ["china"]),
            categories: vec![high()],
            ..Default::default()
        };
        let items = vec![item("China weather")];
        assert!(Ranker::new(&config).select(&items).is_empty());
    }

    #[test]
    fn test_rank_is_idempotent() {
        let items = vec![
            item("Taiwan"),
            item("Exclusive Taiwan analysis"),
            item("Tariff news"),
        ];
        let config = config(vec![high(), quality()], 2);
        assert_eq!(rank(&items, &config), rank(&items, &config));
    }
}
