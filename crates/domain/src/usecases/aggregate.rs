//! Section aggregation - fetches every configured source and applies its output policy

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{Duration, Instant};

use crate::{
    model::{
        Item, NO_ITEMS_PLACEHOLDER, NO_RELEVANT_ITEMS_PLACEHOLDER, SectionFailure, SectionReport,
    },
    ports::{ItemSource, SourceError},
    ranking::{RankConfig, Ranker},
    relevance::RelevanceFilter,
};

/// How a section turns its raw items into body lines
#[derive(Debug, Clone)]
pub enum SectionPolicy {
    /// Items pass through unfiltered
    Plain { limit: Option<usize> },
    /// Only items passing the relevance filter are kept
    Filtered {
        filter: RelevanceFilter,
        limit: Option<usize>,
    },
    /// Items are scored and the best `top_n` kept
    Ranked(RankConfig),
}

impl SectionPolicy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plain { .. } => "plain",
            Self::Filtered { .. } => "filtered",
            Self::Ranked(_) => "ranked",
        }
    }

    /// Body lines for the given items. Never empty: a placeholder line
    /// stands in when nothing survives.
    pub fn apply(&self, items: &[Item]) -> Vec<String> {
        match self {
            Self::Plain { limit } => {
                let lines = take_lines(items.iter(), *limit);
                or_placeholder(lines, NO_ITEMS_PLACEHOLDER)
            }
            Self::Filtered { filter, limit } => {
                let placeholder = if items.is_empty() {
                    NO_ITEMS_PLACEHOLDER
                } else {
                    NO_RELEVANT_ITEMS_PLACEHOLDER
                };
                let lines = take_lines(items.iter().filter(|i| filter.is_relevant(i)), *limit);
                or_placeholder(lines, placeholder)
            }
            Self::Ranked(config) => Ranker::new(config).rank(items),
        }
    }
}

fn take_lines<'a>(items: impl Iterator<Item = &'a Item>, limit: Option<usize>) -> Vec<String> {
    items
        .take(limit.unwrap_or(usize::MAX))
        .map(Item::display_line)
        .collect()
}

fn or_placeholder(lines: Vec<String>, placeholder: &str) -> Vec<String> {
    if lines.is_empty() {
        vec![placeholder.to_string()]
    } else {
        lines
    }
}

/// One named content source bound to its output policy
#[derive(Clone)]
pub struct Section {
    pub id: String,
    pub header: String,
    pub source: Arc<dyn ItemSource>,
    pub policy: SectionPolicy,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        header: impl Into<String>,
        source: Arc<dyn ItemSource>,
        policy: SectionPolicy,
    ) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            source,
            policy,
        }
    }
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("source", &self.source.describe())
            .field("policy", &self.policy.kind())
            .finish()
    }
}

/// Configuration for the aggregator
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum sections fetched at the same time (1 = strictly sequential)
    pub max_concurrent: usize,
    /// Upper bound for a single source fetch
    pub section_timeout: Duration,
    /// Upper bound for the whole run (None = unlimited)
    pub run_budget: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            section_timeout: Duration::from_secs(30),
            run_budget: Some(Duration::from_secs(120)),
        }
    }
}

/// Runs sections with failure isolation and returns their reports in configured order
#[derive(Debug, Clone, Default)]
pub struct SectionAggregator {
    config: AggregatorConfig,
}

impl SectionAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Run all sections. The result has one report per section, in the
    /// order given, regardless of completion order.
    pub async fn run(&self, sections: &[Section]) -> Vec<SectionReport> {
        let deadline = self.config.run_budget.map(|budget| Instant::now() + budget);
        let max_concurrent = self.config.max_concurrent.max(1);
        let mut slots: Vec<Option<SectionReport>> = vec![None; sections.len()];
        let mut tasks: FuturesUnordered<BoxFuture<'_, (usize, SectionReport)>> =
            FuturesUnordered::new();
        let mut pending = sections.iter().enumerate();

        tracing::info!(
            sections = sections.len(),
            max_concurrent = max_concurrent,
            "Running sections"
        );

        loop {
            while tasks.len() < max_concurrent {
                let Some((index, section)) = pending.next() else {
                    break;
                };
                tasks.push(Box::pin(async move { (index, self.run_section(section).await) }));
            }

            if tasks.is_empty() {
                break;
            }

            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!(
                            unfinished = slots.iter().filter(|s| s.is_none()).count(),
                            "Run time budget exhausted, remaining sections marked failed"
                        );
                        break;
                    }
                },
                None => tasks.next().await,
            };

            let Some((index, report)) = next else {
                break;
            };
            slots[index] = Some(report);
        }

        drop(tasks);

        sections
            .iter()
            .zip(slots)
            .map(|(section, slot)| {
                slot.unwrap_or_else(|| {
                    SectionReport::failure(
                        &section.id,
                        &section.header,
                        SectionFailure::new("run time budget exhausted"),
                    )
                })
            })
            .collect()
    }

    /// Fetch one section and apply its policy. Fetch failures and timeouts
    /// become a failure report; nothing propagates.
    pub async fn run_section(&self, section: &Section) -> SectionReport {
        let started = Instant::now();
        let fetch = tokio::time::timeout(self.config.section_timeout, section.source.fetch());
        let fetched = match fetch.await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.section_timeout)),
        };

        match fetched {
            Ok(items) => {
                let lines = section.policy.apply(&items);
                let report = SectionReport::success(&section.id, &section.header, lines);
                tracing::info!(
                    section = %section.id,
                    policy = section.policy.kind(),
                    fetched = items.len(),
                    status = ?report.status(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Section complete"
                );
                report
            }
            Err(error) => {
                tracing::warn!(
                    section = %section.id,
                    source = %section.source.describe(),
                    error = %error,
                    "Section failed"
                );
                SectionReport::failure(
                    &section.id,
                    &section.header,
                    SectionFailure::new(error.to_string()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{KeywordSet, WeightedCategory};
    use crate::model::SectionStatus;
    use async_trait::async_trait;

    struct FakeSource {
        result: Result<Vec<Item>, SourceError>,
        delay: Duration,
    }

    impl FakeSource {
        fn items(items: Vec<Item>) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(items),
                delay: Duration::ZERO,
            })
        }

        fn failing(error: SourceError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                delay: Duration::ZERO,
            })
        }

        fn slow(items: Vec<Item>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(items),
                delay,
            })
        }
    }

    #[async_trait]
    impl ItemSource for FakeSource {
        async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    fn plain(id: &str, source: Arc<dyn ItemSource>) -> Section {
        Section::new(id, format!("== {} ==", id), source, SectionPolicy::Plain { limit: None })
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let sections = vec![
            plain("one", FakeSource::items(vec![Item::new("First", "https://a")])),
            plain(
                "two",
                FakeSource::failing(SourceError::Network("connection refused".to_string())),
            ),
            plain("three", FakeSource::items(vec![Item::new("Third", "https://c")])),
        ];

        let reports = SectionAggregator::default().run(&sections).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].lines(), vec!["• First (https://a)"]);
        assert_eq!(reports[1].status(), SectionStatus::Failed);
        assert!(reports[1].lines()[0].contains("connection refused"));
        assert_eq!(reports[2].lines(), vec!["• Third (https://c)"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_is_configured_order_not_completion_order() {
        let sections = vec![
            plain(
                "slow",
                FakeSource::slow(vec![Item::new("Slow", "s")], Duration::from_secs(5)),
            ),
            plain("fast", FakeSource::items(vec![Item::new("Fast", "f")])),
        ];

        let reports = SectionAggregator::default().run(&sections).await;
        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast"]);
        assert_eq!(reports[0].status(), SectionStatus::Items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_section_timeout_becomes_failure() {
        let aggregator = SectionAggregator::new(AggregatorConfig {
            max_concurrent: 2,
            section_timeout: Duration::from_secs(1),
            run_budget: None,
        });
        let sections = vec![
            plain(
                "stuck",
                FakeSource::slow(vec![Item::new("Never", "n")], Duration::from_secs(60)),
            ),
            plain("ok", FakeSource::items(vec![Item::new("Fine", "f")])),
        ];

        let reports = aggregator.run(&sections).await;
        assert_eq!(reports[0].status(), SectionStatus::Failed);
        assert!(reports[0].lines()[0].contains("Timed out"));
        assert_eq!(reports[1].status(), SectionStatus::Items);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_budget_keeps_completed_sections() {
        let aggregator = SectionAggregator::new(AggregatorConfig {
            max_concurrent: 1,
            section_timeout: Duration::from_secs(60),
            run_budget: Some(Duration::from_secs(10)),
        });
        let sections = vec![
            plain("done", FakeSource::items(vec![Item::new("Done", "d")])),
            plain(
                "late",
                FakeSource::slow(vec![Item::new("Late", "l")], Duration::from_secs(30)),
            ),
            plain("queued", FakeSource::items(vec![Item::new("Queued", "q")])),
        ];

        let reports = aggregator.run(&sections).await;
        assert_eq!(reports[0].status(), SectionStatus::Items);
        assert_eq!(reports[1].status(), SectionStatus::Failed);
        assert_eq!(reports[2].status(), SectionStatus::Failed);
        assert!(reports[2].lines()[0].contains("budget"));
    }

    #[tokio::test]
    async fn test_sequential_mode_runs_all_sections() {
        let aggregator = SectionAggregator::new(AggregatorConfig {
            max_concurrent: 1,
            ..Default::default()
        });
        let sections: Vec<_> = (0..5)
            .map(|i| {
                plain(
                    &format!("s{}", i),
                    FakeSource::items(vec![Item::new(format!("Item {}", i), "x")]),
                )
            })
            .collect();

        let reports = aggregator.run(&sections).await;
        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|r| r.status() == SectionStatus::Items));
    }

    #[test]
    fn test_plain_policy_limits_and_placeholders() {
        let policy = SectionPolicy::Plain { limit: Some(1) };
        let items = vec![Item::new("A", "a"), Item::new("B", "b")];
        assert_eq!(policy.apply(&items), vec!["• A (a)"]);
        assert_eq!(policy.apply(&[]), vec![NO_ITEMS_PLACEHOLDER]);
    }

    #[test]
    fn test_filtered_policy_keeps_relevant_only() {
        let policy = SectionPolicy::Filtered {
            filter: RelevanceFilter::new(
                KeywordSet::new("topic", ["china"]),
                KeywordSet::new("noise", ["casino"]),
            ),
            limit: None,
        };
        let items = vec![
            Item::new("China exports", "1"),
            Item::new("China casino", "2"),
            Item::new("Football", "3"),
        ];
        assert_eq!(policy.apply(&items), vec!["• China exports (1)"]);
        assert_eq!(
            policy.apply(&[Item::new("Football", "3")]),
            vec![NO_RELEVANT_ITEMS_PLACEHOLDER]
        );
    }

    #[test]
    fn test_ranked_policy_delegates_to_ranker() {
        let policy = SectionPolicy::Ranked(RankConfig {
            max_considered: 5,
            top_n: 1,
            categories: vec![WeightedCategory::new(2, KeywordSet::new("high", ["taiwan"]))],
            ..Default::default()
        });
        let items = vec![Item::new("Note", "1"), Item::new("Taiwan vote", "2")];
        assert_eq!(policy.apply(&items), vec!["• Taiwan vote (2)"]);
        assert_eq!(policy.kind(), "ranked");
    }
}
