//! Turns section configuration into domain sections backed by adapters

use briefing_adapters::sources::{
    FeedSource, HttpClient, ListingSelectors, ListingSource, Quote, SnapshotSource, StaticSource,
    http_client,
};
use briefing_domain::{
    Item, ItemSource, KeywordSet, RankConfig, RelevanceFilter, SourceError, WeightedCategory,
    ranking::DEFAULT_EXCLUSION_PENALTY,
    usecases::{Section, SectionPolicy},
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ConfigError, PolicyKind, SectionConfig, SourceConfig};

/// Keyword set used by `score` when no section is given
pub const DEFAULT_INCLUSION_SET: &str = "topic";
/// Exclusion set used by `score` when no section is given
pub const DEFAULT_EXCLUSION_SET: &str = "noise";

#[derive(Debug, thiserror::Error)]
pub enum SectionBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Section '{section}': {source}")]
    Source {
        section: String,
        #[source]
        source: SourceError,
    },
    #[error("Failed to create HTTP client: {0}")]
    Client(SourceError),
}

/// Build every configured section, in configured order
pub fn build_sections(config: &AppConfig) -> Result<Vec<Section>, SectionBuildError> {
    config.validate()?;

    let client = http_client(Duration::from_secs(config.general.section_timeout_secs.max(1)))
        .map_err(SectionBuildError::Client)?;

    config
        .sections
        .iter()
        .map(|section| {
            let source = build_source(section, &client)?;
            let policy = build_policy(config, section)?;
            tracing::debug!(
                section = %section.id,
                source = %source.describe(),
                policy = policy.kind(),
                "Section configured"
            );
            Ok::<_, SectionBuildError>(Section::new(&section.id, &section.header, source, policy))
        })
        .collect()
}

fn build_source(
    section: &SectionConfig,
    client: &HttpClient,
) -> Result<Arc<dyn ItemSource>, SectionBuildError> {
    let source: Arc<dyn ItemSource> = match &section.source {
        SourceConfig::Feed { url } => Arc::new(FeedSource::new(client.clone(), url)),
        SourceConfig::Listing {
            url,
            item_selector,
            title_selector,
            link_selector,
            summary_selector,
            link_attr,
            link_pattern,
        } => {
            let selectors = ListingSelectors {
                item: item_selector.clone(),
                title: title_selector.clone(),
                link: link_selector.clone(),
                summary: summary_selector.clone(),
                link_attr: link_attr.clone(),
            };
            let listing =
                ListingSource::new(client.clone(), url, selectors, link_pattern.as_deref())
                    .map_err(|source| SectionBuildError::Source {
                        section: section.id.clone(),
                        source,
                    })?;
            Arc::new(listing)
        }
        SourceConfig::Snapshot { url, link, quotes } => {
            let quotes = quotes
                .iter()
                .map(|q| Quote {
                    label: q.label.clone(),
                    pointer: q.pointer.clone(),
                    decimals: q.decimals,
                })
                .collect();
            Arc::new(SnapshotSource::new(client.clone(), url, link, quotes))
        }
        SourceConfig::Static { links } => {
            let items = links
                .iter()
                .map(|l| Item::from_parts(Some(l.title.clone()), Some(l.link.clone()), None))
                .collect();
            Arc::new(StaticSource::new(items))
        }
    };

    Ok(source)
}

/// Output policy for one section
pub fn build_policy(
    config: &AppConfig,
    section: &SectionConfig,
) -> Result<SectionPolicy, ConfigError> {
    let policy = match section.policy {
        PolicyKind::Plain => SectionPolicy::Plain {
            limit: section.limit,
        },
        PolicyKind::Filtered => {
            let inclusion = keyword_set(config, section, section.inclusion.as_deref())?;
            let exclusion = keyword_set(config, section, section.exclusion.as_deref())?;
            SectionPolicy::Filtered {
                filter: RelevanceFilter::new(inclusion, exclusion).with_link(section.include_link),
                limit: section.limit,
            }
        }
        PolicyKind::Ranked => SectionPolicy::Ranked(rank_config(config, section)?),
    };

    Ok(policy)
}

fn rank_config(config: &AppConfig, section: &SectionConfig) -> Result<RankConfig, ConfigError> {
    let defaults = RankConfig::default();

    let categories = section
        .categories
        .iter()
        .map(|name| category(config, section, name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RankConfig {
        max_considered: section.max_considered.unwrap_or(defaults.max_considered),
        top_n: section.top_n.unwrap_or(defaults.top_n),
        inclusion: keyword_set(config, section, section.inclusion.as_deref())?,
        categories,
        exclusion: keyword_set(config, section, section.exclusion.as_deref())?,
        exclusion_penalty: section
            .exclusion_penalty
            .unwrap_or(DEFAULT_EXCLUSION_PENALTY),
        include_link: section.include_link,
    })
}

fn keyword_set(
    config: &AppConfig,
    section: &SectionConfig,
    name: Option<&str>,
) -> Result<KeywordSet, ConfigError> {
    let Some(name) = name else {
        return Ok(KeywordSet::default());
    };

    config
        .keyword_set(name)
        .map(|patterns| KeywordSet::new(name, patterns))
        .ok_or_else(|| ConfigError::UnknownKeywordSet {
            section: section.id.clone(),
            name: name.to_string(),
        })
}

fn category(
    config: &AppConfig,
    section: &SectionConfig,
    name: &str,
) -> Result<WeightedCategory, ConfigError> {
    config
        .category(name)
        .map(|c| WeightedCategory::new(c.weight, KeywordSet::new(name, &c.keywords)))
        .ok_or_else(|| ConfigError::UnknownCategory {
            section: section.id.clone(),
            name: name.to_string(),
        })
}

/// Ranking parameters built from the default keyword sets and every category
pub fn default_rank_config(config: &AppConfig) -> RankConfig {
    let named = |name: &str| {
        config
            .keyword_set(name)
            .map(|patterns| KeywordSet::new(name, patterns))
            .unwrap_or_else(|| KeywordSet::empty(name))
    };

    RankConfig {
        inclusion: named(DEFAULT_INCLUSION_SET),
        exclusion: named(DEFAULT_EXCLUSION_SET),
        categories: config
            .categories
            .iter()
            .map(|(name, c)| WeightedCategory::new(c.weight, KeywordSet::new(name, &c.keywords)))
            .collect(),
        ..RankConfig::default()
    }
}
