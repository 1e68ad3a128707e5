//! Score command - show how one item fares against a section's keyword policy

use anyhow::{Context, Result, bail};
use briefing_domain::{Item, KeywordSet, Ranker, TextSurface, usecases::SectionPolicy};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::ScoreArgs;
use crate::config::AppConfig;
use crate::sections::{build_policy, default_rank_config};

#[derive(Debug, Serialize)]
struct ScoreReport {
    section: Option<String>,
    policy: &'static str,
    surface: String,
    relevant: bool,
    score: Option<i32>,
    included: bool,
    matches: Matches,
    line: String,
}

#[derive(Debug, Default, Serialize)]
struct Matches {
    inclusion: Option<String>,
    exclusion: Option<String>,
    categories: Vec<String>,
}

pub async fn execute(args: ScoreArgs, config_path: Option<PathBuf>) -> Result<()> {
    // Without a config file this yields the defaults; a bad file is an error
    let config = AppConfig::load(config_path.as_deref())?;

    let item = Item::from_parts(Some(args.title.clone()), args.link.clone(), args.summary.clone());
    if item.title.is_empty() {
        bail!("No title provided");
    }

    let policy = match &args.section {
        Some(id) => {
            let Some(section) = config.section(id) else {
                bail!("Unknown section: {}", id);
            };
            build_policy(&config, section)
                .with_context(|| format!("Invalid policy for section {}", id))?
        }
        None => SectionPolicy::Ranked(default_rank_config(&config)),
    };

    let report = score_item(&item, &policy, args.section.clone());

    tracing::debug!(
        policy = report.policy,
        relevant = report.relevant,
        score = ?report.score,
        "Item scored"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn score_item(item: &Item, policy: &SectionPolicy, section: Option<String>) -> ScoreReport {
    let (surface, relevant, score, matches) = match policy {
        SectionPolicy::Plain { .. } => (TextSurface::of(item), true, None, Matches::default()),
        SectionPolicy::Filtered { filter, .. } => {
            let surface = TextSurface::build(item, filter.include_link);
            let matches = Matches {
                inclusion: first_match(&filter.inclusion, &surface),
                exclusion: first_match(&filter.exclusion, &surface),
                categories: vec![],
            };
            (surface, filter.is_relevant(item), None, matches)
        }
        SectionPolicy::Ranked(config) => {
            let ranker = Ranker::new(config);
            let surface = TextSurface::build(item, config.include_link);
            let matches = Matches {
                inclusion: first_match(&config.inclusion, &surface),
                exclusion: first_match(&config.exclusion, &surface),
                categories: config
                    .categories
                    .iter()
                    .filter(|c| c.contribution(surface.as_str()) != 0)
                    .map(|c| c.name().to_string())
                    .collect(),
            };
            let relevant = ranker.passes_gate(item);
            (surface, relevant, Some(ranker.score(item)), matches)
        }
    };

    let included = match score {
        Some(score) => relevant && score > 0,
        None => relevant,
    };

    ScoreReport {
        section,
        policy: policy.kind(),
        surface: surface.as_str().to_string(),
        relevant,
        score,
        included,
        matches,
        line: item.display_line(),
    }
}

fn first_match(set: &KeywordSet, surface: &TextSurface) -> Option<String> {
    set.first_match(surface.as_str()).map(str::to_string)
}

fn print_report(report: &ScoreReport) {
    println!("Score Results");
    println!("=============");
    println!();
    if let Some(section) = &report.section {
        println!("Section: {}", section);
    }
    println!("Policy: {}", report.policy);
    println!("Text: {}", report.surface);
    println!("Relevant: {}", if report.relevant { "yes" } else { "no" });
    if let Some(score) = report.score {
        println!("Score: {}", score);
    }
    if let Some(keyword) = &report.matches.inclusion {
        println!("  Inclusion match: {}", keyword);
    }
    if let Some(keyword) = &report.matches.exclusion {
        println!("  Exclusion match: {}", keyword);
    }
    if !report.matches.categories.is_empty() {
        println!("  Categories: {}", report.matches.categories.join(", "));
    }
    println!();
    if report.included {
        println!("Included as: {}", report.line);
    } else {
        println!("Not included.");
    }
}
