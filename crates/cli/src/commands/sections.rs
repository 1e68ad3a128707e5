//! Sections command - list configured sections

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::args::SectionsArgs;
use crate::config::{AppConfig, PolicyKind, SectionConfig};

pub async fn execute(args: SectionsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    config.validate().context("Invalid configuration")?;

    if args.json {
        let output = serde_json::json!({
            "count": config.sections.len(),
            "sections": config.sections.iter().map(|s| serde_json::json!({
                "id": s.id,
                "header": s.header,
                "source": s.source.kind(),
                "location": s.source.location(),
                "policy": s.policy,
                "detail": policy_detail(s),
            })).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Sections ({} configured)", config.sections.len());
        println!("========================");
        println!();

        for section in &config.sections {
            println!("ID: {}", section.id);
            println!("  Header: {}", section.header);
            println!(
                "  Source: {} {}",
                section.source.kind(),
                section.source.location()
            );
            println!("  Policy: {}", policy_detail(section));
            println!();
        }
    }

    Ok(())
}

fn policy_detail(section: &SectionConfig) -> String {
    let limit = section
        .limit
        .map(|l| format!(", limit {}", l))
        .unwrap_or_default();

    match section.policy {
        PolicyKind::Plain => format!("plain{}", limit),
        PolicyKind::Filtered => format!(
            "filtered (include {}, exclude {}){}",
            section.inclusion.as_deref().unwrap_or("-"),
            section.exclusion.as_deref().unwrap_or("-"),
            limit
        ),
        PolicyKind::Ranked => format!(
            "ranked (top {} of {}, categories: {})",
            section.top_n.unwrap_or(5),
            section.max_considered.unwrap_or(20),
            if section.categories.is_empty() {
                "-".to_string()
            } else {
                section.categories.join(", ")
            }
        ),
    }
}
