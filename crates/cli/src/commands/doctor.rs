//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::{AppConfig, PolicyKind};
use crate::sections::build_sections;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    mail: CheckResult,
    sections: CheckResult,
    keywords: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        mail: CheckResult::error("Not checked"),
        sections: CheckResult::error("Not checked"),
        keywords: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.mail = check_mail(config);
        report.sections = check_sections(config);
        report.keywords = check_keywords(config);
    }

    let checks = [
        &report.config,
        &report.mail,
        &report.sections,
        &report.keywords,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

/// Mail settings, reporting only whether the password is present
fn check_mail(config: &AppConfig) -> CheckResult {
    let mail = &config.mail;
    let details = serde_json::json!({
        "host": mail.host,
        "port": mail.port,
        "username": mail.username,
        "from": mail.sender(),
        "to": mail.to,
        "password_env": mail.password_env,
        "password_set": mail.has_password(),
    });

    match mail.validate() {
        Ok(()) => CheckResult::ok(format!(
            "SMTP {}:{} as {} → {}, password: set",
            mail.host, mail.port, mail.username, mail.to
        ))
        .with_details(details),
        // Dry-run and outbox runs do not need mail settings
        Err(e) => CheckResult::warn(format!("{} (only --dry-run/--outbox will work)", e))
            .with_details(details),
    }
}

fn check_sections(config: &AppConfig) -> CheckResult {
    if config.sections.is_empty() {
        return CheckResult::error("No sections configured");
    }

    match build_sections(config) {
        Ok(sections) => CheckResult::ok(format!("{} sections configured", sections.len()))
            .with_details(serde_json::json!({
                "ids": sections.iter().map(|s| &s.id).collect::<Vec<_>>(),
                "policies": sections.iter().map(|s| s.policy.kind()).collect::<Vec<_>>(),
            })),
        Err(e) => CheckResult::error(format!("Invalid sections: {}", e)),
    }
}

/// Keyword sets that would make a section drop everything
fn check_keywords(config: &AppConfig) -> CheckResult {
    let empty_sets: Vec<&str> = config
        .keyword_sets
        .iter()
        .filter(|(_, patterns)| patterns.iter().all(|p| p.trim().is_empty()))
        .map(|(name, _)| name.as_str())
        .collect();

    let ranked_without_keywords: Vec<&str> = config
        .sections
        .iter()
        .filter(|s| {
            s.policy == PolicyKind::Ranked && s.inclusion.is_none() && s.categories.is_empty()
        })
        .map(|s| s.id.as_str())
        .collect();

    let details = serde_json::json!({
        "keyword_sets": config.keyword_sets.len(),
        "categories": config.categories.len(),
        "empty_sets": empty_sets,
        "ranked_without_keywords": ranked_without_keywords,
    });

    if !empty_sets.is_empty() {
        return CheckResult::warn(format!(
            "Empty keyword sets (match nothing): {}",
            empty_sets.join(", ")
        ))
        .with_details(details);
    }

    if !ranked_without_keywords.is_empty() {
        return CheckResult::warn(format!(
            "Ranked sections without inclusion set or categories: {}",
            ranked_without_keywords.join(", ")
        ))
        .with_details(details);
    }

    CheckResult::ok(format!(
        "{} keyword sets, {} categories",
        config.keyword_sets.len(),
        config.categories.len()
    ))
    .with_details(details)
}

fn print_report(report: &DoctorReport) {
    println!("briefing Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Mail", &report.mail);
    print_check("Sections", &report.sections);
    print_check("Keywords", &report.keywords);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: briefing run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
