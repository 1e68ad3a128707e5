//! Run command - build the digest once and deliver it

use anyhow::{Context, Result, bail};
use briefing_adapters::{OutboxMailer, OutboxWriter, SmtpMailer, StubMailer};
use briefing_domain::{
    Clock, Mailer, OutgoingMail, SystemClock,
    usecases::{
        AggregatorConfig, BriefingConfig, BriefingRun, DigestAssembler, DigestTemplate, RunError,
        SectionAggregator,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::config::AppConfig;
use crate::sections::build_sections;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let dry_run = args.dry_run;
    let smtp = !dry_run && args.outbox.is_none();
    if smtp {
        config
            .mail
            .validate()
            .context("Mail settings incomplete (use --dry-run or --outbox to skip delivery)")?;
    }

    tracing::info!(
        dry_run = dry_run,
        outbox = ?args.outbox,
        sections = config.sections.len(),
        "Config loaded"
    );

    if config.sections.is_empty() {
        bail!("No sections configured");
    }

    let sections = build_sections(&config).context("Failed to build sections")?;
    let mailer = build_mailer(&config, &args).await?;

    let run_date = match args.date {
        Some(date) => date,
        None => format_run_date(&SystemClock, &config.digest.date_format)?,
    };

    let briefing = BriefingRun::new(
        SectionAggregator::new(aggregator_config(&config)),
        DigestAssembler::new(digest_template(&config)),
        mailer,
        BriefingConfig {
            from: config.mail.sender().to_string(),
            to: config.mail.to.clone(),
            dry_run,
        },
    );

    match briefing.execute(&sections, &run_date).await {
        Ok(outcome) => {
            if dry_run {
                println!("Subject: {}", outcome.digest.subject);
                println!();
                println!("{}", outcome.digest.body);
            }
            tracing::info!(
                delivered = outcome.delivered,
                failed_sections = outcome.digest.failed_sections(),
                "briefing run completed"
            );
            Ok(())
        }
        Err(RunError::Delivery {
            transport,
            digest,
            source,
        }) => {
            tracing::error!(transport = transport, error = %source, "Delivery failed");
            keep_undelivered(&config, &digest.subject, &digest.body).await;
            Err(anyhow::Error::new(source)
                .context(format!("Failed to send briefing via {}", transport)))
        }
    }
}

async fn build_mailer(config: &AppConfig, args: &RunArgs) -> Result<Arc<dyn Mailer>> {
    if args.dry_run {
        return Ok(Arc::new(StubMailer::new()));
    }

    if let Some(path) = &args.outbox {
        let writer = OutboxWriter::new(path.clone())
            .await
            .with_context(|| format!("Failed to open outbox: {}", path.display()))?;
        tracing::info!(outbox = %path.display(), "Writing briefing to outbox");
        return Ok(Arc::new(OutboxMailer::new(writer)));
    }

    let mail = &config.mail;
    let password = mail.password()?;
    Ok(Arc::new(
        SmtpMailer::new(&mail.host, mail.port, &mail.username, password)
            .with_timeout(Duration::from_secs(config.general.section_timeout_secs.max(1))),
    ))
}

/// Persist a digest that could not be sent. Failures here are only logged.
async fn keep_undelivered(config: &AppConfig, subject: &str, body: &str) {
    let path = config.general.undelivered_path.clone();
    let mail = OutgoingMail {
        from: config.mail.sender().to_string(),
        to: config.mail.to.clone(),
        subject: subject.to_string(),
        body: body.to_string(),
    };

    let result = match OutboxWriter::new(path.clone()).await {
        Ok(writer) => writer.append(&mail).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => tracing::warn!(path = %path.display(), "Undelivered briefing saved"),
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to save undelivered briefing"
        ),
    }
}

fn aggregator_config(config: &AppConfig) -> AggregatorConfig {
    let general = &config.general;
    AggregatorConfig {
        max_concurrent: general.max_concurrent.max(1),
        section_timeout: Duration::from_secs(general.section_timeout_secs.max(1)),
        run_budget: match general.run_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    }
}

fn digest_template(config: &AppConfig) -> DigestTemplate {
    DigestTemplate {
        subject: config.digest.subject.clone(),
        greeting: config.digest.greeting.clone(),
        intro: config.digest.intro.clone(),
        closing: config.digest.closing.clone(),
    }
}

/// Today's date in the configured format
fn format_run_date(clock: &dyn Clock, format: &str) -> Result<String> {
    let description = time::format_description::parse(format)
        .with_context(|| format!("Invalid date format: {}", format))?;
    clock
        .now()
        .format(&description)
        .context("Failed to format run date")
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_adapters::StubSource;
    use briefing_domain::{
        Item, SourceError,
        usecases::{Section, SectionPolicy},
    };
    use time::macros::datetime;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> time::OffsetDateTime {
            datetime!(2024-05-01 06:30 UTC)
        }
    }

    #[test]
    fn run_date_uses_configured_format() {
        assert_eq!(
            format_run_date(&FixedClock, "[year]-[month]-[day]").unwrap(),
            "2024-05-01"
        );
        assert_eq!(
            format_run_date(&FixedClock, "[day].[month].[year]").unwrap(),
            "01.05.2024"
        );
    }

    #[test]
    fn zero_run_timeout_disables_budget() {
        let mut config = AppConfig::default();
        config.general.run_timeout_secs = 0;
        assert_eq!(aggregator_config(&config).run_budget, None);

        config.general.run_timeout_secs = 90;
        assert_eq!(
            aggregator_config(&config).run_budget,
            Some(Duration::from_secs(90))
        );
    }

    #[tokio::test]
    async fn stub_sections_flow_into_delivered_mail() {
        let config = AppConfig::default();
        let plain = SectionPolicy::Plain { limit: None };
        let sections = vec![
            Section::new(
                "news",
                "📰 News",
                Arc::new(StubSource::with_items(vec![Item::new(
                    "China eases tariffs",
                    "https://example.com/tariffs",
                )])),
                plain.clone(),
            ),
            Section::new(
                "down",
                "📉 Down",
                Arc::new(StubSource::with_error(SourceError::Status(503))),
                plain.clone(),
            ),
            Section::new("empty", "📭 Empty", Arc::new(StubSource::empty()), plain),
        ];

        let mailer = Arc::new(StubMailer::new());
        let briefing = BriefingRun::new(
            SectionAggregator::new(aggregator_config(&config)),
            DigestAssembler::new(digest_template(&config)),
            mailer.clone(),
            BriefingConfig {
                from: "bot@example.com".to_string(),
                to: "reader@example.com".to_string(),
                dry_run: false,
            },
        );

        let outcome = briefing.execute(&sections, "2024-05-01").await.unwrap();
        assert!(outcome.delivered);
        assert_eq!(outcome.digest.failed_sections(), 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your daily China briefing – 2024-05-01");
        assert!(sent[0]
            .body
            .contains("📰 News\n• China eases tariffs (https://example.com/tariffs)\n"));
        assert!(sent[0].body.contains("📉 Down\n⚠️ Could not load this section:"));
        assert!(sent[0].body.contains("📭 Empty\nNo items found.\n"));
    }
}
