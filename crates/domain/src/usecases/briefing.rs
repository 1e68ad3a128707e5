//! Briefing run - aggregates sections, assembles the digest and delivers it

use std::sync::Arc;

use crate::{
    model::{Digest, OutgoingMail},
    ports::{DeliveryError, Mailer},
    usecases::{
        aggregate::{Section, SectionAggregator},
        assemble::DigestAssembler,
    },
};

/// Addressing and mode for one run
#[derive(Debug, Clone)]
pub struct BriefingConfig {
    pub from: String,
    pub to: String,
    /// Build the digest but do not hand it to the mailer
    pub dry_run: bool,
}

/// What a finished run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub digest: Digest,
    pub delivered: bool,
}

/// Errors from a briefing run. Section failures never end up here.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Delivery failed; the digest that could not be sent is kept
    #[error("Delivery via {transport} failed: {source}")]
    Delivery {
        transport: &'static str,
        digest: Box<Digest>,
        #[source]
        source: DeliveryError,
    },
}

/// Single linear pipeline: sections → digest → mail
pub struct BriefingRun<M: Mailer + ?Sized> {
    aggregator: SectionAggregator,
    assembler: DigestAssembler,
    mailer: Arc<M>,
    config: BriefingConfig,
}

impl<M: Mailer + ?Sized> BriefingRun<M> {
    pub fn new(
        aggregator: SectionAggregator,
        assembler: DigestAssembler,
        mailer: Arc<M>,
        config: BriefingConfig,
    ) -> Self {
        Self {
            aggregator,
            assembler,
            mailer,
            config,
        }
    }

    /// Build the digest for `run_date` without delivering it
    pub async fn build(&self, sections: &[Section], run_date: &str) -> Digest {
        tracing::info!(sections = sections.len(), run_date = %run_date, "Generating briefing");

        let reports = self.aggregator.run(sections).await;
        let digest = self.assembler.assemble(&reports, run_date);

        tracing::info!(
            sections = digest.sections.len(),
            failed = digest.failed_sections(),
            bytes = digest.body.len(),
            "Briefing assembled"
        );

        digest
    }

    /// Build and deliver the digest
    pub async fn execute(
        &self,
        sections: &[Section],
        run_date: &str,
    ) -> Result<RunOutcome, RunError> {
        let digest = self.build(sections, run_date).await;

        if self.config.dry_run {
            tracing::info!("[DRY RUN] Skipping delivery");
            return Ok(RunOutcome {
                digest,
                delivered: false,
            });
        }

        let mail = OutgoingMail {
            from: self.config.from.clone(),
            to: self.config.to.clone(),
            subject: digest.subject.clone(),
            body: digest.body.clone(),
        };

        tracing::info!(
            transport = self.mailer.transport(),
            to = %mail.to,
            subject = %mail.subject,
            "Sending briefing"
        );

        match self.mailer.send(&mail).await {
            Ok(()) => {
                tracing::info!(transport = self.mailer.transport(), "Briefing delivered");
                Ok(RunOutcome {
                    digest,
                    delivered: true,
                })
            }
            Err(source) => Err(RunError::Delivery {
                transport: self.mailer.transport(),
                digest: Box::new(digest),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, SectionStatus};
    use crate::ports::{ItemSource, SourceError};
    use crate::usecases::aggregate::SectionPolicy;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource(Result<Vec<Item>, SourceError>);

    #[async_trait]
    impl ItemSource for FakeSource {
        async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    struct FakeMailer {
        fail: bool,
        sent: Mutex<Vec<OutgoingMail>>,
    }

    impl FakeMailer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                sent: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Transport("535 authentication failed".to_string()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }

        fn transport(&self) -> &'static str {
            "fake"
        }
    }

    fn sections() -> Vec<Section> {
        vec![
            Section::new(
                "news",
                "News:",
                Arc::new(FakeSource(Ok(vec![Item::new("China eases tariffs", "https://a")]))),
                SectionPolicy::Plain { limit: None },
            ),
            Section::new(
                "broken",
                "Broken:",
                Arc::new(FakeSource(Err(SourceError::Status(500)))),
                SectionPolicy::Plain { limit: None },
            ),
        ]
    }

    fn config(dry_run: bool) -> BriefingConfig {
        BriefingConfig {
            from: "bot@example.com".to_string(),
            to: "reader@example.com".to_string(),
            dry_run,
        }
    }

    #[tokio::test]
    async fn test_execute_delivers_digest() {
        let mailer = FakeMailer::new(false);
        let run = BriefingRun::new(
            SectionAggregator::default(),
            DigestAssembler::default(),
            Arc::clone(&mailer),
            config(false),
        );

        let outcome = run.execute(&sections(), "2024-05-16").await.unwrap();

        assert!(outcome.delivered);
        assert_eq!(
            outcome.digest.sections,
            vec![SectionStatus::Items, SectionStatus::Failed]
        );

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "reader@example.com");
        assert!(sent[0].body.contains("China eases tariffs"));
        assert!(sent[0].subject.contains("2024-05-16"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_mailer() {
        let mailer = FakeMailer::new(false);
        let run = BriefingRun::new(
            SectionAggregator::default(),
            DigestAssembler::default(),
            Arc::clone(&mailer),
            config(true),
        );

        let outcome = run.execute(&sections(), "2024-05-16").await.unwrap();

        assert!(!outcome.delivered);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_digest() {
        let run = BriefingRun::new(
            SectionAggregator::default(),
            DigestAssembler::default(),
            FakeMailer::new(true),
            config(false),
        );

        let error = run.execute(&sections(), "2024-05-16").await.unwrap_err();

        let RunError::Delivery { digest, .. } = error;
        assert!(digest.body.contains("China eases tariffs"));
    }
}
