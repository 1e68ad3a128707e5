//! Mail transport adapters

mod outbox;
mod smtp;

pub use outbox::{OutboxError, OutboxMailer, OutboxWriter};
pub use smtp::{SmtpMailer, build_message};

use async_trait::async_trait;
use briefing_domain::{DeliveryError, Mailer, OutgoingMail};
use std::sync::Mutex;

/// Stub mailer for testing; records every mail it is given
#[derive(Debug, Default)]
pub struct StubMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_with: Option<String>,
}

impl StubMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub whose sends always fail with a transport error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Mails accepted so far
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        if let Some(message) = &self.fail_with {
            return Err(DeliveryError::Transport(message.clone()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "stub"
    }
}
