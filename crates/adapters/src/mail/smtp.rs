//! SMTP delivery over STARTTLS

use async_trait::async_trait;
use briefing_domain::{DeliveryError, Mailer, OutgoingMail};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// SMTP mailer authenticating with username and password
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport_for(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let credentials = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(self.port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build();

        Ok(transport)
    }
}

/// Build a plain-text UTF-8 message
pub fn build_message(mail: &OutgoingMail) -> Result<Message, DeliveryError> {
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|e| DeliveryError::Address(format!("from '{}': {}", mail.from, e)))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|e| DeliveryError::Address(format!("to '{}': {}", mail.to, e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|e| DeliveryError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let message = build_message(mail)?;
        let transport = self.transport_for()?;

        tracing::debug!(host = %self.host, port = self.port, "Connecting to SMTP relay");

        transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Email sent");
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "smtp"
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
