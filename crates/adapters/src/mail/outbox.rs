//! Outbox mailer: appends digests to a JSONL file instead of sending them

use async_trait::async_trait;
use briefing_domain::{DeliveryError, Mailer, OutgoingMail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn new(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one mail as a JSON line
    pub async fn append(&self, mail: &OutgoingMail) -> Result<(), OutboxError> {
        let entry = OutboxEntry {
            written_at: OffsetDateTime::now_utc(),
            from: &mail.from,
            to: &mail.to,
            subject: &mail.subject,
            body: &mail.body,
        };

        let line = serde_json::to_string(&entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    #[serde(with = "time::serde::rfc3339")]
    written_at: OffsetDateTime,
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Mailer that writes to an outbox file for review
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    writer: OutboxWriter,
}

impl OutboxMailer {
    pub fn new(writer: OutboxWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        self.writer.append(mail).await.map_err(|error| match error {
            OutboxError::Io(e) => DeliveryError::Io(e),
            OutboxError::Serialize(e) => DeliveryError::Build(e.to_string()),
        })?;

        tracing::info!(outbox = %self.writer.path().display(), "Briefing written to outbox");
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "outbox"
    }
}
