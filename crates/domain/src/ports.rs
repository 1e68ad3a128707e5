//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{Item, OutgoingMail};

/// Error type for item source operations
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for fetching the raw, ordered item list of one source
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch items in source order
    async fn fetch(&self) -> Result<Vec<Item>, SourceError>;

    /// Short human-readable description for logs (usually the URL)
    fn describe(&self) -> String;
}

/// Error type for mail delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for handing the finished digest to a mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;

    /// Transport name for logs (e.g., "smtp", "outbox")
    fn transport(&self) -> &'static str;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}
