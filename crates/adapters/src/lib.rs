//! briefing adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `sources`: Syndication feeds, scraped listings, JSON snapshots, static links
//! - `mail`: SMTP delivery, JSONL outbox and a recording stub

pub mod mail;
pub mod sources;

pub use mail::{OutboxMailer, OutboxWriter, SmtpMailer, StubMailer};
pub use sources::{FeedSource, ListingSource, SnapshotSource, StaticSource, StubSource};
