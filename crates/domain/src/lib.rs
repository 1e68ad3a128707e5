//! briefing domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Items, section reports and the digest
//! - `keywords`: Keyword sets, weighted categories and the matched text surface
//! - `relevance`: Inclusion/exclusion classification of single items
//! - `ranking`: Weighted scoring and top-N selection
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Section aggregation, digest assembly and the briefing run

pub mod keywords;
pub mod model;
pub mod ports;
pub mod ranking;
pub mod relevance;
pub mod usecases;

pub use keywords::{KeywordSet, TextSurface, WeightedCategory};
pub use model::*;
pub use ports::*;
pub use ranking::{RankConfig, Ranker, ScoredItem, rank};
pub use relevance::{RelevanceFilter, is_relevant};
