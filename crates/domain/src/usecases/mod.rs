//! Application use cases / business logic

pub mod aggregate;
pub mod assemble;
pub mod briefing;

pub use aggregate::{AggregatorConfig, Section, SectionAggregator, SectionPolicy};
pub use assemble::{DigestAssembler, DigestTemplate};
pub use briefing::{BriefingConfig, BriefingRun, RunError, RunOutcome};
