//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// briefing: aggregates feeds and pages into a daily digest delivered by mail
#[derive(Parser, Debug)]
#[command(name = "briefing")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the digest once and deliver it
    Run(RunArgs),

    /// Show relevance and score of one item
    Score(ScoreArgs),

    /// List configured sections
    Sections(SectionsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print the digest instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Append the digest to a JSONL outbox file instead of sending it
    #[arg(long, conflicts_with = "dry_run")]
    pub outbox: Option<PathBuf>,

    /// Override the run date shown in the digest
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Item title
    #[arg(long)]
    pub title: String,

    /// Item summary
    #[arg(long)]
    pub summary: Option<String>,

    /// Item link
    #[arg(long)]
    pub link: Option<String>,

    /// Use the keyword policy of this section
    #[arg(long)]
    pub section: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SectionsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./briefing.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
