//! Config command - configuration management

use anyhow::{Context, Result, bail};
use std::path::Path;
use tokio::fs;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(&path, force).await,
    }
}

async fn init_config(path: &Path, force: bool) -> Result<()> {
    if fs::try_exists(path).await.unwrap_or(false) && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, AppConfig::example_toml())
        .await
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Example configuration written");

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set the mail server, recipient and sections");
    println!("  2. Export the mail password (EMAIL_PASSWORD by default)");
    println!("  3. Run 'briefing doctor' to validate your setup");
    println!("  4. Run 'briefing run --dry-run' to preview the digest");

    Ok(())
}

