//! Configuration loading and management

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the flat `KEY=VALUE;KEY=VALUE` variable carrying mail settings
pub const LEGACY_CONFIG_ENV: &str = "CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub digest: DigestConfig,

    /// Named keyword lists referenced by sections
    #[serde(default)]
    pub keyword_sets: BTreeMap<String, Vec<String>>,

    /// Weighted categories used by ranked sections
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,

    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_section_timeout")]
    pub section_timeout_secs: u64,

    /// 0 disables the whole-run deadline
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    #[serde(default = "default_undelivered_path")]
    pub undelivered_path: PathBuf,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_mail_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Defaults to `username`
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: String,

    /// Password taken from the legacy CONFIG variable; never serialized
    #[serde(skip)]
    inline_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default = "default_greeting")]
    pub greeting: String,

    #[serde(default = "default_intro")]
    pub intro: String,

    #[serde(default = "default_closing")]
    pub closing: String,

    /// `time` format description for the run date
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub weight: i32,

    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Plain,
    Filtered,
    Ranked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: String,

    pub header: String,

    pub source: SourceConfig,

    #[serde(default)]
    pub policy: PolicyKind,

    /// Maximum lines for plain and filtered sections
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub max_considered: Option<usize>,

    #[serde(default)]
    pub top_n: Option<usize>,

    /// Keyword set name
    #[serde(default)]
    pub inclusion: Option<String>,

    /// Keyword set name
    #[serde(default)]
    pub exclusion: Option<String>,

    /// Category names
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub include_link: bool,

    #[serde(default)]
    pub exclusion_penalty: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Feed {
        url: String,
    },
    Listing {
        url: String,
        item_selector: String,
        #[serde(default)]
        title_selector: Option<String>,
        #[serde(default)]
        link_selector: Option<String>,
        #[serde(default)]
        summary_selector: Option<String>,
        #[serde(default = "default_link_attr")]
        link_attr: String,
        #[serde(default)]
        link_pattern: Option<String>,
    },
    Snapshot {
        url: String,
        link: String,
        #[serde(default)]
        quotes: Vec<QuoteConfig>,
    },
    Static {
        #[serde(default)]
        links: Vec<LinkConfig>,
    },
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Feed { .. } => "feed",
            Self::Listing { .. } => "listing",
            Self::Snapshot { .. } => "snapshot",
            Self::Static { .. } => "static",
        }
    }

    /// URL, or the link count for static sources
    pub fn location(&self) -> String {
        match self {
            Self::Feed { url } | Self::Listing { url, .. } | Self::Snapshot { url, .. } => {
                url.clone()
            }
            Self::Static { links } => format!("{} links", links.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub label: String,
    pub pointer: String,
    #[serde(default)]
    pub decimals: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// A configuration problem detected before any fetch
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required mail setting: {0}")]
    MissingMail(&'static str),
    #[error("Mail password not found: set {0} or EMAIL_PASSWORD in CONFIG")]
    MissingPassword(String),
    #[error("Invalid CONFIG entry '{0}': expected KEY=VALUE")]
    LegacyEntry(String),
    #[error("Invalid EMAIL_PORT in CONFIG: {0}")]
    LegacyPort(String),
    #[error("Duplicate section id: {0}")]
    DuplicateSection(String),
    #[error("Section '{section}' references unknown keyword set '{name}'")]
    UnknownKeywordSet { section: String, name: String },
    #[error("Section '{section}' references unknown category '{name}'")]
    UnknownCategory { section: String, name: String },
    #[error("Section '{0}' uses the filtered policy but has no inclusion set")]
    MissingInclusion(String),
    #[error("Section '{section}' sets {field} = 0")]
    ZeroCount {
        section: String,
        field: &'static str,
    },
    #[error("Section '{0}' has an empty id or header")]
    MissingLabel(String),
    #[error("Invalid date format '{0}': {1}")]
    DateFormat(String, String),
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_section_timeout() -> u64 {
    30
}

fn default_run_timeout() -> u64 {
    120
}

fn default_undelivered_path() -> PathBuf {
    PathBuf::from("./undelivered.jsonl")
}

fn default_mail_port() -> u16 {
    587
}

fn default_password_env() -> String {
    "EMAIL_PASSWORD".to_string()
}

fn default_subject() -> String {
    "Your daily China briefing – {date}".to_string()
}

fn default_greeting() -> String {
    "Good morning,".to_string()
}

fn default_intro() -> String {
    "📅 Your daily China briefing for {date}".to_string()
}

fn default_closing() -> String {
    "Have a successful day!".to_string()
}

fn default_date_format() -> String {
    "[year]-[month]-[day]".to_string()
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_concurrent: default_max_concurrent(),
            section_timeout_secs: default_section_timeout(),
            run_timeout_secs: default_run_timeout(),
            undelivered_path: default_undelivered_path(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_mail_port(),
            username: String::new(),
            password_env: default_password_env(),
            from: String::new(),
            to: String::new(),
            inline_password: None,
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password_env", &self.password_env)
            .field("from", &self.from)
            .field("to", &self.to)
            .field(
                "inline_password",
                &self.inline_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            greeting: default_greeting(),
            intro: default_intro(),
            closing: default_closing(),
            date_format: default_date_format(),
        }
    }
}

impl MailConfig {
    /// Sender address; falls back to the login name
    pub fn sender(&self) -> &str {
        if self.from.trim().is_empty() {
            &self.username
        } else {
            &self.from
        }
    }

    /// Resolve the password from the legacy variable or `password_env`
    pub fn password(&self) -> Result<SecretString, ConfigError> {
        if let Some(password) = &self.inline_password {
            return Ok(SecretString::from(password.clone()));
        }

        match std::env::var(&self.password_env) {
            Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
            _ => Err(ConfigError::MissingPassword(self.password_env.clone())),
        }
    }

    /// True when a password is available, without exposing it
    pub fn has_password(&self) -> bool {
        self.password().is_ok()
    }

    /// Check that every setting needed for SMTP delivery is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingMail("mail.host"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingMail("mail.username"));
        }
        if self.to.trim().is_empty() {
            return Err(ConfigError::MissingMail("mail.to"));
        }
        self.password()?;
        Ok(())
    }

    /// Apply `EMAIL_*` keys from the legacy flat mapping
    pub fn apply_legacy(&mut self, entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        for (key, value) in entries {
            match key.as_str() {
                "EMAIL_HOST" => self.host = value.clone(),
                "EMAIL_PORT" => {
                    self.port = value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::LegacyPort(value.clone()))?;
                }
                "EMAIL_USER" => self.username = value.clone(),
                "EMAIL_PASSWORD" => self.inline_password = Some(value.clone()),
                "EMAIL_TO" => self.to = value.clone(),
                "EMAIL_FROM" => self.from = value.clone(),
                other => tracing::debug!(key = other, "Ignoring unknown legacy config key"),
            }
        }
        Ok(())
    }
}

/// Parse `KEY=VALUE;KEY=VALUE`. Values may contain `=`; empty segments are skipped.
pub fn parse_legacy(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut entries = BTreeMap::new();
    for pair in raw.split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::LegacyEntry(pair.to_string()))?;
        entries.insert(key.trim().to_string(), value.to_string());
    }
    Ok(entries)
}

fn find_named<'a, T>(map: &'a BTreeMap<String, T>, name: &str) -> Option<&'a T> {
    map.get(name).or_else(|| {
        let wanted = name.to_lowercase();
        map.iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, value)| value)
    })
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./briefing.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("BRIEFING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Ok(raw) = std::env::var(LEGACY_CONFIG_ENV) {
            let entries = parse_legacy(&raw)?;
            app.mail.apply_legacy(&entries)?;
            tracing::info!(keys = entries.len(), "Mail settings loaded from {}", LEGACY_CONFIG_ENV);
        }

        Ok(app)
    }

    /// Validate everything that does not depend on the run mode
    pub fn validate(&self) -> Result<(), ConfigError> {
        time::format_description::parse(&self.digest.date_format)
            .map_err(|e| ConfigError::DateFormat(self.digest.date_format.clone(), e.to_string()))?;

        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.id.trim().is_empty() || section.header.trim().is_empty() {
                return Err(ConfigError::MissingLabel(section.id.clone()));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(ConfigError::DuplicateSection(section.id.clone()));
            }

            for name in section.inclusion.iter().chain(section.exclusion.iter()) {
                if self.keyword_set(name).is_none() {
                    return Err(ConfigError::UnknownKeywordSet {
                        section: section.id.clone(),
                        name: name.clone(),
                    });
                }
            }
            for name in &section.categories {
                if self.category(name).is_none() {
                    return Err(ConfigError::UnknownCategory {
                        section: section.id.clone(),
                        name: name.clone(),
                    });
                }
            }

            if section.policy == PolicyKind::Filtered && section.inclusion.is_none() {
                return Err(ConfigError::MissingInclusion(section.id.clone()));
            }

            // A zero count would always render the placeholder
            let zero_field = match section.policy {
                PolicyKind::Ranked if section.top_n == Some(0) => Some("top_n"),
                PolicyKind::Ranked if section.max_considered == Some(0) => Some("max_considered"),
                PolicyKind::Plain | PolicyKind::Filtered if section.limit == Some(0) => {
                    Some("limit")
                }
                _ => None,
            };
            if let Some(field) = zero_field {
                return Err(ConfigError::ZeroCount {
                    section: section.id.clone(),
                    field,
                });
            }
        }

        Ok(())
    }

    /// Keyword set by name. Names compare case-insensitively since the
    /// file loader lowercases table keys.
    pub fn keyword_set(&self, name: &str) -> Option<&Vec<String>> {
        find_named(&self.keyword_sets, name)
    }

    /// Weighted category by name, compared case-insensitively
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        find_named(&self.categories, name)
    }

    pub fn section(&self, id: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# briefing configuration
#
# Environment overrides use the BRIEFING__ prefix, e.g. BRIEFING__MAIL__TO.
# Mail settings may also come from CONFIG="EMAIL_HOST=..;EMAIL_PORT=..;EMAIL_USER=..;EMAIL_PASSWORD=..;EMAIL_TO=..".

[general]
log_level = "info"
max_concurrent = 4
section_timeout_secs = 30
# 0 disables the whole-run deadline
run_timeout_secs = 120
undelivered_path = "./undelivered.jsonl"

[mail]
host = "smtp.example.com"
port = 587
username = "briefing@example.com"
password_env = "EMAIL_PASSWORD"
# from = "briefing@example.com"
to = "reader@example.com"

[digest]
subject = "Your daily China briefing – {date}"
greeting = "Good morning,"
intro = "📅 Your daily China briefing for {date}"
closing = "Have a successful day!"
date_format = "[year]-[month]-[day]"

[keyword_sets]
topic = ["china", "chinese", "beijing", "shanghai", "hong kong", "taiwan", "xi jinping", "yuan"]
noise = ["casino", "betting", "horoscope", "sponsored"]

[categories.economy]
weight = 3
keywords = ["economy", "gdp", "exports", "tariff", "trade", "industrial"]

[categories.politics]
weight = 2
keywords = ["taiwan", "politburo", "sanctions", "diplomat", "security law"]

[categories.markets]
weight = 1
keywords = ["stocks", "yuan", "byd", "tesla"]

[[sections]]
id = "top_stories"
header = "📰 Top stories"
policy = "ranked"
max_considered = 20
top_n = 5
inclusion = "topic"
exclusion = "noise"
categories = ["economy", "politics", "markets"]
source = { kind = "feed", url = "https://feeds.bbci.co.uk/news/world/asia/china/rss.xml" }

[[sections]]
id = "economy"
header = "🌏 Economy"
policy = "filtered"
limit = 5
inclusion = "topic"
exclusion = "noise"
source = { kind = "feed", url = "https://www.scmp.com/rss/318421/feed" }

[[sections]]
id = "analysis"
header = "🏛️ Analysis"
policy = "plain"
limit = 3
source = { kind = "listing", url = "https://example.com/china/", item_selector = "article h2 a", link_pattern = "/\\d{4}/\\d{2}/" }

[[sections]]
id = "markets"
header = "💹 Markets"
source = { kind = "snapshot", url = "https://open.er-api.com/v6/latest/USD", link = "https://www.exchangerate-api.com", quotes = [{ label = "USD/CNY", pointer = "/rates/CNY", decimals = 4 }, { label = "USD/HKD", pointer = "/rates/HKD", decimals = 4 }] }

[[sections]]
id = "links"
header = "🔗 Useful links"
source = { kind = "static", links = [{ title = "Xinhua English", link = "https://english.news.cn" }, { title = "Caixin Global", link = "https://www.caixinglobal.com" }] }
"#
        .to_string()
    }
}
