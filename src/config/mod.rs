#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::locale::LanguageTag;
use serde::{Deserialize, Serialize};

/// Largest page the upstream feed will serve.
pub const MAX_PAGE_SIZE: usize = 500;
/// Declared totals past this point are not trusted; the feed never serves beyond it.
pub const HARD_CEILING: usize = 10_000;
pub const FIRST_PAGE_SIZE: usize = 120;
pub const PARALLELISM: usize = 3;
pub const LOCALE_FALLBACK: &str = "en";
// 2022-01-02T00:27:11+00:00
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%dT%H:%M:%S+00:00";

const ALL_CONTENT_RATINGS: [&str; 4] = ["safe", "suggestive", "erotica", "pornographic"];

/// Everything that distinguishes one feed-backed site from another.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub source: SiteConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub domain: String,
    /// Overrides the `https://api.<domain>` default.
    pub api_base_url: Option<String>,
    pub date_pattern: String,
    pub allow_nsfw: bool,
    pub content_ratings: Option<Vec<String>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "MANGADEX".to_string(),
            domain: "mangadex.org".to_string(),
            api_base_url: None,
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            allow_nsfw: true,
            content_ratings: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub first_page_size: usize,
    pub page_size: usize,
    pub max_items: usize,
    pub parallelism: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            first_page_size: FIRST_PAGE_SIZE,
            page_size: MAX_PAGE_SIZE,
            max_items: HARD_CEILING,
            parallelism: PARALLELISM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub preferred: Vec<String>,
    pub fallback: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            preferred: vec![LOCALE_FALLBACK.to_string()],
            fallback: LOCALE_FALLBACK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("chapter-feed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourceConfig {
    pub fn api_base_url(&self) -> String {
        match &self.source.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", self.source.domain),
        }
    }

    pub fn content_ratings(&self) -> Vec<String> {
        if let Some(ratings) = &self.source.content_ratings {
            return ratings.clone();
        }
        let take = if self.source.allow_nsfw { 4 } else { 2 };
        ALL_CONTENT_RATINGS[..take]
            .iter()
            .map(|r| r.to_string())
            .collect()
    }

    pub fn preferred_locales(&self) -> Vec<LanguageTag> {
        self.locale
            .preferred
            .iter()
            .filter_map(|tag| LanguageTag::parse(tag))
            .collect()
    }
}
