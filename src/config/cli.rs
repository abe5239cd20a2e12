use super::SourceConfig;
use crate::app::export::ExportFormat;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "chapter-feed")]
#[command(about = "Fetch a de-duplicated chapter list from a paginated manga feed")]
pub struct CliArgs {
    /// Upstream title id
    pub manga_id: String,

    /// TOML source definition; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Preferred locales in rank order, e.g. `ja,en`
    #[arg(long, value_delimiter = ',')]
    pub locales: Vec<String>,

    #[arg(long)]
    pub parallelism: Option<usize>,

    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include title metadata along with the chapters
    #[arg(long)]
    pub details: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn load_config(&self) -> Result<SourceConfig> {
        let mut config = match &self.config {
            Some(path) => SourceConfig::from_file(path)?,
            None => SourceConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut SourceConfig) {
        if let Some(domain) = &self.domain {
            config.source.domain = domain.clone();
        }
        if let Some(url) = &self.api_base_url {
            config.source.api_base_url = Some(url.clone());
        }
        if !self.locales.is_empty() {
            config.locale.preferred = self.locales.clone();
        }
        if let Some(parallelism) = self.parallelism {
            config.feed.parallelism = parallelism;
        }
    }
}
