use super::{SourceConfig, MAX_PAGE_SIZE};
use crate::utils::error::{FeedError, Result};
use crate::utils::validation::{self, Validate};
use std::path::Path;

impl SourceConfig {
    /// Load a source definition from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a source definition; `${VAR}` placeholders are filled from the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FeedError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    // unknown variables are left in place so validation reports them verbatim
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FeedError::ConfigParse {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("source.name", &self.source.name)?;
        validation::validate_domain("source.domain", &self.source.domain)?;
        if let Some(url) = &self.source.api_base_url {
            validation::validate_url("source.api_base_url", url)?;
        }
        validation::validate_non_empty_string("source.date_pattern", &self.source.date_pattern)?;

        validation::validate_range("feed.page_size", self.feed.page_size, 1, MAX_PAGE_SIZE)?;
        validation::validate_range(
            "feed.first_page_size",
            self.feed.first_page_size,
            1,
            MAX_PAGE_SIZE,
        )?;
        validation::validate_positive_number("feed.max_items", self.feed.max_items, 1)?;
        validation::validate_range("feed.parallelism", self.feed.parallelism, 1, 16)?;

        validation::validate_non_empty_string("locale.fallback", &self.locale.fallback)?;
        for tag in &self.locale.preferred {
            validation::validate_non_empty_string("locale.preferred", tag)?;
        }

        validation::validate_positive_number(
            "http.timeout_seconds",
            self.http.timeout_seconds as usize,
            1,
        )?;

        Ok(())
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
