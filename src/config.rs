//! Crawl configuration.
//!
//! Defaults target the Economist. An optional YAML file can override any
//! field, and the CLI overrides the file. The resulting [`CrawlConfig`] is
//! handed to the orchestrator by value; nothing reads configuration from
//! global state.
//!
//! ```yaml
//! base_url: https://www.economist.com
//! site_name: Economist
//! output_dir: ./archive
//! pacing_secs: 2
//! timeout_secs: 30
//! ```

use crate::errors::CrawlError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.economist.com";
pub const DEFAULT_SITE_NAME: &str = "Economist";
/// Delay applied before each article fetch when pacing is switched on
/// without an explicit interval.
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// Site root; article, edition and archive URLs are joined onto it.
    pub base_url: Url,
    /// Used in the year index heading.
    pub site_name: String,
    /// Directory the year index and edition directories are written under.
    pub output_dir: PathBuf,
    /// Delay before each article fetch. `None` disables pacing.
    pub pacing: Option<Duration>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            site_name: DEFAULT_SITE_NAME.to_string(),
            output_dir: PathBuf::from("."),
            pacing: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// On-disk shape; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    site_name: Option<String>,
    output_dir: Option<PathBuf>,
    pacing_secs: Option<u64>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

impl CrawlConfig {
    /// Parse YAML text on top of the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, CrawlError> {
        let file: ConfigFile =
            serde_yaml::from_str(text).map_err(|e| CrawlError::Config(e.to_string()))?;
        let mut config = Self::default();

        if let Some(base) = file.base_url {
            config.base_url = Url::parse(&base)
                .map_err(|e| CrawlError::Config(format!("base_url {base:?}: {e}")))?;
        }
        if let Some(name) = file.site_name {
            config.site_name = name;
        }
        if let Some(dir) = file.output_dir {
            config.output_dir = dir;
        }
        if let Some(secs) = file.pacing_secs {
            config.pacing = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(agent) = file.user_agent {
            config.user_agent = agent;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Load a config file, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, CrawlError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CrawlError::io(path, e))?;
        let config = Self::from_yaml(&text)?;
        info!(base_url = %config.base_url, output_dir = %config.output_dir.display(), "Loaded configuration");
        Ok(config)
    }

    /// Switch pacing on. `None` means the 2 second default; `Some(0)` turns it off.
    pub fn with_pacing_secs(mut self, secs: Option<u64>) -> Self {
        self.pacing = match secs {
            None => Some(DEFAULT_PACING),
            Some(0) => None,
            Some(s) => Some(Duration::from_secs(s)),
        };
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Absolute URL for a site-relative link; absolute links pass through.
    pub fn site_url(&self, link: &str) -> Result<Url, CrawlError> {
        Ok(self.base_url.join(link)?)
    }
}
