//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use nipscrape_core::RetryPolicy;
use nipscrape_neurips::config::{DEFAULT_BASE_URL, DEFAULT_DATASETS_URL, DEFAULT_WORKERS};
use serde::Deserialize;

/// Global configuration for nipscrape
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub output: OutputConfig,
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub datasets_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            datasets_url: DEFAULT_DATASETS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./neurips"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub workers: usize,
    pub download_pdfs: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            download_pdfs: true,
        }
    }
}

/// Per-request limits; all durations in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout: u64,
    pub max_attempts: u32,
    pub backoff_base: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout: nipscrape_core::DEFAULT_TIMEOUT.as_secs(),
            max_attempts: retry.max_attempts,
            backoff_base: retry.backoff_base.as_secs(),
        }
    }
}

impl HttpConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_secs(self.backoff_base),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./nipscrape.toml (current directory)
    /// 2. ~/.config/nipscrape/config.toml (platform config dir)
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("nipscrape.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "nipscrape") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.site.base_url, "https://papers.nips.cc");
        assert_eq!(config.output.dir, PathBuf::from("./neurips"));
        assert_eq!(config.crawl.workers, 50);
        assert!(config.crawl.download_pdfs);
        assert_eq!(config.http.timeout, 60);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.http.backoff_base, 1);
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
[output]
dir = "/tmp/nips"

[crawl]
workers = 8
download_pdfs = false

[http]
max_attempts = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/tmp/nips"));
        assert_eq!(config.crawl.workers, 8);
        assert!(!config.crawl.download_pdfs);
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.timeout, 60);
        assert_eq!(config.site.datasets_url, DEFAULT_DATASETS_URL);
    }

    #[test]
    fn retry_policy_from_http() {
        let http = HttpConfig {
            timeout: 10,
            max_attempts: 4,
            backoff_base: 2,
        };
        let policy = http.retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
    }

    #[test]
    fn from_file_reads_and_rejects() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[site]\nbase_url = \"http://localhost:8000\"").unwrap();
        let config = Config::from_file(good.path()).unwrap();
        assert_eq!(config.site.base_url, "http://localhost:8000");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[crawl]\nworkers = \"many\"").unwrap();
        let err = Config::from_file(bad.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
