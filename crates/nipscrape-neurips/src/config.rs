//! Crawl configuration

use nipscrape_core::RetryPolicy;

use crate::output::OutputLayout;

/// Conference proceedings origin; its front page links every year page
pub const DEFAULT_BASE_URL: &str = "https://papers.nips.cc";

/// Datasets & Benchmarks track, crawled alongside 2021
pub const DEFAULT_DATASETS_URL: &str = "https://datasets-benchmarks-proceedings.neurips.cc";

/// Worker pool size
pub const DEFAULT_WORKERS: usize = 50;

/// Everything one crawl run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Listing page of the 2021 datasets track, enumerated with the legacy selector
    pub datasets_url: String,
    pub layout: OutputLayout,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub download_pdfs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            datasets_url: DEFAULT_DATASETS_URL.to_string(),
            layout: OutputLayout::default(),
            workers: DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
            download_pdfs: true,
        }
    }
}

impl Config {
    /// Page listing the year links: the site origin itself, fetched as configured
    pub fn archive_root(&self) -> &str {
        &self.base_url
    }
}
