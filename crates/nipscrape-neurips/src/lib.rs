//! Nipscrape NeurIPS - crawler for the NeurIPS proceedings archive
//!
//! Walks the archive root to the selected year pages, submits one task per
//! paper page to a bounded worker pool, extracts metadata with the strategy
//! for the page's layout era, and appends every record to shared JSON-lines
//! and CSV streams plus one JSON file per paper.
//!
//! # Example
//!
//! ```no_run
//! use nipscrape_core::{HttpFetcher, ProgressContext, DEFAULT_TIMEOUT};
//! use nipscrape_neurips::{Config, YearSelection, run};
//!
//! let years = YearSelection::parse("2022, 2023").expect("valid years");
//! let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).expect("HTTP client");
//! let config = Config::default();
//!
//! let summary = run(&config, &years, &fetcher, &ProgressContext::new()).expect("crawl failed");
//! println!("Wrote {} records", summary.written);
//! ```

pub mod config;
pub mod extract;
pub mod output;
pub mod pdf;
pub mod record;
pub mod runner;
pub mod task;
pub mod worker;
pub mod years;

// Re-exports for convenience
pub use config::Config;
pub use extract::extract;
pub use output::{Bundles, OutputLayout, PaperSink, bundle};
pub use record::PaperRecord;
pub use runner::{RunSummary, run};
pub use task::{CrawlTask, FormatVersion};
pub use worker::{Outcome, run_with_retry};
pub use years::{YearSelection, YearSelectionError};
