//! Crawl subcommand - fetch selected years, then bundle

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use nipscrape_core::progress::fmt_num;
use nipscrape_core::{HttpFetcher, SharedProgress, is_shutdown_requested};
use nipscrape_neurips::{OutputLayout, RunSummary, YearSelection, bundle};

use super::print_summary;
use crate::config::Config;
use crate::prompt;

/// Exit code after an interrupted run (128 + SIGINT)
const INTERRUPTED: u8 = 130;

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Years to crawl, comma-separated (at most 5, 1987-2023); prompts when omitted
    #[arg(short, long, value_parser = parse_years)]
    pub years: Option<YearSelection>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Download PDFs next to the metadata
    #[arg(long, overrides_with = "no_pdfs")]
    pub pdfs: bool,

    /// Skip PDF downloads
    #[arg(long, overrides_with = "pdfs")]
    pub no_pdfs: bool,

    /// Leave the zip bundles untouched
    #[arg(long)]
    pub no_bundle: bool,
}

impl CrawlArgs {
    fn download_pdfs(&self, default: bool) -> bool {
        if self.no_pdfs {
            false
        } else {
            self.pdfs || default
        }
    }
}

fn parse_years(s: &str) -> Result<YearSelection, String> {
    YearSelection::parse(s).map_err(|e| e.to_string())
}

pub fn run(args: CrawlArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let years = match &args.years {
        Some(years) => years.clone(),
        None => prompt::years()?,
    };
    if is_shutdown_requested() {
        return Ok(ExitCode::from(INTERRUPTED));
    }

    let crawl_config = nipscrape_neurips::Config {
        base_url: config.site.base_url.clone(),
        datasets_url: config.site.datasets_url.clone(),
        layout: OutputLayout::new(args.output.clone().unwrap_or_else(|| config.output.dir.clone())),
        workers: config.crawl.workers,
        retry: config.http.retry_policy(),
        download_pdfs: args.download_pdfs(config.crawl.download_pdfs),
    };

    let fetcher = HttpFetcher::new(Duration::from_secs(config.http.timeout))
        .context("Failed to build HTTP client")?;
    log::debug!(
        "Request timeout {}s, {} attempts per page",
        fetcher.timeout().as_secs(),
        crawl_config.retry.max_attempts
    );

    let summary = nipscrape_neurips::run(&crawl_config, &years, &fetcher, progress)?;
    print_crawl_summary(&years, &summary);

    if summary.interrupted {
        log::warn!("Interrupted, skipping bundles");
        return Ok(ExitCode::from(INTERRUPTED));
    }
    if args.no_bundle {
        return Ok(ExitCode::SUCCESS);
    }

    let bundles = bundle(&crawl_config.layout).context("Failed to write bundles")?;
    progress.println(format!(
        "Scraping complete. Metadata saved to {} and {}",
        bundles.metadata.display(),
        bundles.incremental.display()
    ));
    Ok(ExitCode::SUCCESS)
}

fn print_crawl_summary(years: &YearSelection, summary: &RunSummary) {
    let mut rows = vec![
        ("Years", years.to_string()),
        (
            "Listings",
            format!("{} crawled, {} failed", summary.years_crawled, summary.years_failed),
        ),
        ("Papers submitted", fmt_num(summary.submitted)),
        ("Records written", fmt_num(summary.written)),
        ("Without PDF link", fmt_num(summary.no_content)),
        ("Gave up", fmt_num(summary.gave_up)),
    ];
    if summary.cancelled > 0 {
        rows.push(("Cancelled", fmt_num(summary.cancelled)));
    }
    if summary.write_failures > 0 {
        rows.push(("Write failures", fmt_num(summary.write_failures)));
    }
    if summary.pdfs_downloaded + summary.pdfs_existing + summary.pdfs_failed > 0 {
        rows.push((
            "PDFs",
            format!(
                "{} downloaded, {} present, {} failed",
                summary.pdfs_downloaded, summary.pdfs_existing, summary.pdfs_failed
            ),
        ));
    }
    rows.push(("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())));
    print_summary("Crawl", &rows);
}
