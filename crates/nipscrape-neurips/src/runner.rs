//! Crawl orchestration: discover year pages, enumerate papers, drain the pool

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::Context;
use nipscrape_core::progress::fmt_num;
use nipscrape_core::{
    Document, Fetcher, ProgressContext, RetryPolicy, is_shutdown_requested, retry_with_backoff,
};
use rayon::Scope;
use scraper::Selector;
use url::Url;

use crate::config::Config;
use crate::output::PaperSink;
use crate::task::{CrawlTask, FormatVersion, LEGACY_LAST_YEAR};
use crate::worker::{CrawlStats, WorkerContext, process_task};
use crate::years::{YearSelection, year_from_url};

/// Year links on the archive root
static YEAR_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href^="/paper_files/paper/"]"#).expect("invalid year selector")
});

static LEGACY_LISTING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(FormatVersion::Legacy.listing_selector()).expect("invalid listing selector")
});

static CURRENT_LISTING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(FormatVersion::Current.listing_selector()).expect("invalid listing selector")
});

fn listing_selector(format: FormatVersion) -> &'static Selector {
    match format {
        FormatVersion::Legacy => &LEGACY_LISTING,
        FormatVersion::Current => &CURRENT_LISTING,
    }
}

/// Crawl every selected year and block until all paper tasks finish.
///
/// Fails only when the archive root cannot be fetched or the configured URLs
/// are malformed. Year-level and paper-level failures are logged and counted.
pub fn run<F: Fetcher + Sync>(
    config: &Config,
    years: &YearSelection,
    fetcher: &F,
    progress: &ProgressContext,
) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    config
        .layout
        .create_dirs(config.download_pdfs)
        .with_context(|| format!("Failed to create {}", config.layout.root.display()))?;

    let root_url = Url::parse(config.archive_root())
        .with_context(|| format!("Invalid base URL: {}", config.base_url))?;
    let datasets_url = Url::parse(&config.datasets_url)
        .with_context(|| format!("Invalid datasets URL: {}", config.datasets_url))?;

    let root_page = config.archive_root();
    log::info!("Fetching archive root {root_page}");
    let root = fetch_page(fetcher, root_page, &config.retry)
        .with_context(|| format!("Failed to fetch archive root {root_page}"))?;
    let year_pages = discover_years(&root, &root_url);
    drop(root);

    for year in years.as_slice() {
        if !year_pages.iter().any(|(y, _)| y == year) {
            log::warn!("Year {year} is not listed on the archive root");
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .thread_name(|i| format!("crawl-{i}"))
        .build()
        .context("Failed to build worker pool")?;

    log::info!("Crawling {years} with {} workers", config.workers.max(1));

    let sink = PaperSink::new(&config.layout);
    let stats = CrawlStats::default();
    let bar = progress.task_line("papers");
    let ctx = WorkerContext {
        fetcher,
        sink: &sink,
        layout: &config.layout,
        retry: &config.retry,
        download_pdfs: config.download_pdfs,
        stats: &stats,
        progress: &bar,
    };

    let mut dispatch = Dispatch::default();
    pool.in_place_scope(|s| {
        for (year, year_url) in year_pages.iter().filter(|(y, _)| years.contains(*y)) {
            if is_shutdown_requested() {
                log::warn!("Shutdown requested, not enumerating further years");
                break;
            }
            let format = FormatVersion::for_year(*year);
            bar.set_message(format!("{year} ({format})"));
            dispatch.listing(s, &ctx, year_url, *year, format, &config.retry);
        }

        if years.contains(LEGACY_LAST_YEAR) && !is_shutdown_requested() {
            bar.set_message("2021 datasets & benchmarks");
            dispatch.listing(
                s,
                &ctx,
                &datasets_url,
                LEGACY_LAST_YEAR,
                FormatVersion::Legacy,
                &config.retry,
            );
        }
    });
    bar.finish_and_clear();

    let summary = RunSummary {
        years_crawled: dispatch.years_crawled,
        years_failed: dispatch.years_failed,
        submitted: dispatch.submitted,
        written: CrawlStats::get(&stats.written),
        no_content: CrawlStats::get(&stats.no_content),
        gave_up: CrawlStats::get(&stats.gave_up),
        cancelled: CrawlStats::get(&stats.cancelled),
        write_failures: CrawlStats::get(&stats.write_failures),
        pdfs_downloaded: CrawlStats::get(&stats.pdfs_downloaded),
        pdfs_existing: CrawlStats::get(&stats.pdfs_existing),
        pdfs_failed: CrawlStats::get(&stats.pdfs_failed),
        interrupted: is_shutdown_requested(),
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}

fn fetch_page<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Document, nipscrape_core::RetryError> {
    retry_with_backoff(url, policy, |_| fetcher.fetch(url))
}

/// Year pages linked from the archive root, in page order, one per year
fn discover_years(root: &Document, root_url: &Url) -> Vec<(i32, Url)> {
    let mut found: Vec<(i32, Url)> = Vec::new();
    for href in root.hrefs(&YEAR_LINK) {
        let url = match root_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Skipping year link {href:?}: {e}");
                continue;
            }
        };
        match year_from_url(&url) {
            Ok(year) if found.iter().any(|(y, _)| *y == year) => {}
            Ok(year) => found.push((year, url)),
            Err(e) => log::info!("Skipping year link: {e}"),
        }
    }
    log::debug!("Archive root lists {} years", found.len());
    found
}

/// Enumeration-side counters; only touched by the dispatching thread
#[derive(Debug, Default)]
struct Dispatch {
    years_crawled: usize,
    years_failed: usize,
    submitted: usize,
}

impl Dispatch {
    /// Fetch one listing page and submit a task per paper link on it
    fn listing<'scope, F: Fetcher + Sync>(
        &mut self,
        s: &Scope<'scope>,
        ctx: &'scope WorkerContext<'scope, F>,
        listing_url: &Url,
        year: i32,
        format: FormatVersion,
        policy: &RetryPolicy,
    ) {
        let page = match fetch_page(ctx.fetcher, listing_url.as_str(), policy) {
            Ok(page) => page,
            Err(e) => {
                log::error!("Skipping year {year}: {listing_url}: {e}");
                self.years_failed += 1;
                return;
            }
        };
        self.years_crawled += 1;

        let mut count = 0usize;
        for href in page.hrefs(listing_selector(format)) {
            let paper_url = match listing_url.join(href) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Skipping paper link {href:?} on {listing_url}: {e}");
                    continue;
                }
            };
            let task = CrawlTask {
                paper_url,
                year,
                format,
            };
            ctx.progress.inc_length(1);
            s.spawn(move |_| {
                process_task(&task, ctx);
            });
            count += 1;
        }
        self.submitted += count;
        log::info!("{listing_url}: submitted {count} {format} papers for {year}");
    }
}

/// Summary of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub years_crawled: usize,
    pub years_failed: usize,
    pub submitted: usize,
    pub written: usize,
    pub no_content: usize,
    pub gave_up: usize,
    pub cancelled: usize,
    pub write_failures: usize,
    pub pdfs_downloaded: usize,
    pub pdfs_existing: usize,
    pub pdfs_failed: usize,
    /// Shutdown was requested before the pool drained
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!("=== Crawl Summary ===");
        log::info!(
            "Listings: {} crawled, {} failed",
            self.years_crawled,
            self.years_failed
        );
        log::info!(
            "Papers: {}/{} written ({} without PDF link, {} gave up, {} cancelled, {} write failures)",
            fmt_num(self.written),
            fmt_num(self.submitted),
            self.no_content,
            self.gave_up,
            self.cancelled,
            self.write_failures
        );
        if self.pdfs_downloaded + self.pdfs_existing + self.pdfs_failed > 0 {
            log::info!(
                "PDFs: {} downloaded, {} already present, {} failed",
                self.pdfs_downloaded,
                self.pdfs_existing,
                self.pdfs_failed
            );
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.interrupted {
            log::warn!("Run interrupted by shutdown request");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_years_in_page_order() {
        let root_url = Url::parse("https://papers.nips.cc").unwrap();
        let root = Document::parse(
            r#"<ul>
                <li><a href="/paper_files/paper/2023">2023</a></li>
                <li><a href="/paper_files/paper/2022">2022</a></li>
                <li><a href="/paper_files/paper/2022">2022 again</a></li>
                <li><a href="/paper_files/paper/latest">latest</a></li>
                <li><a href="/other/2019">elsewhere</a></li>
            </ul>"#,
        );
        let years: Vec<i32> = discover_years(&root, &root_url)
            .into_iter()
            .map(|(y, _)| y)
            .collect();
        assert_eq!(years, vec![2023, 2022]);
    }

    #[test]
    fn year_urls_are_absolute() {
        let root_url = Url::parse("https://papers.nips.cc").unwrap();
        let root = Document::parse(r#"<a href="/paper_files/paper/2019">2019</a>"#);
        let found = discover_years(&root, &root_url);
        assert_eq!(found[0].1.as_str(), "https://papers.nips.cc/paper_files/paper/2019");
    }

    #[test]
    fn summary_log_does_not_panic() {
        let summary = RunSummary {
            years_crawled: 2,
            years_failed: 1,
            submitted: 10,
            written: 7,
            no_content: 1,
            gave_up: 1,
            cancelled: 1,
            write_failures: 0,
            pdfs_downloaded: 5,
            pdfs_existing: 2,
            pdfs_failed: 0,
            interrupted: true,
            elapsed: Duration::from_secs(3),
        };
        summary.log();
    }
}
