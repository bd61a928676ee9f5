//! Per-paper task execution: fetch with retry, extract, record, download

use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::ProgressBar;
use nipscrape_core::{Fetcher, RetryError, RetryPolicy, is_shutdown_requested, retry_with_backoff};

use crate::extract::extract;
use crate::output::{OutputLayout, PaperSink};
use crate::pdf::{PdfOutcome, download_pdf};
use crate::record::PaperRecord;
use crate::task::CrawlTask;

/// Terminal state of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Page fetched and a record extracted
    Success(PaperRecord),
    /// Page fetched, but it has no PDF link of the expected form
    NoContent,
    /// Every fetch attempt failed
    GaveUp { attempts: u32 },
    /// Shutdown requested before or during the task
    Cancelled,
}

/// Fetch the paper page with retries, then extract once.
///
/// Extraction is deterministic for a given page, so a page without content is
/// reported as [`Outcome::NoContent`] without further attempts.
pub fn run_with_retry<F: Fetcher + ?Sized>(
    task: &CrawlTask,
    fetcher: &F,
    policy: &RetryPolicy,
) -> Outcome {
    let url = task.paper_url.as_str();
    let doc = match retry_with_backoff(url, policy, |_| fetcher.fetch(url)) {
        Ok(doc) => doc,
        Err(RetryError::GaveUp { attempts, .. }) => return Outcome::GaveUp { attempts },
        Err(RetryError::Cancelled { .. }) => return Outcome::Cancelled,
    };
    match extract(task.format, &doc, &task.paper_url) {
        Some(record) => Outcome::Success(record),
        None => {
            log::info!("No {} PDF link on {url}, skipping", task.format);
            Outcome::NoContent
        }
    }
}

/// Counters shared by every worker of a run
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub written: AtomicUsize,
    pub no_content: AtomicUsize,
    pub gave_up: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub write_failures: AtomicUsize,
    pub pdfs_downloaded: AtomicUsize,
    pub pdfs_existing: AtomicUsize,
    pub pdfs_failed: AtomicUsize,
}

impl CrawlStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// Everything a worker borrows from the run
pub struct WorkerContext<'a, F: ?Sized> {
    pub fetcher: &'a F,
    pub sink: &'a PaperSink,
    pub layout: &'a OutputLayout,
    pub retry: &'a RetryPolicy,
    pub download_pdfs: bool,
    pub stats: &'a CrawlStats,
    pub progress: &'a ProgressBar,
}

/// Run one task to completion and account for it.
///
/// The record is written before any PDF download starts, so a PDF failure
/// never loses metadata.
pub fn process_task<F: Fetcher + ?Sized>(task: &CrawlTask, ctx: &WorkerContext<'_, F>) -> Outcome {
    let outcome = if is_shutdown_requested() {
        Outcome::Cancelled
    } else {
        run_with_retry(task, ctx.fetcher, ctx.retry)
    };

    match &outcome {
        Outcome::Success(record) => {
            match ctx.sink.write_record(record) {
                Ok(path) => {
                    CrawlStats::bump(&ctx.stats.written);
                    log::debug!("Saved {}", path.display());
                }
                Err(e) => {
                    CrawlStats::bump(&ctx.stats.write_failures);
                    log::error!("Failed to write record for {}: {e}", record.paper_url);
                }
            }
            if ctx.download_pdfs {
                let counter = match download_pdf(ctx.fetcher, record, &ctx.layout.pdf_dir()) {
                    PdfOutcome::Downloaded { .. } => &ctx.stats.pdfs_downloaded,
                    PdfOutcome::AlreadyPresent => &ctx.stats.pdfs_existing,
                    PdfOutcome::Failed => &ctx.stats.pdfs_failed,
                };
                CrawlStats::bump(counter);
            }
        }
        Outcome::NoContent => CrawlStats::bump(&ctx.stats.no_content),
        Outcome::GaveUp { .. } => CrawlStats::bump(&ctx.stats.gave_up),
        Outcome::Cancelled => CrawlStats::bump(&ctx.stats.cancelled),
    }
    ctx.progress.inc(1);
    outcome
}
