//! Nipscrape Core - Common infrastructure for crawling paper archives
//!
//! This crate provides the site-independent pieces: blocking HTTP fetches
//! with retry, parsed HTML documents, append-only output sinks shared
//! across workers, zip bundling, shutdown handling, logging and progress.

pub mod archive;
pub mod document;
pub mod fetch;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod sink;

// Re-exports for convenience
pub use archive::{zip_directory, zip_files};
pub use document::Document;
pub use fetch::{DEFAULT_TIMEOUT, FetchError, Fetcher, HttpFetcher, SHARED_RUNTIME};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress};
pub use retry::{RetryError, RetryPolicy, retry_with_backoff};
pub use shutdown::{
    install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag,
    sleep_unless_shutdown,
};
pub use sink::{CsvSink, JsonLinesSink, sanitize_filename, write_json_file};
