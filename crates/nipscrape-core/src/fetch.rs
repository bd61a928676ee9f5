//! Blocking HTTP fetches over a shared async client.
//!
//! Uses async reqwest on a shared tokio runtime, but presents a sync
//! interface so rayon workers can call it directly.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use crate::document::Document;

/// Per-request timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout (capped by the request timeout)
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("nipscrape/", env!("CARGO_PKG_VERSION"));

/// Error from a single fetch attempt
#[derive(Debug)]
pub enum FetchError {
    /// Non-2xx status or transport failure
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Request did not complete within the configured timeout
    Timeout(String),
    /// Local I/O while writing a downloaded body
    Io(io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(message) => write!(f, "timed out: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl FetchError {
    /// Classify a reqwest error, keeping the status code when there is one
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout(e.to_string());
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Every network failure is worth another attempt; a full disk is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout(_) => true,
            Self::Io(e) => e.kind() != io::ErrorKind::StorageFull,
        }
    }
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Source of pages and files.
///
/// [`HttpFetcher`] is the production implementation; tests substitute an
/// in-memory page map.
pub trait Fetcher {
    /// GET `url` and return the body as text. Non-2xx responses are errors.
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` and parse the body as HTML
    fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        self.fetch_text(url).map(|body| Document::parse(&body))
    }

    /// GET `url` and write the body to `dest`, returning the byte count
    fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let body = self.fetch_text(url)?;
        std::fs::write(dest, body.as_bytes())?;
        Ok(body.len() as u64)
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Fetcher backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .pool_max_idle_per_host(64)
            .build()
            .map_err(|e| FetchError::from_reqwest(&e))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        SHARED_RUNTIME.handle().block_on(async {
            let response = self.get(url).await?;
            response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        SHARED_RUNTIME.handle().block_on(async {
            let mut response = self.get(url).await?;
            let mut file = File::create(dest)?;
            let mut written = 0u64;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?
            {
                file.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            file.flush()?;
            Ok(written)
        })
    }
}
