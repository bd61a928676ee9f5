//! Crawl tasks and the page-format era they belong to

use std::fmt;

use url::Url;

/// Last year whose pages use the legacy layout
pub const LEGACY_LAST_YEAR: i32 = 2021;

/// Page layout era; decides which extractor and listing selector apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Up to 2021: `…-Abstract.html` pages, title in the first `<h4>`
    Legacy,
    /// 2022 on: `…-Abstract-Conference.html` pages, title in `<title>`
    Current,
}

impl FormatVersion {
    pub fn for_year(year: i32) -> Self {
        if year > LEGACY_LAST_YEAR {
            Self::Current
        } else {
            Self::Legacy
        }
    }

    /// CSS selector for paper links on a year listing page
    pub fn listing_selector(self) -> &'static str {
        match self {
            Self::Legacy => r#"a[href$="Abstract.html"]"#,
            Self::Current => r#"a[href$="Abstract-Conference.html"]"#,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// One paper page to fetch, extract and record.
///
/// Consumed exactly once by a worker; retries happen inside the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub paper_url: Url,
    pub year: i32,
    pub format: FormatVersion,
}

impl CrawlTask {
    /// Task whose format follows from `year`
    pub fn for_year(paper_url: Url, year: i32) -> Self {
        Self {
            paper_url,
            year,
            format: FormatVersion::for_year(year),
        }
    }
}
