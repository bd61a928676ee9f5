//! Paper metadata record

use serde::{Deserialize, Serialize};

/// Title used when a page has no usable title
pub const UNTITLED: &str = "Untitled";

/// Abstract used when a page has no abstract section
pub const NO_ABSTRACT: &str = "No abstract available";

/// Column order of the tabular output; matches the field order of [`PaperRecord`]
pub const CSV_HEADER: &[&str] = &["title", "authors", "abstract", "pdf_url", "paper_url"];

/// Metadata extracted from one paper page.
///
/// Every field is always present; absent page content falls back to
/// [`UNTITLED`], an empty author list, or [`NO_ABSTRACT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: String,
    pub paper_url: String,
}
