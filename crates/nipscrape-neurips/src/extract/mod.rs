//! Paper-page extraction, one strategy per page-format era.
//!
//! Both strategies share the section lookup ("Authors"/"Abstract" headings)
//! and differ in where the title lives, how the abstract paragraph is found,
//! and which link is the PDF. A page without a PDF link yields `None`.

mod current;
mod legacy;

use std::sync::LazyLock;

use nipscrape_core::Document;
use nipscrape_core::document::{element_text, next_element_sibling};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::record::PaperRecord;
use crate::task::FormatVersion;

/// Section headings on paper pages
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("invalid heading selector"));

/// Extract a record from `doc`, fetched from `page_url`, using `format`'s strategy.
///
/// Returns `None` when the page has no PDF link; nothing should be recorded then.
pub fn extract(format: FormatVersion, doc: &Document, page_url: &Url) -> Option<PaperRecord> {
    match format {
        FormatVersion::Legacy => legacy::extract(doc, page_url),
        FormatVersion::Current => current::extract(doc, page_url),
    }
}

/// Heading whose own text is exactly `label`
fn section_heading<'a>(doc: &'a Document, label: &str) -> Option<ElementRef<'a>> {
    doc.find_by_own_text(&HEADING, label)
}

/// Text of the element after the "Authors" heading; empty if absent
fn authors(doc: &Document) -> String {
    section_heading(doc, "Authors")
        .and_then(next_element_sibling)
        .map(element_text)
        .unwrap_or_default()
}

/// Absolute URL of the first link matching `selector`.
///
/// The href is joined against the paper page's own URL, so a `/`-prefixed
/// path lands on whichever origin served the page. Datasets-track papers
/// therefore keep the datasets host rather than the archive base URL.
fn pdf_url(doc: &Document, selector: &Selector, page_url: &Url) -> Option<String> {
    let href = doc.hrefs(selector).next()?;
    match page_url.join(href) {
        Ok(url) => Some(url.into()),
        Err(e) => {
            log::warn!("{page_url}: unusable PDF link {href:?}: {e}");
            None
        }
    }
}
