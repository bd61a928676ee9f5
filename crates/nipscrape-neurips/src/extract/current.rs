//! Pages from 2022 on: title from `<title>`, PDF link ending "Paper-Conference.pdf"

use std::sync::LazyLock;

use nipscrape_core::Document;
use nipscrape_core::document::{element_text, next_element_sibling};
use scraper::Selector;
use url::Url;

use super::{authors, pdf_url, section_heading};
use crate::record::{NO_ABSTRACT, PaperRecord, UNTITLED};

/// Appended by the site to every page title
const TITLE_SUFFIX: &str = " - NeurIPS";

static PDF_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href$="Paper-Conference.pdf"]"#).expect("invalid PDF selector")
});

pub(super) fn extract(doc: &Document, page_url: &Url) -> Option<PaperRecord> {
    let pdf_url = pdf_url(doc, &PDF_LINK, page_url)?;

    Some(PaperRecord {
        title: title(doc),
        authors: authors(doc),
        abstract_text: abstract_text(doc),
        pdf_url,
        paper_url: page_url.to_string(),
    })
}

fn title(doc: &Document) -> String {
    doc.title()
        .map(|t| t.strip_suffix(TITLE_SUFFIX).unwrap_or(&t).trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// The element right after the "Abstract" heading, even if empty
fn abstract_text(doc: &Document) -> String {
    section_heading(doc, "Abstract")
        .and_then(next_element_sibling)
        .map(element_text)
        .unwrap_or_else(|| NO_ABSTRACT.to_string())
}
