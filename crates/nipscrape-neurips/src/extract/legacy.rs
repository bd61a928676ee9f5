//! Pages up to 2021: title in the first `<h4>`, PDF link containing "Paper.pdf"

use std::sync::LazyLock;

use nipscrape_core::Document;
use nipscrape_core::document::{element_text, following_element_siblings};
use scraper::Selector;
use url::Url;

use super::{HEADING, authors, pdf_url, section_heading};
use crate::record::{NO_ABSTRACT, PaperRecord, UNTITLED};

static PDF_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="Paper.pdf"]"#).expect("invalid PDF selector"));

pub(super) fn extract(doc: &Document, page_url: &Url) -> Option<PaperRecord> {
    let pdf_url = pdf_url(doc, &PDF_LINK, page_url)?;

    let title = doc
        .select_first(&HEADING)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    Some(PaperRecord {
        title,
        authors: authors(doc),
        abstract_text: abstract_text(doc),
        pdf_url,
        paper_url: page_url.to_string(),
    })
}

/// First non-empty element after the "Abstract" heading.
///
/// Old pages often nest paragraphs, which the parser splits into an empty
/// `<p>` followed by the real one.
fn abstract_text(doc: &Document) -> String {
    section_heading(doc, "Abstract")
        .and_then(|h| {
            following_element_siblings(h)
                .map(element_text)
                .find(|t| !t.is_empty())
        })
        .unwrap_or_else(|| NO_ABSTRACT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://papers.nips.cc/paper_files/paper/2019/hash/abc-Abstract.html").unwrap()
    }

    fn page(body: &str) -> Document {
        Document::parse(&format!("<html><head><title>NeurIPS</title></head><body>{body}</body></html>"))
    }

    const FULL: &str = r#"
        <h4>Deep Things</h4>
        <a href="/paper_files/paper/2019/file/abc-Metadata.json">Metadata</a>
        <a href="/paper_files/paper/2019/file/abc-Paper.pdf">Paper</a>
        <a href="/paper_files/paper/2019/file/abc-Supplemental.zip">Supplemental</a>
        <h4>Authors</h4>
        <p><i>Ada Lovelace, Alan Turing</i></p>
        <h4>Abstract</h4>
        <p></p>
        <p>   </p>
        <p>We show things are deep.</p>
    "#;

    #[test]
    fn full_page() {
        let record = extract(&page(FULL), &page_url()).unwrap();
        assert_eq!(
            record,
            PaperRecord {
                title: "Deep Things".into(),
                authors: "Ada Lovelace, Alan Turing".into(),
                abstract_text: "We show things are deep.".into(),
                pdf_url: "https://papers.nips.cc/paper_files/paper/2019/file/abc-Paper.pdf".into(),
                paper_url: page_url().to_string(),
            }
        );
    }

    #[test]
    fn abstract_skips_two_empty_siblings() {
        let doc = page("<h4>Abstract</h4><p></p><div> </div><p>Real text.</p><p>Later.</p>");
        assert_eq!(abstract_text(&doc), "Real text.");
    }

    #[test]
    fn nested_paragraphs_split_by_parser() {
        // <p><p>..</p></p> parses as an empty <p> then the real one
        let doc = page("<h4>Abstract</h4><p><p>Nested abstract.</p></p>");
        assert_eq!(abstract_text(&doc), "Nested abstract.");
    }

    #[test]
    fn abstract_missing_or_all_empty() {
        assert_eq!(abstract_text(&page("<h4>Title</h4>")), NO_ABSTRACT);
        assert_eq!(abstract_text(&page("<h4>Abstract</h4><p></p>")), NO_ABSTRACT);
    }

    #[test]
    fn no_pdf_link_is_no_content() {
        let doc = page(r#"<h4>Deep Things</h4><a href="/abc-Supplemental.zip">s</a>"#);
        assert!(extract(&doc, &page_url()).is_none());
    }

    #[test]
    fn missing_title_falls_back() {
        let doc = page(r#"<a href="/abc-Paper.pdf">p</a>"#);
        let record = extract(&doc, &page_url()).unwrap();
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.authors, "");
        assert_eq!(record.abstract_text, NO_ABSTRACT);
    }

    #[test]
    fn first_matching_pdf_link_wins() {
        let doc = page(
            r#"<h4>T</h4><a href="/one-Paper.pdf">1</a><a href="/two-Paper.pdf">2</a>"#,
        );
        let record = extract(&doc, &page_url()).unwrap();
        assert_eq!(record.pdf_url, "https://papers.nips.cc/one-Paper.pdf");
    }
}
