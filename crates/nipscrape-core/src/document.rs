//! Parsed HTML page and the traversal helpers extractors build on

use std::sync::LazyLock;

use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("invalid title selector"));

/// A parsed HTML document.
///
/// Not `Send`: parse and consume it on the same worker thread.
pub struct Document {
    html: Html,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title())
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Text of the `<title>` element, whitespace-normalized
    pub fn title(&self) -> Option<String> {
        self.select_first(&TITLE).map(element_text)
    }

    /// First element matching `selector` whose own text (not descendants') equals `text`
    pub fn find_by_own_text(&self, selector: &Selector, text: &str) -> Option<ElementRef<'_>> {
        self.select(selector).find(|el| own_text(*el) == text)
    }

    /// `href` values of every element matching `selector`, in document order
    pub fn hrefs<'a, 'b>(&'a self, selector: &'b Selector) -> impl Iterator<Item = &'a str> + 'b
    where
        'a: 'b,
    {
        self.select(selector).filter_map(|el| el.value().attr("href"))
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All descendant text of `el`, normalized
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// Text of `el`'s direct text children only, normalized
pub fn own_text(el: ElementRef<'_>) -> String {
    let raw: String = el
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|t| &**t)
        .collect();
    normalize_whitespace(&raw)
}

/// The next sibling that is an element, skipping text and comment nodes
pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Iterator over all following sibling elements
pub fn following_element_siblings(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    const PAGE: &str = r#"<html><head><title>  Some   Paper - NeurIPS </title></head>
        <body>
          <h4>Some Paper</h4>
          <h4>Authors <span>(3)</span></h4>
          <p>Alice,
             Bob</p>
          <h4>Abstract</h4>
          <!-- comment -->
          <p></p>
          <p>Body text.</p>
          <a href="/a.pdf">A</a>
          <a>no href</a>
          <a href="/b.pdf">B</a>
        </body></html>"#;

    #[test]
    fn title_normalized() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.title().as_deref(), Some("Some Paper - NeurIPS"));
    }

    #[test]
    fn title_missing() {
        let doc = Document::parse("<p>no head</p>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn own_text_ignores_children() {
        let doc = Document::parse(PAGE);
        let h = doc.find_by_own_text(&sel("h4"), "Authors").unwrap();
        assert_eq!(element_text(h), "Authors (3)");
        assert_eq!(own_text(h), "Authors");
    }

    #[test]
    fn find_by_own_text_exact() {
        let doc = Document::parse(PAGE);
        assert!(doc.find_by_own_text(&sel("h4"), "Author").is_none());
        assert!(doc.find_by_own_text(&sel("h4"), "Abstract").is_some());
    }

    #[test]
    fn next_sibling_skips_text_and_comments() {
        let doc = Document::parse(PAGE);
        let h = doc.find_by_own_text(&sel("h4"), "Authors").unwrap();
        let p = next_element_sibling(h).unwrap();
        assert_eq!(element_text(p), "Alice, Bob");

        let abs = doc.find_by_own_text(&sel("h4"), "Abstract").unwrap();
        let first = next_element_sibling(abs).unwrap();
        assert_eq!(element_text(first), "");
        let texts: Vec<String> = following_element_siblings(abs)
            .take(2)
            .map(element_text)
            .collect();
        assert_eq!(texts, vec!["".to_string(), "Body text.".to_string()]);
    }

    #[test]
    fn hrefs_in_order() {
        let doc = Document::parse(PAGE);
        let a = sel("a");
        let hrefs: Vec<&str> = doc.hrefs(&a).collect();
        assert_eq!(hrefs, vec!["/a.pdf", "/b.pdf"]);
    }

    #[test]
    fn normalize_collapses() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
