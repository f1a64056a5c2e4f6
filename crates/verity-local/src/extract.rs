//! HTML to page content.
//!
//! Intentionally "good enough" and deterministic, not a readability engine:
//! the result is prompt input, so visible text plus a title is all we need.

use scraper::{Html, Selector};
use verity_core::PageContent;

pub(crate) fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the document title (default `"No Title"`) and the concatenated
/// text under `<body>`, with consecutive whitespace collapsed.
pub fn page_content(html: &str) -> PageContent {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| norm_ws(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No Title".to_string());

    let content = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|body| norm_ws(&body.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();

    PageContent { title, content }
}
