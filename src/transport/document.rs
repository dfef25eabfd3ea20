//! Queryable view over returned markup
//!
//! A thin wrapper around `scraper` exposing exactly what the crawler needs:
//! pattern-based element selection plus per-element text and attribute
//! extraction. Keeps parser specifics out of the crawl logic.

use crate::{Result, WikidotError};
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document supporting CSS pattern selection
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses an HTML fragment or full document
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Returns all elements matching the CSS pattern, in document order
    pub fn select(&self, pattern: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = compile(pattern)?;
        Ok(self.html.select(&selector).collect())
    }
}

/// Compiles a CSS selector, surfacing bad patterns as parse errors
pub(crate) fn compile(pattern: &str) -> Result<Selector> {
    Selector::parse(pattern)
        .map_err(|e| WikidotError::Parse(format!("invalid selector {pattern:?}: {e}")))
}

/// Collects an element's rendered text, trimmed
pub(crate) fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_class() {
        let doc = HtmlDocument::parse(r#"<div class="a"><span class="b">x</span></div>"#);
        let found = doc.select(".b").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(text_of(&found[0]), "x");
    }

    #[test]
    fn test_select_preserves_document_order() {
        let doc = HtmlDocument::parse(r#"<i class="t">1</i><i class="t">2</i><i class="t">3</i>"#);
        let texts: Vec<String> = doc.select(".t").unwrap().iter().map(text_of).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_text_is_trimmed() {
        let doc = HtmlDocument::parse("<h1>  Alice \n</h1>");
        let found = doc.select("h1").unwrap();
        assert_eq!(text_of(&found[0]), "Alice");
    }

    #[test]
    fn test_attribute_extraction() {
        let doc = HtmlDocument::parse(r#"<a onclick="f(42); return false;">name</a>"#);
        let found = doc.select("a").unwrap();
        assert_eq!(
            found[0].value().attr("onclick"),
            Some("f(42); return false;")
        );
    }

    #[test]
    fn test_invalid_selector_is_parse_error() {
        let doc = HtmlDocument::parse("<p>x</p>");
        assert!(matches!(doc.select("p["), Err(WikidotError::Parse(_))));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let doc = HtmlDocument::parse("<p>x</p>");
        assert!(doc.select(".missing").unwrap().is_empty());
    }
}
