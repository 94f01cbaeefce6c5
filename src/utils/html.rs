// src/utils/html.rs

//! HTML text helpers shared by the lister and the extractor.

use scraper::{ElementRef, Node, Selector};

use crate::error::{AppError, Result};
use crate::utils::normalize_whitespace;

/// Elements that start a new line when text is flattened.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// Element siblings following `el`, in document order.
pub fn next_element_siblings<'a>(el: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

/// Parent element, if the parent node is an element.
pub fn parent_element<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Flatten an element to non-empty lines of text.
///
/// Block elements are treated as line boundaries, so adjacent paragraphs
/// never merge into one line even when the markup has no newlines.
pub fn text_lines(el: &ElementRef<'_>) -> Vec<String> {
    let mut buffer = String::new();
    push_text(*el, &mut buffer);
    buffer
        .lines()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_text(child, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, sel: &str) -> ElementRef<'a> {
        doc.select(&parse_selector(sel).unwrap()).next().unwrap()
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div[data-gu-name=\"body\"]").is_ok());
        assert!(parse_selector("h2, h3").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(matches!(
            parse_selector("[[invalid"),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn test_element_text_keeps_inline_words_together() {
        let doc = Html::parse_fragment("<p>A <b>great</b>\n   show</p>");
        assert_eq!(element_text(&first(&doc, "p")), "A great show");
    }

    #[test]
    fn test_text_lines_split_on_blocks() {
        let doc = Html::parse_fragment(
            "<div><p>1. First <em>show</em></p><p>2. Second</p><script>var x = 1;</script>\
             <ul><li>3. Third</li></ul></div>",
        );
        let lines = text_lines(&first(&doc, "div"));
        assert_eq!(lines, vec!["1. First show", "2. Second", "3. Third"]);
    }

    #[test]
    fn test_next_element_siblings_skip_text() {
        let doc = Html::parse_fragment("<div><h2>T</h2> text <p>a</p><p>b</p></div>");
        let names: Vec<_> = next_element_siblings(&first(&doc, "h2"))
            .map(|e| e.value().name().to_string())
            .collect();
        assert_eq!(names, vec!["p", "p"]);
    }
}
