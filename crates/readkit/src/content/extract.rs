//! HTML to plain text for stored and live document HTML

use super::segment::{segment_merged_words, segment_with, WordSegmenter};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use tracing::debug;

/// Subtrees that never carry article text
const SKIP_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "template",
];

static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));
static SELECTOR_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("static selector"));

static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").expect("static regex"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));

/// Check if content is HTML based on content-type or body sniffing
pub fn is_html(content_type: &Option<String>, body: &str) -> bool {
    if let Some(ct) = content_type {
        let ct_lower = ct.to_lowercase();
        if ct_lower.contains("text/html") || ct_lower.contains("application/xhtml") {
            return true;
        }
    }

    let trimmed = body.trim_start();
    let head: String = trimmed.chars().take(15).collect::<String>().to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Collapse runs of more than two newlines
pub fn filter_excessive_newlines(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push(c);
            }
        } else {
            newline_count = 0;
            result.push(c);
        }
    }

    result
}

/// Extract readable text from an HTML document
///
/// Output is `"{title}\n\n{body}"` when the document has a title, otherwise
/// the body text alone. Blank input yields an empty string.
pub async fn html_to_text(html: &str) -> String {
    let Some((title, body)) = parse_parts(html) else {
        return String::new();
    };
    let body = segment_merged_words(&body).await;
    assemble(title, body)
}

/// [`html_to_text`] with an explicit segmenter
pub fn html_to_text_with(segmenter: &dyn WordSegmenter, html: &str) -> String {
    let Some((title, body)) = parse_parts(html) else {
        return String::new();
    };
    let body = segment_with(segmenter, &body);
    assemble(title, body)
}

/// Title and normalized (but not yet segmented) body text
fn parse_parts(html: &str) -> Option<(String, String)> {
    if html.trim().is_empty() {
        return None;
    }

    let document = Html::parse_document(html);

    let title = document
        .select(&SELECTOR_TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut raw = String::new();
    match document.select(&SELECTOR_BODY).next() {
        Some(body) => collect_text(body, &mut raw),
        None => collect_text(document.root_element(), &mut raw),
    }

    let body = normalize_text(&raw);
    debug!(
        title_len = title.chars().count(),
        body_len = body.chars().count(),
        "Extracted text from HTML"
    );
    Some((title, body))
}

fn assemble(title: String, body: String) -> String {
    if title.is_empty() {
        body
    } else {
        format!("{}\n\n{}", title, body)
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if SKIP_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Whitespace and word-boundary cleanup of extracted body text
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = NEWLINE_RUNS.replace_all(&text, " ");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");
    let text = CASE_BOUNDARY.replace_all(&text, "$1 $2");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::segment::Dictionary;
    use crate::content::window::{process, ContentOptions, NO_MATCH_SENTINEL};

    fn dictionary() -> Dictionary {
        Dictionary::from_word_list("before\nafter\nwhat\nyou\nthe\nmean").unwrap()
    }

    #[test]
    fn test_is_html_by_content_type() {
        assert!(is_html(&Some("text/html; charset=utf-8".to_string()), ""));
        assert!(is_html(&Some("application/xhtml+xml".to_string()), ""));
        assert!(!is_html(&Some("text/plain".to_string()), "hello"));
    }

    #[test]
    fn test_is_html_by_body() {
        assert!(is_html(&None, "  <!DOCTYPE html><html></html>"));
        assert!(is_html(&None, "<html><body>x</body></html>"));
        assert!(!is_html(&None, "plain text"));
    }

    #[test]
    fn test_filter_excessive_newlines() {
        assert_eq!(filter_excessive_newlines("a\n\n\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn test_blank_input() {
        let dict = dictionary();
        assert_eq!(html_to_text_with(&dict, ""), "");
        assert_eq!(html_to_text_with(&dict, "  \n\t "), "");
    }

    #[test]
    fn test_strips_script_content() {
        let dict = dictionary();
        let out = html_to_text_with(
            &dict,
            "<html><body>before<script>danger()</script>after</body></html>",
        );
        assert!(!out.contains("danger"));
        assert!(!out.contains("<script"));
        assert!(out.contains("before"));
        assert!(out.contains("after"));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_title_and_skipped_chrome() {
        let dict = dictionary();
        let html = r#"<html><head><title> My Post </title><style>p{}</style></head>
            <body><header>Site</header><nav>Menu</nav>
            <p>First line.</p>
            <p>Second   line.</p>
            <footer>Copyright</footer></body></html>"#;
        let out = html_to_text_with(&dict, html);
        assert_eq!(out, "My Post\n\nFirst line. Second line.");
    }

    #[test]
    fn test_case_boundary_and_segmentation() {
        let dict = dictionary();
        let out = html_to_text_with(&dict, "<body><p>readMore and whatyou mean</p></body>");
        assert_eq!(out, "read More and what you mean");
    }

    #[test]
    fn test_keyword_filter_sees_whole_words() {
        let dict = Dictionary::embedded().unwrap();
        let text = html_to_text_with(
            &dict,
            "<body><p>Plans for the weekend</p>\n<p>A notebook and passwords</p></body>",
        );
        assert_eq!(text, "Plans for the weekend A notebook and passwords");

        let options = ContentOptions {
            filter_keywords: vec!["weekend".to_string(), "notebook".to_string()],
            ..Default::default()
        };
        let result = process(&text, &options);
        assert_ne!(result.content, NO_MATCH_SENTINEL);
        assert!(result.content.contains("weekend"));
        assert!(result.debug.unwrap().keyword_filtering_applied);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a\r\nb\rc\n\n\nd\te  "), "a b c d e");
    }

    #[tokio::test]
    async fn test_html_to_text_shared_dictionary() {
        let out = html_to_text("<html><body><p>Hello there</p></body></html>").await;
        assert_eq!(out, "Hello there");
    }
}
