//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Link targets from `<a>` and `<area>` tags, unresolved, in document order
//! - Page title
//! - Decoded text and attribute values for pattern-based discovery
//! - Visible text for text-only content matching

use scraper::{ElementRef, Html, Node, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw `href` values of anchor and area tags, in document order
    pub links: Vec<String>,

    /// Entity-decoded text runs, comments and attribute values, one per line
    pub text: String,
}

/// Parses HTML content and extracts links and metadata
///
/// Malformed markup still yields whatever the tree builder recovered. The
/// only hard failure is a body that is not text at all.
///
/// # Arguments
///
/// * `body` - The raw response body
///
/// # Returns
///
/// * `Ok(ParsedPage)` - Successfully parsed page
/// * `Err(String)` - The body is binary content
///
/// # Example
///
/// ```
/// use torcrawl::crawler::parse_html;
///
/// let html = br#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html).unwrap();
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, ["/page"]);
/// ```
pub fn parse_html(body: &[u8]) -> Result<ParsedPage, String> {
    if body.contains(&0) {
        return Err("body contains binary data".to_string());
    }

    let source = String::from_utf8_lossy(body);
    let document = Html::parse_document(&source);

    // Extract title
    let title = extract_title(&document);

    // Extract links
    let links = extract_links(&document);

    let text = decoded_text(&document);

    Ok(ParsedPage { title, links, text })
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects `href` targets of `<a>` and `<area>` tags
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Joins every text node, comment and attribute value of the document
///
/// Entities are already decoded by the tree builder, so `&amp;` inside an
/// attribute reads as `&`.
fn decoded_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Text(text) => parts.push(text),
            Node::Comment(comment) => parts.push(comment),
            Node::Element(element) => parts.extend(element.attrs().map(|(_, value)| value)),
            _ => {}
        }
    }

    parts.join("\n")
}

/// Returns the visible text of an HTML document
///
/// Text inside `script`, `style`, `noscript` and `template` is dropped and
/// the remaining text runs are joined with single spaces.
///
/// # Example
///
/// ```
/// use torcrawl::crawler::page_text;
///
/// let html = "<html><head><style>p {}</style></head><body><p>Hello</p> <p>World</p></body></html>";
/// assert_eq!(page_text(html), "Hello World");
/// ```
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts.join(" ")
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template"
    ) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            _ => {}
        }
    }
}
