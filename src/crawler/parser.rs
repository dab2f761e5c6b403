//! HTML extraction for crawled pages
//!
//! This module turns a fetched document into:
//! - The page title
//! - Normalized visible text (script and style content never included)
//! - In-scope links to feed back into the frontier
//!
//! It also scrapes hidden anti-forgery tokens out of login forms.
//!
//! Extraction is best-effort: malformed markup yields whatever the HTML parser
//! recovers (possibly an empty title and text), never an error.

use crate::url::CrawlScope;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose whole subtree is dropped before text extraction
const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Everything pulled out of one HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Text of the `<title>` element, trimmed; empty when there is none
    pub title: String,

    /// Visible text after normalization
    pub text: String,

    /// In-scope links in document order; duplicates are kept
    pub links: Vec<Url>,
}

/// Parses `html` fetched from `page_url` and extracts title, text and links
///
/// Links are resolved against `page_url` and kept only when `scope` accepts
/// them.
///
/// # Example
///
/// ```
/// use sitewalk::crawler::extract_page;
/// use sitewalk::url::CrawlScope;
///
/// let scope = CrawlScope::from_seed("https://example.com/").unwrap();
/// let html = r#"<html><head><title> Home </title></head>
/// <body><a href="/about#team">About</a><a href="https://other.com/">x</a></body></html>"#;
/// let page = extract_page(html, scope.seed(), &scope);
///
/// assert_eq!(page.title, "Home");
/// assert_eq!(page.links.len(), 1);
/// assert_eq!(page.links[0].as_str(), "https://example.com/about");
/// ```
pub fn extract_page(html: &str, page_url: &Url, scope: &CrawlScope) -> Extraction {
    let document = Html::parse_document(html);

    Extraction {
        title: extract_title(&document),
        text: normalize_text(&visible_text(&document)),
        links: extract_links(&document, page_url, scope),
    }
}

/// Extracts the trimmed page title, or an empty string
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Concatenates every text node that is not inside a skipped element
fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(fragment) => text.push_str(fragment),
            Node::Element(element) if SKIPPED_ELEMENTS.contains(&element.name()) => continue,
            _ => {}
        }

        // Push in reverse so children come off the stack in document order
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    text
}

/// Collapses whitespace artifacts in extracted text
///
/// Each line is trimmed, then split on double spaces, each phrase trimmed
/// again; empty phrases are dropped and the rest joined with newlines. Applying
/// this to its own output is a no-op.
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves every `<a href>` and keeps the ones inside the crawl scope
fn extract_links(document: &Html, page_url: &Url, scope: &CrawlScope) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| scope.filter_link(href, page_url))
        .collect()
}

/// Finds a hidden form token on a login page
///
/// `field_names` are tried in priority order. For each name the first
/// `<input>` carrying it is inspected; the first one with a non-empty `value`
/// wins.
///
/// # Returns
///
/// The matching field name and its value, or `None` if no candidate matched
pub fn find_hidden_token(html: &str, field_names: &[String]) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let input_selector = Selector::parse("input[name]").ok()?;

    field_names.iter().find_map(|wanted| {
        document
            .select(&input_selector)
            .find(|input| input.value().attr("name") == Some(wanted.as_str()))
            .and_then(|input| input.value().attr("value"))
            .filter(|value| !value.is_empty())
            .map(|value| (wanted.clone(), value.to_string()))
    })
}
