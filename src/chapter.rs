use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::catalog::collapse_whitespace;

const TITLE_SELECTORS: &[&str] =
    &["h1.chapter-title", ".chapter-title", "h1", ".title", ".chapter-name"];

const CONTENT_SELECTORS: &[&str] = &[
    "main.read-layout-main article.chapter-reader",
    "article",
    "main",
    ".chapter-content",
    ".book-content",
    ".text-content",
    ".content",
];

const CONTENT_KEYS: &[&str] = &["content", "text", "body", "html"];

/// JSON strings at or below this length are labels, not content.
const MIN_JSON_TEXT_CHARS: usize = 20;

static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("valid selector"));

static DOCUMENT_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// ` - Site`, `| Site`: a separator with spaces on both sides, then a last segment.
static SITE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—|]\s+[^-–—|]*$").expect("valid regex"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Title of a chapter page, or `None` when the page has no resolvable title.
pub fn parse_chapter_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_text(&document, TITLE_SELECTORS).or_else(|| document_title(&document))
}

/// Book title from the index page.
pub fn parse_book_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_text(&document, &["h1"]).or_else(|| document_title(&document))
}

/// Body text of a chapter page: heading and paragraph blocks of the first
/// non-empty content container, one per line.
pub fn parse_chapter_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let Some(container) = document.select(&selector).next() else {
            continue;
        };

        let mut lines: Vec<String> = container
            .select(&BLOCKS)
            .filter(|block| !inside_chrome(block))
            .map(|block| collapse_whitespace(&block.text().collect::<String>()))
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            lines = container
                .text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }
    }

    None
}

/// Collect content-bearing string fields from a JSON payload.
pub fn extract_text_from_json(value: &Value) -> Option<String> {
    let mut parts = Vec::new();
    collect_content(value, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn collect_content(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::String(text) if CONTENT_KEYS.contains(&key.as_str()) => {
                        let text = text.trim();
                        if text.chars().count() <= MIN_JSON_TEXT_CHARS {
                            continue;
                        }
                        let clean = HTML_TAG.replace_all(text, "");
                        let clean = clean.trim();
                        if !clean.is_empty() {
                            parts.push(clean.to_owned());
                        }
                    }
                    other => collect_content(other, parts),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_content(item, parts);
            }
        }
        _ => {}
    }
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    })
}

fn document_title(document: &Html) -> Option<String> {
    let raw = document.select(&DOCUMENT_TITLE).next()?.text().collect::<String>();
    let title = collapse_whitespace(&raw);
    let stripped = SITE_SUFFIX.replace(&title, "").trim().to_owned();
    let title = if stripped.is_empty() { title } else { stripped };
    (!title.is_empty()).then_some(title)
}

fn inside_chrome(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| matches!(el.name(), "nav" | "header" | "footer"))
    })
}
