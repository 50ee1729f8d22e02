//! Chapter lists embedded as data in the book page's inline scripts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{Discovered, find_chapter_array, stubs_from_entries};
use crate::config::EngineConfig;
use crate::fetch::{Fetch, fetch_ok};
use crate::formats::DiscoveryMethod;

static INLINE_SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script:not([src])").expect("valid selector"));

static LIST_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\b(?:chapterTree|chapters|chapterList|contents|catalog|toc)\b["']?\s*[:=]\s*\["#)
        .expect("valid regex")
});

/// Re-fetch the book page and scan its scripts.
pub fn discover(fetcher: &dyn Fetch, config: &EngineConfig, book_id: &str) -> Vec<Discovered> {
    let url = config.book_url(book_id);
    let Some(html) = fetch_ok(fetcher, &url) else {
        return Vec::new();
    };
    extract(&html, config, book_id)
}

/// First chapter array assigned to a known key in an inline script.
pub fn extract(html: &str, config: &EngineConfig, book_id: &str) -> Vec<Discovered> {
    let document = Html::parse_document(html);
    for script in document.select(&INLINE_SCRIPT) {
        let source = script.text().collect::<String>();
        for found in LIST_ASSIGNMENT.find_iter(&source) {
            let open = found.end() - 1;
            let Some(literal) = balanced_array(&source[open..]) else {
                continue;
            };
            let value: serde_json::Value = match serde_json::from_str(literal) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(%err, "embedded list is not json");
                    continue;
                }
            };
            let Some(items) = find_chapter_array(&value) else {
                continue;
            };
            let stubs = stubs_from_entries(items, config, book_id, DiscoveryMethod::EmbeddedData);
            if !stubs.is_empty() {
                return stubs;
            }
        }
    }
    Vec::new()
}

/// The prefix of `source` (which starts at `[`) up to its matching `]`.
/// Brackets inside string literals do not count.
fn balanced_array(source: &str) -> Option<&str> {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in source.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&source[..offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MapFetcher;

    fn config() -> EngineConfig {
        EngineConfig {
            base_url: "http://site.test".to_owned(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn balanced_array_ignores_brackets_in_strings() {
        let source = r#"[{"title": "a ] b", "x": [1, 2]}, "q\"]"] trailing"#;
        assert_eq!(
            balanced_array(source),
            Some(r#"[{"title": "a ] b", "x": [1, 2]}, "q\"]"]"#)
        );
        assert_eq!(balanced_array("[1, 2"), None);
    }

    #[test]
    fn finds_chapter_list_in_inline_script() {
        let html = r#"<html><head>
<script src="/static/app.js"></script>
<script>var config = {"theme": "dark"};</script>
<script>window.__DATA__ = {"book": {"chapterList": [
  {"id": "c1", "title": "内篇逍遥游"},
  {"id": "c2", "title": "内篇齐物论", "children": [{"id": 21, "name": "其一"}]}
]}};</script>
</head><body></body></html>"#;

        let found = extract(html, &config(), "B");
        let ids: Vec<&str> = found.iter().map(|d| d.stub.identifier.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "21"]);
        assert!(found.iter().all(|d| d.stub.discovery_method == DiscoveryMethod::EmbeddedData));
        assert_eq!(found[2].stub.parent_identifier.as_deref(), Some("c2"));
    }

    #[test]
    fn skips_lists_that_are_not_json_or_not_chapters() {
        let html = r#"<html><head><script>
var toc = [{id: 'x1', title: 'unquoted'}];
var catalog = [1, 2, 3];
</script></head><body></body></html>"#;
        assert!(extract(html, &config(), "B").is_empty());
    }

    #[test]
    fn discover_refetches_the_book_page() {
        let site = MapFetcher::new().with(
            "http://site.test/book/B",
            r#"<script>self.state = {"chapters":[{"chapterId":"k9","chapterName":"外篇刻意"}]}</script>"#,
        );
        let found = discover(&site, &config(), "B");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stub.url, "http://site.test/book/B/chapter/k9");
        assert_eq!(found[0].stub.level, 2);
    }
}
