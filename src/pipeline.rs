//! One book end to end: catalog, classification, discovery, merge, bodies.

use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::config::EngineConfig;
use crate::discover::Dispatcher;
use crate::fetch::{Fetch, fetch_ok};
use crate::formats::{Book, ChapterBody, ChapterStub, ContentType};
use crate::{catalog, chapter, classify, dedup, merge, title};

static BOOK_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/book/([^/?#]+)").expect("valid regex"));

/// A book given by id or by any URL under `/book/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRef {
    pub identifier: String,
    /// Origin of the URL form, when one was given.
    pub origin: Option<String>,
}

impl BookRef {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        if input.starts_with("http://") || input.starts_with("https://") {
            let url = url::Url::parse(input).with_context(|| format!("parse book url: {input}"))?;
            let Some(caps) = BOOK_PATH.captures(url.path()) else {
                anyhow::bail!("book url must contain /book/<id>: {input}");
            };
            return Ok(Self {
                identifier: caps[1].to_owned(),
                origin: Some(url.origin().ascii_serialization()),
            });
        }

        if input.is_empty() || input.contains(['/', '?', '#']) {
            anyhow::bail!("invalid book id: {input:?}");
        }
        Ok(Self {
            identifier: input.to_owned(),
            origin: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub fetch_bodies: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { fetch_bodies: true }
    }
}

/// Build the merged chapter list for `book_id`.
///
/// Never fails: an unreachable index page gives a book without chapters, and
/// unreachable chapters simply have no body.
pub fn build_book(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    book_id: &str,
    options: PipelineOptions,
) -> Book {
    let index_url = config.book_url(book_id);
    let index = fetch_ok(fetcher, &index_url).unwrap_or_else(|| {
        tracing::warn!(url = %index_url, "book index unavailable");
        String::new()
    });

    let book_title = chapter::parse_book_title(&index).unwrap_or_else(|| book_id.to_owned());
    let visible = catalog::parse_catalog_or_flat(&index, config);
    let pattern = classify::classify(visible.iter().map(|stub| stub.identifier.as_str()));
    tracing::info!(
        book = %book_id,
        title = %book_title,
        visible = visible.len(),
        pattern = ?pattern.pattern_type,
        confidence = pattern.confidence,
        strategy = ?pattern.recommended_strategy,
        "catalog parsed"
    );

    let discovered =
        Dispatcher::new(fetcher, config, book_id, &visible, pattern.clone()).run(&visible);
    let mut chapters = merge::merge(visible, discovered);
    tracing::info!(
        book = %book_id,
        chapters = chapters.len(),
        discovered = chapters.iter().filter(|c| c.stub.discovered).count(),
        "chapters merged"
    );

    if options.fetch_bodies {
        for entry in &mut chapters {
            entry.body = fetch_body(fetcher, config, book_id, &entry.stub)
                .and_then(|raw_text| resolve_body(config, &entry.stub, raw_text, &book_title));
        }
    }

    Book {
        identifier: book_id.to_owned(),
        title: book_title,
        pattern,
        chapters,
    }
}

/// Chapter page text, else the chapter content API.
pub fn fetch_body(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    book_id: &str,
    stub: &ChapterStub,
) -> Option<String> {
    if let Some(text) =
        fetch_ok(fetcher, &stub.url).and_then(|html| chapter::parse_chapter_text(&html))
    {
        return Some(text);
    }

    let api_url = config.chapter_api_url(book_id, &stub.identifier);
    let text = fetch_ok(fetcher, &api_url)
        .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
        .and_then(|value| chapter::extract_text_from_json(&value));
    if text.is_none() {
        tracing::warn!(chapter_id = %stub.identifier, url = %stub.url, "no body text");
    }
    text
}

fn resolve_body(
    config: &EngineConfig,
    stub: &ChapterStub,
    raw_text: String,
    book_title: &str,
) -> Option<ChapterBody> {
    let body = ChapterBody {
        raw_text,
        resolved_title: stub.title.clone(),
        content_type: ContentType::Full,
    };
    let mut body = dedup::resolve(stub, body, book_title, config.min_volume_summary_chars)?;
    body.resolved_title = title::resolve_title(&body.raw_text, &stub.title, book_title);
    Some(body)
}
