//! Catalog tree parsing.
//!
//! Turns a book's catalog markup into a flat, document-ordered list of
//! [`ChapterStub`]s annotated with their tree level. Nodes are recognised by
//! class token, their depth by an explicit `level-N` class token or, failing
//! that, by `padding-left` indentation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::EngineConfig;
use crate::formats::ChapterStub;

/// Labels shorter than this (in chars) are not chapters.
const MIN_LABEL_CHARS: usize = 3;

/// Lines at least this long are body text, never a sub-chapter heading.
pub const MARKER_LINE_MAX_CHARS: usize = 30;

const CATALOG_CONTAINERS: &[&str] = &[
    ".reader-catalog-tree",
    ".semi-tree-option-list",
    ".catalog-tree",
    ".chapter-list",
    ".toc",
];

const NODE_CLASSES: &[&str] = &["tree-option", "semi-tree-option", "chapter-item", "catalog-item"];

static VOLUME_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)卷之\w+|第\w+卷|卷\w+|\b(?:volume|vol\.|juan)\s*\w+").expect("valid regex")
});

static CHAPTER_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)第\w+章|章\w+|\w+篇|\w+品|\b(?:chapter|part|section)\s+\w+")
        .expect("valid regex")
});

static LEVEL_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"level-(\d+)$").expect("valid regex"));

static PADDING_LEFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"padding-left:\s*(\d+)px").expect("valid regex"));

static CHAPTER_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/chapter/([^/?#]+)").expect("valid regex"));

static NODE_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, li").expect("valid selector"));

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

pub fn is_volume_title(title: &str) -> bool {
    VOLUME_TITLE.is_match(title)
}

pub fn is_chapter_title(title: &str) -> bool {
    CHAPTER_TITLE.is_match(title)
}

/// A short body line shaped like a sub-chapter heading (e.g. `开度品第一`, `Part Two`).
pub fn is_marker_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().count() < MARKER_LINE_MAX_CHARS && is_chapter_title(line)
}

pub fn chapter_id_from_href(href: &str) -> Option<String> {
    CHAPTER_HREF
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Parse the catalog tree. Returns an empty list when no catalog container exists.
pub fn parse_catalog(html: &str, config: &EngineConfig) -> Vec<ChapterStub> {
    let document = Html::parse_document(html);
    let Some(container) = find_container(&document) else {
        return Vec::new();
    };

    let mut stubs = Vec::new();
    let mut seen = HashSet::new();
    let mut ancestry: Vec<(u32, String)> = Vec::new();

    for item in container.select(&NODE_CANDIDATES) {
        if item.id() == container.id() || !is_tree_node(&item) {
            continue;
        }
        let Some((identifier, title, url)) = node_link(&item, config) else {
            continue;
        };
        if !seen.insert(identifier.clone()) {
            continue;
        }

        let level = node_level(&item, config.indent_unit_px);
        while ancestry.last().is_some_and(|(l, _)| *l >= level) {
            ancestry.pop();
        }

        let mut stub = ChapterStub::visible(&identifier, &title, &url, level);
        stub.parent_identifier = ancestry.last().map(|(_, id)| id.clone());
        ancestry.push((level, identifier));
        stubs.push(stub);
    }

    stubs
}

/// Degraded extraction: every chapter-shaped link on the page becomes a level-1 stub.
pub fn parse_flat(html: &str, config: &EngineConfig) -> Vec<ChapterStub> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut stubs = Vec::new();

    for link in document.select(&LINK) {
        let Some((identifier, title, url)) = link_parts(&link, config) else {
            continue;
        };
        if seen.insert(identifier.clone()) {
            stubs.push(ChapterStub::visible(&identifier, &title, &url, 1));
        }
    }

    stubs
}

/// [`parse_catalog`], falling back to [`parse_flat`] when the tree is missing or empty.
pub fn parse_catalog_or_flat(html: &str, config: &EngineConfig) -> Vec<ChapterStub> {
    let stubs = parse_catalog(html, config);
    if !stubs.is_empty() {
        return stubs;
    }

    let flat = parse_flat(html, config);
    tracing::warn!(
        stubs = flat.len(),
        "catalog tree not found; using flat chapter-link extraction"
    );
    flat
}

fn find_container(document: &Html) -> Option<ElementRef<'_>> {
    CATALOG_CONTAINERS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next()
    })
}

fn is_tree_node(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| NODE_CLASSES.contains(&class))
}

fn node_link(item: &ElementRef<'_>, config: &EngineConfig) -> Option<(String, String, String)> {
    let link = item.select(&LINK).next()?;
    link_parts(&link, config)
}

fn link_parts(link: &ElementRef<'_>, config: &EngineConfig) -> Option<(String, String, String)> {
    let href = link.value().attr("href")?;
    let identifier = chapter_id_from_href(href)?;
    let title = collapse_whitespace(&link.text().collect::<String>());
    if title.chars().count() < MIN_LABEL_CHARS {
        return None;
    }
    let url = config.resolve_href(href)?;
    Some((identifier, title, url))
}

/// Explicit `level-N` class token, then indentation, then 1.
fn node_level(item: &ElementRef<'_>, indent_unit_px: u32) -> u32 {
    let marked = item.value().classes().find_map(|class| {
        LEVEL_CLASS
            .captures(class)
            .and_then(|caps| caps[1].parse::<u32>().ok())
    });
    if let Some(level) = marked {
        return level.max(1);
    }

    let indented = item
        .value()
        .attr("style")
        .and_then(|style| PADDING_LEFT.captures(style))
        .and_then(|caps| caps[1].parse::<u32>().ok());
    match indented {
        Some(padding) => padding / indent_unit_px.max(1) + 1,
        None => 1,
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
