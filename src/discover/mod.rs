//! Discovery of chapters the rendered catalog leaves out.
//!
//! The [`Dispatcher`] owns the growing set of known identifiers for one book.
//! For every top-level visible stub it runs the methods selected by the
//! book's [`IdentifierPattern`] in priority order and stops at the first one
//! that yields something new. Methods never modify known stubs; anything
//! whose identifier is already known is dropped.

pub mod embedded;
pub mod endpoint;
pub mod numeric;
pub mod structural;

use std::collections::HashSet;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::fetch::Fetch;
use crate::formats::{ChapterStub, DiscoveryMethod, IdentifierPattern, PatternType, Strategy};

/// A stub found by a discovery method, plus where it sat in its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered {
    pub stub: ChapterStub,
    /// Identifier of the entry preceding this one in the payload it came from.
    pub after: Option<String>,
}

impl Discovered {
    pub fn new(stub: ChapterStub) -> Self {
        Self { stub, after: None }
    }
}

/// The closed set of discovery methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    StructuralWalk,
    NumericProbe,
    EmbeddedData,
    EndpointProbe,
}

/// Methods to try for one stub, in priority order.
pub fn plan(strategy: Strategy) -> &'static [Method] {
    use Method::*;
    match strategy {
        Strategy::StructuralWalk => &[StructuralWalk, EmbeddedData, EndpointProbe],
        Strategy::Hybrid => &[StructuralWalk, NumericProbe, EmbeddedData, EndpointProbe],
        Strategy::NumericProbe => &[NumericProbe, EmbeddedData, EndpointProbe],
        Strategy::EndpointProbe => &[EndpointProbe, EmbeddedData],
        Strategy::EmbeddedData | Strategy::Default => &[EmbeddedData, EndpointProbe],
    }
}

pub struct Dispatcher<'a> {
    fetcher: &'a dyn Fetch,
    config: &'a EngineConfig,
    book_id: String,
    pattern: IdentifierPattern,
    /// Tree-ordered catalog nodes from the book index fetch.
    catalog: Vec<ChapterStub>,
    known: HashSet<String>,
    /// Numeric candidates already requested, hit or miss.
    probed: HashSet<String>,
    embedded: Option<Vec<Discovered>>,
    endpoint: Option<Vec<Discovered>>,
    found: Vec<Discovered>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        fetcher: &'a dyn Fetch,
        config: &'a EngineConfig,
        book_id: &str,
        catalog: &[ChapterStub],
        pattern: IdentifierPattern,
    ) -> Self {
        Self {
            fetcher,
            config,
            book_id: book_id.to_owned(),
            pattern,
            catalog: catalog.to_vec(),
            known: catalog.iter().map(|s| s.identifier.clone()).collect(),
            probed: HashSet::new(),
            embedded: None,
            endpoint: None,
            found: Vec::new(),
        }
    }

    /// Global sweep (numeric books only), then one discovery pass per level-1 visible stub.
    pub fn run(mut self, visible: &[ChapterStub]) -> Vec<Discovered> {
        for stub in visible {
            self.known.insert(stub.identifier.clone());
        }

        if matches!(
            self.pattern.pattern_type,
            PatternType::SequentialNumeric | PatternType::SequentialAffixed
        ) {
            let swept = self.sweep();
            tracing::info!(book = %self.book_id, found = swept.len(), "numeric sweep finished");
        }

        for anchor in visible.iter().filter(|stub| stub.level == 1) {
            let found = self.discover(anchor);
            if !found.is_empty() {
                tracing::info!(
                    book = %self.book_id,
                    anchor = %anchor.identifier,
                    found = found.len(),
                    method = ?found[0].discovery_method,
                    "discovered hidden chapters"
                );
            }
        }

        self.found
    }

    /// Probe the whole numeric window for missing top-level stubs.
    pub fn sweep(&mut self) -> Vec<ChapterStub> {
        let candidates = numeric::sweep(
            self.fetcher,
            self.config,
            &self.book_id,
            &self.known,
            &mut self.probed,
        );
        self.accept(candidates.into_iter().map(Discovered::new).collect())
    }

    /// Search for the children of `anchor` with the methods the pattern selects.
    pub fn discover(&mut self, anchor: &ChapterStub) -> Vec<ChapterStub> {
        for &method in plan(self.pattern.recommended_strategy) {
            let candidates = self.run_method(method, anchor);
            let accepted = self.accept(candidates);
            tracing::debug!(
                anchor = %anchor.identifier,
                ?method,
                new = accepted.len(),
                "discovery method finished"
            );
            if !accepted.is_empty() {
                return accepted;
            }
        }
        Vec::new()
    }

    fn run_method(&mut self, method: Method, anchor: &ChapterStub) -> Vec<Discovered> {
        match method {
            Method::StructuralWalk => {
                let walked = structural::walk(&self.catalog, anchor);
                if walked.iter().any(|stub| !self.known.contains(&stub.identifier)) {
                    return walked.into_iter().map(Discovered::new).collect();
                }
                structural::walk_anchor_page(self.fetcher, self.config, anchor)
                    .into_iter()
                    .map(Discovered::new)
                    .collect()
            }
            Method::NumericProbe => numeric::probe_after(
                self.fetcher,
                self.config,
                &self.book_id,
                anchor,
                &self.known,
                &mut self.probed,
            )
            .into_iter()
            .map(Discovered::new)
            .collect(),
            Method::EmbeddedData => {
                if self.embedded.is_none() {
                    self.embedded =
                        Some(embedded::discover(self.fetcher, self.config, &self.book_id));
                }
                self.embedded.clone().unwrap_or_default()
            }
            Method::EndpointProbe => {
                if self.endpoint.is_none() {
                    self.endpoint =
                        Some(endpoint::discover(self.fetcher, self.config, &self.book_id));
                }
                self.endpoint.clone().unwrap_or_default()
            }
        }
    }

    /// Keep candidates with unseen identifiers; first seen wins.
    fn accept(&mut self, candidates: Vec<Discovered>) -> Vec<ChapterStub> {
        let mut accepted = Vec::new();
        for candidate in candidates {
            if !self.known.insert(candidate.stub.identifier.clone()) {
                continue;
            }
            accepted.push(candidate.stub.clone());
            self.found.push(candidate);
        }
        accepted
    }
}

const LIST_KEYS: &[&str] =
    &["chapterTree", "chapters", "chapterList", "contents", "catalog", "toc"];
const TITLE_KEYS: &[&str] = &["title", "name", "chapterName"];
const ID_KEYS: &[&str] = &["id", "chapterId", "key"];
const CHILDREN_KEYS: &[&str] = &["children", "subChapters", "items"];

/// Top-level payload entries are placed one level below the volumes.
const PAYLOAD_LEVEL: u32 = 2;

/// First array of chapter-like objects in `value`, searching list keys before
/// descending into other fields.
pub(crate) fn find_chapter_array(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => {
            if is_chapter_array(items) {
                return Some(items);
            }
            items.iter().find_map(find_chapter_array)
        }
        Value::Object(map) => {
            for key in LIST_KEYS {
                match map.get(*key) {
                    Some(Value::Array(items)) if is_chapter_array(items) => return Some(items),
                    _ => {}
                }
            }
            map.values().find_map(find_chapter_array)
        }
        _ => None,
    }
}

fn is_chapter_array(items: &[Value]) -> bool {
    items.iter().any(|item| entry_fields(item).is_some())
}

fn entry_fields(item: &Value) -> Option<(String, String)> {
    let object = item.as_object()?;
    let title = TITLE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|title| !title.is_empty())?;
    let identifier = ID_KEYS.iter().find_map(|key| match object.get(*key)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_owned()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })?;
    Some((identifier, title.to_owned()))
}

/// Flatten a payload chapter tree into stubs in pre-order.
pub(crate) fn stubs_from_entries(
    items: &[Value],
    config: &EngineConfig,
    book_id: &str,
    method: DiscoveryMethod,
) -> Vec<Discovered> {
    let mut out = Vec::new();
    flatten_entries(items, PAYLOAD_LEVEL, None, config, book_id, method, &mut out);
    out
}

fn flatten_entries(
    items: &[Value],
    level: u32,
    parent: Option<&str>,
    config: &EngineConfig,
    book_id: &str,
    method: DiscoveryMethod,
    out: &mut Vec<Discovered>,
) {
    for item in items {
        let Some((identifier, title)) = entry_fields(item) else {
            continue;
        };
        let url = item
            .get("url")
            .or_else(|| item.get("href"))
            .and_then(Value::as_str)
            .and_then(|href| config.resolve_href(href))
            .unwrap_or_else(|| config.chapter_url(book_id, &identifier));

        let stub = ChapterStub::discovered(
            &identifier,
            &title,
            &url,
            level,
            parent.map(str::to_owned),
            method,
        );
        let after = out.last().map(|prev: &Discovered| prev.stub.identifier.clone());
        out.push(Discovered { stub, after });

        for key in CHILDREN_KEYS {
            if let Some(Value::Array(children)) = item.get(*key) {
                let parent = Some(identifier.as_str());
                flatten_entries(children, level + 1, parent, config, book_id, method, out);
                break;
            }
        }
    }
}
