//! Sibling walk: deeper nodes that follow an anchor in catalog order are its children.

use crate::catalog;
use crate::config::EngineConfig;
use crate::fetch::{Fetch, fetch_ok};
use crate::formats::{ChapterStub, DiscoveryMethod};

/// Collect the nodes after `anchor` that sit deeper than it, up to the next
/// node at the anchor's depth or shallower.
///
/// Levels are rebased onto `anchor.level`, so the result never contains a
/// stub at or above the anchor's level.
pub fn walk(nodes: &[ChapterStub], anchor: &ChapterStub) -> Vec<ChapterStub> {
    let Some(position) = locate(nodes, anchor) else {
        return Vec::new();
    };
    let base = nodes[position].level;

    let mut collected: Vec<ChapterStub> = Vec::new();
    for node in &nodes[position + 1..] {
        if node.level <= base {
            break;
        }
        let level = anchor.level + (node.level - base);
        let parent = collected
            .iter()
            .rev()
            .find(|prev| prev.level < level)
            .map(|prev| prev.identifier.clone())
            .unwrap_or_else(|| anchor.identifier.clone());
        collected.push(ChapterStub::discovered(
            &node.identifier,
            &node.title,
            &node.url,
            level,
            Some(parent),
            DiscoveryMethod::StructuralWalk,
        ));
    }
    collected
}

/// Fetch the anchor's own chapter page and walk the catalog rendered there.
pub fn walk_anchor_page(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    anchor: &ChapterStub,
) -> Vec<ChapterStub> {
    let Some(html) = fetch_ok(fetcher, &anchor.url) else {
        return Vec::new();
    };
    walk(&catalog::parse_catalog(&html, config), anchor)
}

/// Exact identifier first, then a node whose link target mentions it.
fn locate(nodes: &[ChapterStub], anchor: &ChapterStub) -> Option<usize> {
    nodes
        .iter()
        .position(|node| node.identifier == anchor.identifier)
        .or_else(|| {
            nodes
                .iter()
                .position(|node| node.url.contains(&anchor.identifier))
        })
}
