//! Numeric probing: request identifiers next to the known ones and keep the
//! ones that answer with a titled chapter page.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::chapter;
use crate::classify::NumberedId;
use crate::config::EngineConfig;
use crate::fetch::{Fetch, fetch_ok};
use crate::formats::{ChapterStub, DiscoveryMethod};

/// `[max(1, min - below), min(max + above, hard_cap)]`, or `None` when empty.
pub fn window(numbers: &[u64], config: &EngineConfig) -> Option<RangeInclusive<u64>> {
    let min = *numbers.iter().min()?;
    let max = *numbers.iter().max()?;
    let start = min.saturating_sub(config.probe_below).max(1);
    let end = max.saturating_add(config.probe_above).min(config.probe_hard_cap);
    (start <= end).then_some(start..=end)
}

/// Probe every unknown identifier inside the window of the dominant identifier shape.
pub fn sweep(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    book_id: &str,
    known: &HashSet<String>,
    probed: &mut HashSet<String>,
) -> Vec<ChapterStub> {
    let Some((shape, numbers)) = dominant_shape(known) else {
        return Vec::new();
    };
    let Some(range) = window(&numbers, config) else {
        return Vec::new();
    };
    tracing::debug!(
        start = *range.start(),
        end = *range.end(),
        prefix = %shape.prefix,
        "probing numeric window"
    );

    range
        .filter_map(|number| {
            let candidate = shape.with_number(number);
            probe_candidate(fetcher, config, book_id, &candidate, known, probed)
        })
        .collect()
}

/// Probe the gap between `anchor` and the next known identifier of the same shape.
pub fn probe_after(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    book_id: &str,
    anchor: &ChapterStub,
    known: &HashSet<String>,
    probed: &mut HashSet<String>,
) -> Vec<ChapterStub> {
    let Some(shape) = NumberedId::parse(&anchor.identifier) else {
        return Vec::new();
    };
    let next_known = known
        .iter()
        .filter_map(|id| NumberedId::parse(id))
        .filter(|id| id.same_shape(&shape) && id.number > shape.number)
        .map(|id| id.number)
        .min();
    let Some(start) = shape.number.checked_add(1) else {
        return Vec::new();
    };
    let end = match next_known {
        Some(next) => next - 1,
        None => shape.number.saturating_add(config.probe_above),
    }
    .min(config.probe_hard_cap);

    (start..=end)
        .filter_map(|number| {
            let candidate = shape.with_number(number);
            probe_candidate(fetcher, config, book_id, &candidate, known, probed)
        })
        .collect()
}

fn probe_candidate(
    fetcher: &dyn Fetch,
    config: &EngineConfig,
    book_id: &str,
    identifier: &str,
    known: &HashSet<String>,
    probed: &mut HashSet<String>,
) -> Option<ChapterStub> {
    if known.contains(identifier) || !probed.insert(identifier.to_owned()) {
        return None;
    }
    let url = config.chapter_url(book_id, identifier);
    let html = fetch_ok(fetcher, &url)?;
    let Some(title) = chapter::parse_chapter_title(&html) else {
        tracing::debug!(%url, "probe hit without a title");
        return None;
    };
    Some(ChapterStub::discovered(
        identifier,
        &title,
        &url,
        1,
        None,
        DiscoveryMethod::NumericProbe,
    ))
}

/// The identifier shape shared by the most known identifiers, with its numbers.
fn dominant_shape(known: &HashSet<String>) -> Option<(NumberedId, Vec<u64>)> {
    let mut ids: Vec<&String> = known.iter().collect();
    ids.sort();

    let mut groups: Vec<(NumberedId, Vec<u64>)> = Vec::new();
    for id in ids {
        let Some(parsed) = NumberedId::parse(id) else {
            continue;
        };
        match groups.iter_mut().find(|(shape, _)| shape.same_shape(&parsed)) {
            Some((_, numbers)) => numbers.push(parsed.number),
            None => {
                let number = parsed.number;
                groups.push((parsed, vec![number]));
            }
        }
    }

    // Ties go to the lexically first shape.
    let best = groups.iter().map(|(_, numbers)| numbers.len()).max()?;
    groups.into_iter().find(|(_, numbers)| numbers.len() == best)
}
