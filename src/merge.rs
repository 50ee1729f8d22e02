//! Merge visible and discovered stubs into one ordered, numbered chapter list.

use std::collections::HashSet;

use crate::classify::NumberedId;
use crate::discover::Discovered;
use crate::formats::{BookChapter, ChapterStub, DiscoveryMethod};

struct Slot {
    stub: ChapterStub,
    needs_review: bool,
}

/// Visible stubs keep catalog order; discovered stubs are placed per discovery method.
/// The result carries dense 1-based sequence numbers and no bodies.
pub fn merge(visible: Vec<ChapterStub>, discovered: Vec<Discovered>) -> Vec<BookChapter> {
    let mut seen = HashSet::new();
    let mut slots: Vec<Slot> = visible
        .into_iter()
        .filter(|stub| seen.insert(stub.identifier.clone()))
        .map(|stub| Slot {
            stub,
            needs_review: false,
        })
        .collect();

    let mut walked = Vec::new();
    let mut probed = Vec::new();
    let mut payload = Vec::new();
    for found in discovered {
        if !seen.insert(found.stub.identifier.clone()) {
            continue;
        }
        match found.stub.discovery_method {
            DiscoveryMethod::StructuralWalk => walked.push(found.stub),
            DiscoveryMethod::NumericProbe => probed.push(found.stub),
            _ => payload.push(found),
        }
    }
    probed.sort_by_key(|stub| {
        NumberedId::parse(&stub.identifier).map_or(u64::MAX, |id| id.number)
    });

    for stub in walked {
        place_under_parent(&mut slots, stub);
    }
    for stub in probed {
        place_numeric(&mut slots, stub);
    }
    for found in payload {
        place_payload(&mut slots, found);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| BookChapter {
            sequence: index + 1,
            stub: slot.stub,
            body: None,
            needs_review: slot.needs_review,
        })
        .collect()
}

fn position(slots: &[Slot], identifier: &str) -> Option<usize> {
    slots.iter().position(|slot| slot.stub.identifier == identifier)
}

/// Index just past the subtree rooted at `index`.
fn subtree_end(slots: &[Slot], index: usize) -> usize {
    let level = slots[index].stub.level;
    let mut end = index + 1;
    while end < slots.len() && slots[end].stub.level > level {
        end += 1;
    }
    end
}

fn place_under_parent(slots: &mut Vec<Slot>, mut stub: ChapterStub) {
    let parent = stub.parent_identifier.as_deref().and_then(|id| position(slots, id));
    let at = match parent {
        Some(parent) => {
            stub.level = slots[parent].stub.level + 1;
            subtree_end(slots, parent)
        }
        None => slots.len(),
    };
    slots.insert(
        at,
        Slot {
            stub,
            needs_review: false,
        },
    );
}

/// Before the nearest numeric successor of the same shape, else after the predecessor.
fn place_numeric(slots: &mut Vec<Slot>, mut stub: ChapterStub) {
    let Some(id) = NumberedId::parse(&stub.identifier) else {
        slots.push(Slot {
            stub,
            needs_review: false,
        });
        return;
    };

    let mut predecessor: Option<(usize, u64)> = None;
    let mut successor: Option<(usize, u64)> = None;
    for (index, slot) in slots.iter().enumerate() {
        let Some(other) = NumberedId::parse(&slot.stub.identifier) else {
            continue;
        };
        if !other.same_shape(&id) {
            continue;
        }
        if other.number < id.number && predecessor.is_none_or(|(_, n)| other.number > n) {
            predecessor = Some((index, other.number));
        }
        if other.number > id.number && successor.is_none_or(|(_, n)| other.number < n) {
            successor = Some((index, other.number));
        }
    }

    let at = match predecessor {
        Some((pred, _)) => {
            let pred_stub = &slots[pred].stub;
            if pred_stub.is_volume && stub.is_chapter && !stub.is_volume {
                stub.level = pred_stub.level + 1;
                stub.parent_identifier = Some(pred_stub.identifier.clone());
                // A higher-numbered child already inside the volume stays after it.
                let end = subtree_end(slots, pred);
                successor
                    .map(|(succ, _)| succ)
                    .filter(|&succ| succ > pred && succ < end)
                    .unwrap_or(end)
            } else {
                stub.level = pred_stub.level;
                stub.parent_identifier = pred_stub.parent_identifier.clone();
                successor.map_or_else(|| subtree_end(slots, pred), |(succ, _)| succ)
            }
        }
        None => successor.map_or(slots.len(), |(succ, _)| succ),
    };
    slots.insert(
        at,
        Slot {
            stub,
            needs_review: false,
        },
    );
}

/// Payload entries with a known parent nest under it. The rest follow their
/// payload predecessor and are assigned to the nearest preceding level-1 stub,
/// flagged for review.
fn place_payload(slots: &mut Vec<Slot>, found: Discovered) {
    let Discovered { mut stub, after } = found;
    if stub
        .parent_identifier
        .as_deref()
        .is_some_and(|id| position(slots, id).is_some())
    {
        place_under_parent(slots, stub);
        return;
    }

    let at = after
        .as_deref()
        .and_then(|id| position(slots, id))
        .map_or(slots.len(), |index| subtree_end(slots, index));
    let volume = slots[..at]
        .iter()
        .rev()
        .find(|slot| slot.stub.level == 1)
        .map(|slot| slot.stub.identifier.clone());

    stub.level = if volume.is_some() { 2 } else { 1 };
    stub.parent_identifier = volume;
    tracing::warn!(
        identifier = %stub.identifier,
        parent = stub.parent_identifier.as_deref().unwrap_or("-"),
        method = ?stub.discovery_method,
        "parent assigned by position; needs review"
    );
    slots.insert(
        at,
        Slot {
            stub,
            needs_review: true,
        },
    );
}
