//! Volume pages often render the volume's own preamble followed by the full
//! text of its children. Persisting that as-is would store each child twice,
//! so volume bodies are cut down to their preamble or dropped.

use crate::catalog::is_marker_line;
use crate::formats::{ChapterBody, ChapterStub, ContentType};

/// Apply the volume rule to a fetched body.
///
/// Returns the body unchanged for anything but a level-1 volume, or when the
/// text has no sub-chapter marker. Returns `None` when the preamble before the
/// first marker is shorter than `min_summary_chars`; the stub itself is kept by
/// the caller.
pub fn resolve(
    stub: &ChapterStub,
    body: ChapterBody,
    book_title: &str,
    min_summary_chars: usize,
) -> Option<ChapterBody> {
    if !(stub.is_volume && stub.level == 1) {
        return Some(body);
    }

    let Some(summary) = volume_summary(&body.raw_text, &stub.title, book_title) else {
        return Some(body);
    };

    let chars = summary.chars().count();
    if chars < min_summary_chars {
        tracing::info!(
            identifier = %stub.identifier,
            summary_chars = chars,
            "volume page repeats its children; dropping body"
        );
        return None;
    }

    Some(ChapterBody {
        raw_text: summary,
        content_type: ContentType::VolumeSummary,
        ..body
    })
}

/// Lines from the volume's title line (or the top) up to the first marker line.
/// `None` when no marker follows.
///
/// The book's running header is not a marker even when its title is shaped
/// like one (`度人上品妙经`); only what is left after removing it counts.
pub fn volume_summary(raw_text: &str, volume_title: &str, book_title: &str) -> Option<String> {
    let title = volume_title.trim();
    let book_title = book_title.trim();
    let is_title_line = |line: &str| !title.is_empty() && line.contains(title);
    let is_marker = |line: &str| {
        if book_title.is_empty() || !line.contains(book_title) {
            return is_marker_line(line);
        }
        is_marker_line(&line.replace(book_title, ""))
    };

    let lines: Vec<&str> = raw_text.lines().collect();
    let start = lines.iter().position(|&line| is_title_line(line)).unwrap_or(0);
    let marker = lines[start..]
        .iter()
        .position(|&line| !is_title_line(line) && is_marker(line))?
        + start;

    Some(lines[start..marker].join("\n").trim().to_owned())
}
