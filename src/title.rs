//! Pick a display title from the top of a chapter body.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::is_marker_line;

/// Only the first lines can hold the heading.
const SCAN_LINES: usize = 10;

const KEYWORD_LINE_MAX_CHARS: usize = 50;

static STRUCTURAL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[品章卷篇]|\b(?:volume|chapter|part)\b").expect("valid regex")
});

/// A short marker line, else a short line with a structural keyword that is
/// not the book's running header, else `catalog_title` verbatim.
pub fn resolve_title(raw_text: &str, catalog_title: &str, book_title: &str) -> String {
    let book_title = book_title.trim();
    let mentions_book = |line: &str| !book_title.is_empty() && line.contains(book_title);

    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(SCAN_LINES)
        .collect();

    for line in lines.iter().copied().filter(|&line| is_marker_line(line)) {
        if !mentions_book(line) {
            return line.to_owned();
        }
        // A header that is only the book title says nothing about the chapter.
        let stripped = line.replace(book_title, "");
        let stripped = stripped.trim();
        if !stripped.is_empty() {
            return stripped.to_owned();
        }
    }

    lines
        .into_iter()
        .find(|&line| {
            line.chars().count() < KEYWORD_LINE_MAX_CHARS
                && has_structural_keyword(line)
                && !mentions_book(line)
        })
        .map_or_else(|| catalog_title.to_owned(), str::to_owned)
}

fn has_structural_keyword(line: &str) -> bool {
    STRUCTURAL_KEYWORD.is_match(line)
}
