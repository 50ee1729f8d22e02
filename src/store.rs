use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::formats::{Book, BookChapter, ChapterRecord, IdentifierPattern};

const FORBIDDEN_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookRecord<'a> {
    identifier: &'a str,
    title: &'a str,
    pattern: &'a IdentifierPattern,
    chapters: usize,
    bodies: usize,
    needs_review: usize,
}

/// `text/{NN}_{title}.txt`, relative to the output directory.
pub fn text_file_name(chapter: &BookChapter) -> String {
    let title = chapter
        .body
        .as_ref()
        .map_or(chapter.stub.title.as_str(), |body| body.resolved_title.as_str());
    let safe: String = title
        .trim()
        .chars()
        .map(|ch| if FORBIDDEN_FILE_CHARS.contains(&ch) || ch.is_control() { '_' } else { ch })
        .collect();
    format!("text/{:02}_{safe}.txt", chapter.sequence)
}

/// Write `book.json`, `chapters.jsonl` and one text file per chapter body into a new directory.
pub fn write_book(book: &Book, out_dir: &Path) -> anyhow::Result<()> {
    if out_dir.exists() {
        anyhow::bail!("output directory already exists: {}", out_dir.display());
    }
    let text_dir = out_dir.join("text");
    std::fs::create_dir_all(&text_dir)
        .with_context(|| format!("create text dir: {}", text_dir.display()))?;

    let retrieved_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let chapters_path = out_dir.join("chapters.jsonl");
    let mut out = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&chapters_path)
        .with_context(|| format!("create chapter list: {}", chapters_path.display()))?;

    for chapter in &book.chapters {
        let text_path = match &chapter.body {
            Some(body) => {
                let relative = text_file_name(chapter);
                write_text(&out_dir.join(&relative), &body.raw_text)?;
                Some(relative)
            }
            None => None,
        };
        let record = chapter_record(chapter, text_path, &retrieved_at);
        serde_json::to_writer(&mut out, &record).context("serialize chapter record")?;
        out.write_all(b"\n").context("write chapter list newline")?;
    }
    out.flush().context("flush chapter list")?;

    let summary = BookRecord {
        identifier: &book.identifier,
        title: &book.title,
        pattern: &book.pattern,
        chapters: book.chapters.len(),
        bodies: book.chapters.iter().filter(|c| c.body.is_some()).count(),
        needs_review: book.chapters.iter().filter(|c| c.needs_review).count(),
    };
    let book_path = out_dir.join("book.json");
    let json = serde_json::to_string_pretty(&summary).context("serialize book summary")?;
    std::fs::write(&book_path, json)
        .with_context(|| format!("write book summary: {}", book_path.display()))?;

    tracing::info!(
        out = %out_dir.display(),
        chapters = summary.chapters,
        bodies = summary.bodies,
        "book written"
    );
    Ok(())
}

pub fn chapter_record(
    chapter: &BookChapter,
    text_path: Option<String>,
    retrieved_at: &str,
) -> ChapterRecord {
    let stub = &chapter.stub;
    ChapterRecord {
        sequence: chapter.sequence,
        identifier: stub.identifier.clone(),
        title: stub.title.clone(),
        resolved_title: chapter
            .body
            .as_ref()
            .map_or_else(|| stub.title.clone(), |body| body.resolved_title.clone()),
        url: stub.url.clone(),
        level: stub.level,
        parent_identifier: stub.parent_identifier.clone(),
        is_volume: stub.is_volume,
        is_chapter: stub.is_chapter,
        discovered: stub.discovered,
        discovery_method: stub.discovery_method,
        content_type: chapter.body.as_ref().map(|body| body.content_type),
        needs_review: chapter.needs_review,
        text_path,
        retrieved_at: retrieved_at.to_owned(),
    }
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("chapter text already exists: {}", path.display());
    }
    std::fs::write(path, text).with_context(|| format!("write chapter text: {}", path.display()))
}
