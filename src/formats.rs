use serde::{Deserialize, Serialize};

/// How a stub entered the book. `None` means it was rendered in the visible catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    None,
    NumericProbe,
    StructuralWalk,
    EmbeddedData,
    EndpointProbe,
}

/// A catalog entry before its body is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterStub {
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub level: u32,
    pub is_volume: bool,
    pub is_chapter: bool,
    pub parent_identifier: Option<String>,
    pub discovered: bool,
    pub discovery_method: DiscoveryMethod,
}

impl ChapterStub {
    /// A stub rendered in the visible catalog.
    pub fn visible(identifier: &str, title: &str, url: &str, level: u32) -> Self {
        Self {
            identifier: identifier.to_owned(),
            title: title.to_owned(),
            url: url.to_owned(),
            level: level.max(1),
            is_volume: crate::catalog::is_volume_title(title),
            is_chapter: crate::catalog::is_chapter_title(title),
            parent_identifier: None,
            discovered: false,
            discovery_method: DiscoveryMethod::None,
        }
    }

    /// A stub found by one of the discovery methods.
    pub fn discovered(
        identifier: &str,
        title: &str,
        url: &str,
        level: u32,
        parent_identifier: Option<String>,
        method: DiscoveryMethod,
    ) -> Self {
        Self {
            parent_identifier,
            discovered: true,
            discovery_method: method,
            ..Self::visible(identifier, title, url, level)
        }
    }

    /// The identifier as an integer when it is purely numeric.
    pub fn numeric_identifier(&self) -> Option<u64> {
        if self.identifier.is_empty() || !self.identifier.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.identifier.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Full,
    VolumeSummary,
}

/// Fetched content for a stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterBody {
    pub raw_text: String,
    pub resolved_title: String,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    SequentialNumeric,
    SequentialAffixed,
    RandomString,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NumericProbe,
    StructuralWalk,
    EmbeddedData,
    EndpointProbe,
    Hybrid,
    Default,
}

/// Classification of a book's identifier set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierPattern {
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub recommended_strategy: Strategy,
}

/// One entry of the final chapter list.
#[derive(Debug, Clone, PartialEq)]
pub struct BookChapter {
    /// Dense 1-based ordinal; this, not the identifier, is the external chapter number.
    pub sequence: usize,
    pub stub: ChapterStub,
    pub body: Option<ChapterBody>,
    /// Parent was assigned by the containment heuristic rather than observed.
    pub needs_review: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub identifier: String,
    pub title: String,
    pub pattern: IdentifierPattern,
    pub chapters: Vec<BookChapter>,
}

/// A line of `chapters.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub sequence: usize,
    pub identifier: String,
    pub title: String,
    pub resolved_title: String,
    pub url: String,
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_identifier: Option<String>,
    pub is_volume: bool,
    pub is_chapter: bool,
    pub discovered: bool,
    pub discovery_method: DiscoveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    pub needs_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_path: Option<String>,
    pub retrieved_at: String,
}
