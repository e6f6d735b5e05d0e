//! Content-engine trait definitions and wire types
//!
//! The engine that actually stores and serves Bible text is an external
//! component; this module pins down the surface Lectern consumes:
//! - `ContentEngine`: the six query/ingest operations
//! - `EngineConnector`: builds a local engine handle from a database file
//!
//! Both traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::v11n::V11nRule;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// A full-chapter range request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Version identifier, e.g. "ESV"
    pub version_uid: String,
    /// OSIS book id, e.g. "Gen"
    pub book_osis_id: String,
    /// 1-based chapter number in the version's own numbering
    pub chapter_num: u32,
}

/// One phrase of Bible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub content: String,
    /// Strong's codes attached to this phrase, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strongs: Vec<String>,
}

/// A node in a chapter's content tree.
///
/// The engine boundary is explicitly tagged: a node is either a section
/// wrapping further nodes, or a bare phrase. Callers of
/// [`Database::get_chapter`](crate::Database::get_chapter) only ever see
/// sections at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    Section {
        title: String,
        contents: Vec<ContentNode>,
    },
    Phrase(Phrase),
}

impl ContentNode {
    /// Wrap a phrase-level content list in one synthetic untitled section.
    pub fn synthetic_section(contents: Vec<ContentNode>) -> ContentNode {
        ContentNode::Section {
            title: String::new(),
            contents,
        }
    }
}

/// Pointer to an adjacent chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPointer {
    pub book_osis_id: String,
    pub chapter_num: u32,
}

/// Context the engine attaches to a range answer. The next-chapter pointer
/// is absent past the last chapter of available content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_chapter: Option<ChapterPointer>,
}

/// Engine answer for a full-chapter range query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeData {
    pub contents: Vec<ContentNode>,
    #[serde(default)]
    pub context: RangeContext,
}

/// A book as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub osis_id: String,
    pub title: String,
    /// Per-chapter verse counts; the number of chapters is this list's length
    pub chapters_count: Vec<u32>,
}

/// Flattened book shape returned to the reading UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub osis_id: String,
    pub title: String,
    pub num_chapters: usize,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        BookSummary {
            num_chapters: book.chapters_count.len(),
            osis_id: book.osis_id,
            title: book.title,
        }
    }
}

/// An installed Bible version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub uid: String,
    pub title: String,
    pub language: String,
}

/// A verse-level reference range, as found in cross-references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub book_osis_id: String,
    pub version_chapter_num: u32,
    pub version_verse_num: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_chapter_end_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_verse_end_num: Option<u32>,
}

/// One lexicon definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub strong: String,
    pub dictionary: String,
    pub lemma: String,
    pub gloss: String,
    pub content: String,
}

/// The external content engine, local or remote.
///
/// Guarantees expected of implementations:
/// - Queries are read-only; `add_v11n_rules` is the only ingest operation.
/// - `full_data_for_reference_range` answers with the chapter's complete
///   content tree plus normalized-range context.
/// - `add_v11n_rules` applies the whole batch or nothing.
#[async_trait]
pub trait ContentEngine: Send + Sync {
    /// Fetch the full content and context for a chapter-sized range.
    async fn full_data_for_reference_range(&self, range: &RangeQuery) -> EngineResult<RangeData>;

    /// List the books carried by a version, by version index.
    async fn books_for_version(&self, version_index: u32) -> EngineResult<Vec<Book>>;

    /// List all installed versions.
    async fn versions(&self) -> EngineResult<Vec<VersionInfo>>;

    /// Fetch the phrases covered by a verse-level reference range.
    async fn phrases(&self, range: &ReferenceRange) -> EngineResult<Vec<Phrase>>;

    /// Look up lexicon definitions for a Strong's code in a named dictionary.
    async fn dictionary_entries(
        &self,
        strong: &str,
        dictionary: &str,
    ) -> EngineResult<Vec<DictionaryEntry>>;

    /// Submit a batch of versification rules in one call.
    async fn add_v11n_rules(&self, rules: Vec<V11nRule>) -> EngineResult<()>;
}

/// Builds a local engine handle over a synchronized database file.
///
/// The concrete local engine implementation is supplied by the embedding
/// application; connecting includes opening the underlying file handle, so
/// a connector error means the file is not usable.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    async fn connect_local(&self, db_path: &Path) -> EngineResult<Arc<dyn ContentEngine>>;
}
