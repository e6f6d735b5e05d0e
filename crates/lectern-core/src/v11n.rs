//! Versification (v11n) rule model and importer
//!
//! Parses the tab-separated rules file — 7 columns: SourceRef, StandardRef,
//! Action, NoteMarker, Note, SourceType, Tests — into immutable
//! [`V11nRule`] records and submits the whole batch to the engine in one
//! call. There is no partial-success mode: the first malformed line aborts
//! the import before anything is submitted.

use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::books::{osis_id_from_book_token, source_type_id};
use crate::engine::ContentEngine;
use crate::error::ImportError;

/// Marker for rows that describe a verse absent from the source tradition.
const ABSENT_MARKER: &str = "Absent";

/// What a rule does to the verse it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum V11nAction {
    #[serde(rename = "Keep verse")]
    KeepVerse,
    #[serde(rename = "Merged above")]
    MergedAbove,
    #[serde(rename = "Renumber verse")]
    RenumberVerse,
    #[serde(rename = "Empty verse")]
    EmptyVerse,
}

impl V11nAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            V11nAction::KeepVerse => "Keep verse",
            V11nAction::MergedAbove => "Merged above",
            V11nAction::RenumberVerse => "Renumber verse",
            V11nAction::EmptyVerse => "Empty verse",
        }
    }
}

impl FromStr for V11nAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Keep verse" => Ok(V11nAction::KeepVerse),
            "Merged above" => Ok(V11nAction::MergedAbove),
            "Renumber verse" => Ok(V11nAction::RenumberVerse),
            "Empty verse" => Ok(V11nAction::EmptyVerse),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for V11nAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verse position in the source tradition's own numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    pub book_osis_id: String,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subverse: Option<u32>,
}

/// The standard (normalized) verse position a source verse maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardReference {
    pub book_osis_id: String,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subverse: Option<u32>,
    /// Verse-part letter, e.g. the "a" in "5a"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_indicator: Option<char>,
}

/// One versification mapping rule. Constructed once per accepted input
/// line and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V11nRule {
    pub source_ref: SourceReference,
    pub standard_ref: StandardReference,
    pub action: V11nAction,
    pub note_marker: String,
    pub note: String,
    pub source_type_id: u8,
    pub tests: String,
}

/// Outcome of a parse pass over the rules input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRules {
    pub rules: Vec<V11nRule>,
    pub skipped: usize,
}

/// Outcome of a full import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub rules: usize,
    pub skipped: usize,
}

/// `Book.Chapter:Verse[.Subverse]`, split but not yet resolved.
#[derive(Debug)]
struct RefParts<'a> {
    book: &'a str,
    chapter: u32,
    verse: &'a str,
    subverse: Option<u32>,
}

fn split_reference<'a>(
    field: &'a str,
    name: &'static str,
    line: usize,
) -> std::result::Result<RefParts<'a>, ImportError> {
    let malformed = || ImportError::MalformedReference { line, field: name };

    let (book, rest) = field.split_once('.').ok_or_else(malformed)?;
    let (chapter, verse_part) = rest.split_once(':').ok_or_else(malformed)?;
    let chapter: u32 = chapter.parse().map_err(|_| malformed())?;

    let (verse, subverse) = match verse_part.split_once('.') {
        Some((verse, sub)) => {
            let sub: u32 = sub.parse().map_err(|_| malformed())?;
            (verse, Some(sub))
        }
        None => (verse_part, None),
    };

    Ok(RefParts {
        book,
        chapter,
        verse,
        subverse,
    })
}

/// Parse one data line. `Ok(None)` marks a skip row (single-field or
/// `Absent` source).
fn parse_rule_line(line_nr: usize, line: &str) -> std::result::Result<Option<V11nRule>, ImportError> {
    let row: Vec<&str> = line.split('\t').collect();
    if row.len() <= 1 || row[0] == ABSENT_MARKER {
        return Ok(None);
    }

    let field = |idx: usize| row.get(idx).copied().unwrap_or("");

    let source = split_reference(row[0], "source", line_nr)?;
    let source_book = osis_id_from_book_token(source.book).ok_or_else(|| {
        ImportError::UnknownBook {
            line: line_nr,
            book: source.book.to_string(),
        }
    })?;
    let source_verse: u32 = source.verse.parse().map_err(|_| {
        ImportError::MalformedReference {
            line: line_nr,
            field: "source",
        }
    })?;

    let standard = split_reference(field(1), "standard", line_nr)?;
    // Trailing lowercase letter on the verse token is a part indicator.
    let (standard_verse, part_indicator) = match standard.verse.chars().last() {
        Some(last) if last.is_ascii_lowercase() => {
            (&standard.verse[..standard.verse.len() - 1], Some(last))
        }
        _ => (standard.verse, None),
    };
    let standard_verse: u32 = standard_verse.parse().map_err(|_| {
        ImportError::MalformedReference {
            line: line_nr,
            field: "standard",
        }
    })?;

    let source_type = field(5);
    let source_type_id = source_type_id(source_type).ok_or_else(|| {
        ImportError::UnknownSourceType {
            line: line_nr,
            name: source_type.to_string(),
        }
    })?;

    let action = V11nAction::from_str(field(2)).map_err(|_| ImportError::InvalidAction {
        line: line_nr,
        action: field(2).to_string(),
    })?;

    Ok(Some(V11nRule {
        source_ref: SourceReference {
            book_osis_id: source_book.to_string(),
            chapter: source.chapter,
            verse: source_verse,
            subverse: source.subverse,
        },
        standard_ref: StandardReference {
            // The rules file keys standard refs by the source ref's book.
            book_osis_id: source_book.to_string(),
            chapter: standard.chapter,
            verse: standard_verse,
            subverse: standard.subverse,
            part_indicator,
        },
        action,
        note_marker: field(3).to_string(),
        note: field(4).to_string(),
        source_type_id,
        tests: field(6).to_string(),
    }))
}

/// Parse the whole rules input. Line 1 is a header; the first malformed
/// data line aborts with its line number.
pub fn parse_rules<R: BufRead>(reader: R) -> std::result::Result<ParsedRules, ImportError> {
    let mut rules = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_nr = idx + 1;
        if line_nr == 1 {
            continue;
        }
        match parse_rule_line(line_nr, &line)? {
            Some(rule) => rules.push(rule),
            None => skipped += 1,
        }
    }

    debug!(rules = rules.len(), skipped, "parsed v11n rules input");
    Ok(ParsedRules { rules, skipped })
}

/// Parse the input and submit the full batch to the engine in one call.
pub async fn run_import<R: BufRead>(
    reader: R,
    engine: &dyn ContentEngine,
) -> std::result::Result<ImportSummary, ImportError> {
    let parsed = parse_rules(reader)?;
    let count = parsed.rules.len();

    engine.add_v11n_rules(parsed.rules).await?;
    info!(rules = count, skipped = parsed.skipped, "v11n rules imported");

    Ok(ImportSummary {
        rules: count,
        skipped: parsed.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_splits_into_components() {
        let parts = split_reference("Gen.1:1.1", "source", 2).unwrap();
        assert_eq!(parts.book, "Gen");
        assert_eq!(parts.chapter, 1);
        assert_eq!(parts.verse, "1");
        assert_eq!(parts.subverse, Some(1));
    }

    #[test]
    fn reference_without_subverse_is_accepted() {
        let parts = split_reference("Ps.13:6", "standard", 4).unwrap();
        assert_eq!(parts.chapter, 13);
        assert_eq!(parts.verse, "6");
        assert_eq!(parts.subverse, None);
    }

    #[test]
    fn missing_separators_are_malformed() {
        let err = split_reference("Gen1:1", "source", 7).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MalformedReference { line: 7, field: "source" }
        ));
        assert!(split_reference("Gen.11", "source", 7).is_err());
    }

    #[test]
    fn action_spellings_are_exact() {
        assert_eq!(V11nAction::from_str("Keep verse"), Ok(V11nAction::KeepVerse));
        assert_eq!(
            V11nAction::from_str("Renumber verse"),
            Ok(V11nAction::RenumberVerse)
        );
        assert!(V11nAction::from_str("keep verse").is_err());
        assert!(V11nAction::from_str("Delete verse").is_err());
    }
}
