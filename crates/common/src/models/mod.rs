//! Shared domain types
//!
//! A `Chunk` is the immutable unit of retrievable content: a passage of
//! textbook text plus the classification metadata attached during ingestion.
//! Chunks are created once, never mutated, and removed only by explicit
//! administrative purges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject label reserved for seed/placeholder data
pub const TEST_SUBJECT: &str = "Test";

/// Difficulty level of a chunk or requested artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// Kind of content a chunk carries, tagged by the ingestion classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Definition,
    Formula,
    Example,
    Question,
    Theorem,
    #[default]
    Explanation,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Definition => "definition",
            ContentType::Formula => "formula",
            ContentType::Example => "example",
            ContentType::Question => "question",
            ContentType::Theorem => "theorem",
            ContentType::Explanation => "explanation",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "definition" => Ok(ContentType::Definition),
            "formula" => Ok(ContentType::Formula),
            "example" => Ok(ContentType::Example),
            "question" => Ok(ContentType::Question),
            "theorem" => Ok(ContentType::Theorem),
            "explanation" => Ok(ContentType::Explanation),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// Classification metadata attached to every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Class (grade) level, 5-10
    pub class_num: i32,

    /// Subject name, e.g. "Science"
    pub subject: String,

    /// Chapter label; "Unknown" when no heading was recognized
    pub chapter: String,

    /// Topic/section label; "General" when no heading was recognized
    pub topic: String,

    pub content_type: ContentType,

    pub difficulty: Difficulty,

    /// Name of the source document. Empty means synthetic or seed data;
    /// such chunks must never reach generation.
    pub source_file: String,

    /// 1-based page number in the source document
    pub page: i32,

    /// Paragraph position within the page
    pub paragraph_index: i32,
}

impl ChunkMetadata {
    /// Whether this chunk may be used as generation context.
    ///
    /// Trusted means: it came from a real source document (non-empty
    /// `source_file`) and its subject is not the seed-data sentinel nor
    /// anything containing "test" case-insensitively.
    pub fn is_trusted(&self) -> bool {
        !self.source_file.is_empty()
            && self.subject != TEST_SUBJECT
            && !self.subject.to_lowercase().contains("test")
    }
}

/// A chunk ready for insertion into the content store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A chunk returned from a similarity query, with its embedding-space
/// distance to the query text (ascending = more relevant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: f64,
}

/// A single study flashcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Question or term shown first
    pub front: String,

    /// Answer or definition
    pub back: String,

    /// Optional memory aid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
