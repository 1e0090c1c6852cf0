//! Artifact types and their retrieval tuning
//!
//! Each artifact type carries the constants the retrieval filter needs:
//! recall-boosting hint words appended to the topic when querying the
//! store, the fetch floor/multiplier that scale fetch volume with the
//! requested output count, and the context-window bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A kind of study artifact the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Mcq,
    FillBlank,
    ShortAnswer,
    LongAnswer,
    VeryShortAnswer,
    Flashcards,
    Notes,
}

impl ArtifactKind {
    /// Stable label used in logs, metrics, and output file names
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Mcq => "mcq",
            ArtifactKind::FillBlank => "fill_blanks",
            ArtifactKind::ShortAnswer => "short_answer",
            ArtifactKind::LongAnswer => "long_answer",
            ArtifactKind::VeryShortAnswer => "very_short_answer",
            ArtifactKind::Flashcards => "flashcards",
            ArtifactKind::Notes => "notes",
        }
    }

    /// Hint words appended to the topic when querying the store. A recall
    /// heuristic: widen the query toward the material this artifact draws
    /// from, not a semantic requirement.
    pub fn query_hints(&self) -> &'static str {
        match self {
            ArtifactKind::Mcq => "concepts definitions examples formulas",
            ArtifactKind::FillBlank => "definitions concepts key terms important facts",
            ArtifactKind::ShortAnswer => "concepts explanations applications why how",
            ArtifactKind::LongAnswer => "detailed explanations applications analysis evaluation",
            ArtifactKind::VeryShortAnswer => "terms definitions facts key points",
            ArtifactKind::Flashcards => "definitions key terms formulas rules theorems",
            ArtifactKind::Notes => "key concepts main points important topics",
        }
    }

    /// Minimum number of chunks to request from the store, independent of
    /// the requested output count
    pub fn fetch_floor(&self) -> usize {
        match self {
            ArtifactKind::Mcq => 50,
            ArtifactKind::FillBlank
            | ArtifactKind::ShortAnswer
            | ArtifactKind::LongAnswer
            | ArtifactKind::VeryShortAnswer => 40,
            ArtifactKind::Flashcards => 30,
            ArtifactKind::Notes => 50,
        }
    }

    /// Per-requested-item fetch multiplier; zero for artifacts whose fetch
    /// volume is fixed
    pub fn fetch_multiplier(&self) -> usize {
        match self {
            ArtifactKind::Mcq => 3,
            ArtifactKind::FillBlank
            | ArtifactKind::ShortAnswer
            | ArtifactKind::LongAnswer
            | ArtifactKind::VeryShortAnswer => 2,
            ArtifactKind::Flashcards | ArtifactKind::Notes => 0,
        }
    }

    /// Context-window clamp bounds `(min, max)`; `None` means the window
    /// is not truncated (notes embed every trusted chunk)
    pub fn context_bounds(&self) -> Option<(usize, usize)> {
        match self {
            ArtifactKind::Mcq => Some((15, 30)),
            ArtifactKind::FillBlank
            | ArtifactKind::ShortAnswer
            | ArtifactKind::VeryShortAnswer => Some((15, 25)),
            ArtifactKind::LongAnswer => Some((20, 30)),
            ArtifactKind::Flashcards => Some((20, 20)),
            ArtifactKind::Notes => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All artifact kinds, for exhaustive property tests
pub const ALL_KINDS: [ArtifactKind; 7] = [
    ArtifactKind::Mcq,
    ArtifactKind::FillBlank,
    ArtifactKind::ShortAnswer,
    ArtifactKind::LongAnswer,
    ArtifactKind::VeryShortAnswer,
    ArtifactKind::Flashcards,
    ArtifactKind::Notes,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<&str> = ALL_KINDS.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ALL_KINDS.len());
    }

    #[test]
    fn test_bounds_are_ordered() {
        for kind in ALL_KINDS {
            if let Some((min, max)) = kind.context_bounds() {
                assert!(min <= max, "{kind} bounds inverted");
            }
        }
    }

    #[test]
    fn test_fixed_volume_kinds_have_no_multiplier() {
        assert_eq!(ArtifactKind::Flashcards.fetch_multiplier(), 0);
        assert_eq!(ArtifactKind::Notes.fetch_multiplier(), 0);
        assert_eq!(ArtifactKind::Flashcards.fetch_floor(), 30);
        assert_eq!(ArtifactKind::Notes.fetch_floor(), 50);
    }
}
