//! Retrieval Filter: bounded, trusted context from a noisy store
//!
//! Turns a topic string and a requested output count into the context that
//! backs a generation prompt:
//!
//! 1. widen the query with artifact hint words
//! 2. fetch `max(floor, count * multiplier)` candidates under class/subject
//!    filters
//! 3. discard untrusted rows (missing provenance or test-subject seed data)
//! 4. fail with `NoContent` when nothing trustworthy remains
//! 5. truncate to the artifact's context-window clamp
//!
//! Fewer trusted chunks than the window allows is a graceful shortfall,
//! not an error.

use crate::artifact::ArtifactKind;
use studyforge_common::errors::{AppError, Result};
use studyforge_common::metrics;
use studyforge_common::models::ScoredChunk;
use studyforge_common::store::{ChunkSource, QueryFilters};
use tracing::{debug, warn};

/// Number of chunks to request from the store for a given artifact type
/// and requested output count. Never below the artifact's floor so retrieval
/// keeps enough diversity even for tiny requests.
pub fn fetch_volume(kind: ArtifactKind, requested_count: usize) -> usize {
    kind.fetch_floor()
        .max(requested_count * kind.fetch_multiplier())
}

/// Context-window size for a given artifact type and requested count.
/// `None` means no truncation. Bounded against model token limits while
/// still scaling with the requested output volume.
pub fn context_limit(kind: ArtifactKind, requested_count: usize) -> Option<usize> {
    kind.context_bounds()
        .map(|(min, max)| (requested_count / 2).clamp(min, max))
}

/// Keep only chunks usable as generation context: real provenance and a
/// non-test subject. This is the only defense against placeholder/seed
/// data contaminating generated output; it runs on every generation
/// retrieval path.
pub fn filter_trusted(results: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    results
        .into_iter()
        .filter(|chunk| chunk.metadata.is_trusted())
        .collect()
}

/// The bounded set of chunks embedded into a generation prompt
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub chunks: Vec<ScoredChunk>,
}

impl ContextWindow {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Render as the numbered block embedded into question prompts:
    /// `[Context N]: <chunk text>`, blank line between entries.
    pub fn numbered_block(&self) -> String {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("[Context {}]: {}", i + 1, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render as plain joined text (flashcards and notes prompts)
    pub fn joined_block(&self) -> String {
        self.chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Run the full retrieval pipeline for one generation call.
pub async fn retrieve_context(
    source: &dyn ChunkSource,
    kind: ArtifactKind,
    class_num: i32,
    subject: &str,
    topic: &str,
    requested_count: usize,
) -> Result<ContextWindow> {
    let query = format!("{} {}", topic, kind.query_hints());
    let volume = fetch_volume(kind, requested_count);

    let filters = QueryFilters {
        class_num: Some(class_num),
        subject: Some(subject.to_string()),
        ..Default::default()
    };

    let results = source.query(&query, &filters, volume).await?;
    let fetched = results.len();

    let mut trusted = filter_trusted(results);
    let trusted_count = trusted.len();

    if trusted.is_empty() {
        warn!(
            class_num,
            subject,
            topic,
            fetched,
            "No trusted content found for generation"
        );
        return Err(AppError::NoContent {
            class_num,
            subject: subject.to_string(),
        });
    }

    if let Some(limit) = context_limit(kind, requested_count) {
        trusted.truncate(limit);
    }

    debug!(
        artifact = %kind,
        class_num,
        subject,
        topic,
        fetched,
        trusted = trusted_count,
        context = trusted.len(),
        "Context retrieved"
    );

    metrics::record_retrieval(kind.label(), fetched, trusted_count, trusted.len());

    Ok(ContextWindow { chunks: trusted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ALL_KINDS;
    use studyforge_common::models::{ChunkMetadata, ContentType, Difficulty};

    fn chunk(content: &str, source_file: &str, subject: &str) -> ScoredChunk {
        ScoredChunk {
            id: format!("{}_20260806_120000_0_abcd1234", subject.to_lowercase()),
            content: content.to_string(),
            metadata: ChunkMetadata {
                class_num: 6,
                subject: subject.to_string(),
                chapter: "Chapter 3: Heat".to_string(),
                topic: "Temperature".to_string(),
                content_type: ContentType::Explanation,
                difficulty: Difficulty::Easy,
                source_file: source_file.to_string(),
                page: 1,
                paragraph_index: 0,
            },
            distance: 0.2,
        }
    }

    #[test]
    fn test_fetch_volume_mcq() {
        // 10 questions: 3x = 30, below the floor of 50
        assert_eq!(fetch_volume(ArtifactKind::Mcq, 10), 50);
        // 20 questions: 3x = 60, above the floor
        assert_eq!(fetch_volume(ArtifactKind::Mcq, 20), 60);
    }

    #[test]
    fn test_fetch_volume_question_sets() {
        assert_eq!(fetch_volume(ArtifactKind::FillBlank, 10), 40);
        assert_eq!(fetch_volume(ArtifactKind::ShortAnswer, 30), 60);
        assert_eq!(fetch_volume(ArtifactKind::Flashcards, 100), 30);
        assert_eq!(fetch_volume(ArtifactKind::Notes, 1), 50);
    }

    #[test]
    fn test_fetch_volume_never_below_floor_or_multiple() {
        for kind in ALL_KINDS {
            for count in [0, 1, 5, 10, 25, 50, 100] {
                let volume = fetch_volume(kind, count);
                assert!(volume >= kind.fetch_floor());
                assert!(volume >= count * kind.fetch_multiplier());
            }
        }
    }

    #[test]
    fn test_context_limit_clamped_for_any_count() {
        for kind in ALL_KINDS {
            let Some((min, max)) = kind.context_bounds() else {
                assert_eq!(context_limit(kind, 10_000), None);
                continue;
            };
            for count in [0, 1, 10, 50, 100, 100_000] {
                let limit = context_limit(kind, count).unwrap();
                assert!(limit >= min, "{kind} count={count} below min");
                assert!(limit <= max, "{kind} count={count} above max");
            }
        }
    }

    #[test]
    fn test_context_limit_scales_with_count() {
        // 10 questions: 10/2 = 5, clamped up to the minimum of 15
        assert_eq!(context_limit(ArtifactKind::Mcq, 10), Some(15));
        // 44 questions: 44/2 = 22, inside [15, 30]
        assert_eq!(context_limit(ArtifactKind::Mcq, 44), Some(22));
        // 100 questions: 100/2 = 50, clamped down to 30
        assert_eq!(context_limit(ArtifactKind::Mcq, 100), Some(30));
        // Long-answer floor is higher
        assert_eq!(context_limit(ArtifactKind::LongAnswer, 10), Some(20));
        // Flashcards always take a window of 20
        assert_eq!(context_limit(ArtifactKind::Flashcards, 4), Some(20));
    }

    #[test]
    fn test_filter_trusted_excludes_exactly_the_untrusted() {
        let input = vec![
            chunk("real one", "science6.pdf", "Science"),
            chunk("no provenance", "", "Science"),
            chunk("seed subject", "science6.pdf", "Test"),
            chunk("lowercase test", "science6.pdf", "unit testing"),
            chunk("real two", "science6.pdf", "Science"),
        ];

        let trusted = filter_trusted(input);

        let contents: Vec<&str> = trusted.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["real one", "real two"]);
    }

    #[test]
    fn test_numbered_block_format() {
        let window = ContextWindow {
            chunks: vec![
                chunk("Heat flows from hot to cold.", "science6.pdf", "Science"),
                chunk("A thermometer measures temperature.", "science6.pdf", "Science"),
            ],
        };

        let block = window.numbered_block();
        assert!(block.starts_with("[Context 1]: Heat flows from hot to cold."));
        assert!(block.contains("\n\n[Context 2]: A thermometer measures temperature."));
    }

    struct FixedSource {
        chunks: Vec<ScoredChunk>,
    }

    #[async_trait::async_trait]
    impl ChunkSource for FixedSource {
        async fn query(
            &self,
            _text: &str,
            _filters: &QueryFilters,
            limit: usize,
        ) -> Result<Vec<ScoredChunk>> {
            Ok(self.chunks.iter().take(limit).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_graceful_shortfall_below_window_minimum() {
        // Store holds 5 trusted chunks; the MCQ window minimum is 15.
        // All 5 are used, with no error.
        let source = FixedSource {
            chunks: (0..5)
                .map(|i| chunk(&format!("passage {}", i), "science6.pdf", "Science"))
                .collect(),
        };

        let window = retrieve_context(&source, ArtifactKind::Mcq, 6, "Science", "Temperature", 10)
            .await
            .unwrap();

        assert_eq!(window.len(), 5);
    }

    #[tokio::test]
    async fn test_all_untrusted_yields_no_content() {
        let source = FixedSource {
            chunks: vec![
                chunk("synthetic", "", "Science"),
                chunk("seed", "seed.pdf", "Test"),
            ],
        };

        let err = retrieve_context(&source, ArtifactKind::Mcq, 6, "Science", "Temperature", 10)
            .await
            .unwrap_err();

        match err {
            AppError::NoContent { class_num, subject } => {
                assert_eq!(class_num, 6);
                assert_eq!(subject, "Science");
            }
            other => panic!("expected NoContent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_window_truncated_to_limit() {
        let source = FixedSource {
            chunks: (0..60)
                .map(|i| chunk(&format!("passage {}", i), "science6.pdf", "Science"))
                .collect(),
        };

        // 40 questions: window = clamp(20, 15, 30) = 20
        let window = retrieve_context(&source, ArtifactKind::Mcq, 6, "Science", "Temperature", 40)
            .await
            .unwrap();

        assert_eq!(window.len(), 20);
    }
}
